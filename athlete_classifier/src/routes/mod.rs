mod classify;
mod drag;
mod health;
mod index;
mod metrics;
mod roster;
mod state;

use crate::server::SharedState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to encode metrics: {0}")]
    MetricsEncoding(#[from] prometheus::Error),
    #[error("Metrics output is not valid UTF-8: {0}")]
    MetricsUtf8(#[from] std::string::FromUtf8Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self),
        )
            .into_response()
    }
}

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/roster", get(roster::roster))
        .route("/api/state", get(state::classification_state))
        .route("/api/select", post(classify::select_image))
        .route("/api/drop", post(classify::drop_image))
        .route("/api/drag/enter", post(drag::drag_enter))
        .route("/api/drag/leave", post(drag::drag_leave))
}
