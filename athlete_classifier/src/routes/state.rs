use crate::{render::ClassificationView, server::SharedState};
use axum::{extract::State, response::Json};

pub async fn classification_state(State(state): State<SharedState>) -> Json<ClassificationView> {
    state.metrics.record_request("/api/state");
    Json(state.view())
}
