use crate::{
    acquisition::{AcquisitionOutcome, DropEvent, DroppedItem, SelectedFile},
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::instrument;

fn declared_content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .filter(|value| !value.is_empty())
}

/// File dialog path: the body is the selected file.
#[instrument(skip(state, headers, body), fields(size = body.len()))]
pub async fn select_image(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.metrics.record_request("/api/select");

    let outcome = state
        .surface
        .select_from_file_dialog(SelectedFile::Bytes {
            bytes: body,
            content_type: declared_content_type(&headers),
        })
        .await;

    respond(state, outcome)
}

/// Drop path: only bodies declared as `image/*` are considered.
#[instrument(skip(state, headers, body), fields(size = body.len()))]
pub async fn drop_image(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.metrics.record_request("/api/drop");

    let items = match declared_content_type(&headers) {
        Some(content_type) => vec![DroppedItem {
            content_type,
            bytes: body,
        }],
        None => Vec::new(),
    };
    let outcome = state.surface.select_from_drop(DropEvent { items });

    respond(state, outcome)
}

fn respond(state: SharedState, outcome: AcquisitionOutcome) -> Response {
    let AcquisitionOutcome::Accepted(pending) = outcome else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let view = state.view();
    tokio::spawn(async move {
        let completion = state.surface.orchestrator().complete(pending).await;
        state
            .metrics
            .record_classification(completion.outcome(), completion.elapsed().as_millis() as u64);
    });

    (StatusCode::ACCEPTED, Json(view)).into_response()
}
