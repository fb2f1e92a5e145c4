use crate::{render::ClassificationView, server::SharedState};
use axum::{extract::State, response::Json};

pub async fn drag_enter(State(state): State<SharedState>) -> Json<ClassificationView> {
    state.metrics.record_request("/api/drag/enter");
    state.surface.drag_over();
    Json(state.view())
}

pub async fn drag_leave(State(state): State<SharedState>) -> Json<ClassificationView> {
    state.metrics.record_request("/api/drag/leave");
    state.surface.drag_leave();
    Json(state.view())
}
