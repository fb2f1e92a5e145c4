use crate::{roster::RosterEntry, server::SharedState};
use axum::{extract::State, response::Json};

pub async fn roster(State(state): State<SharedState>) -> Json<Vec<RosterEntry>> {
    state.metrics.record_request("/api/roster");
    Json(state.roster.entries().to_vec())
}
