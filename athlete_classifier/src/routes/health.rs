use crate::server::SharedState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub classification_service: String,
    pub supported_athletes: usize,
}

pub async fn healthcheck(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "Available".into(),
        classification_service: state.classification_endpoint.to_string(),
        supported_athletes: state.roster.len(),
    })
}
