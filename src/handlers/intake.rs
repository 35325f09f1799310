use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::intake;
use crate::state::AppState;

// POST /api/intake/start
#[derive(Deserialize, Default)]
pub struct StartIntakeRequest {
    pub client_id: Option<String>,
}

pub async fn start_intake(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartIntakeRequest>>,
) -> Result<Json<intake::IntakeStart>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let started = intake::start_intake(&state, body.client_id)?;
    Ok(Json(started))
}

// POST /api/intake/respond
#[derive(Deserialize)]
pub struct IntakeResponseRequest {
    pub session_id: String,
    pub answer: String,
}

pub async fn process_response(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IntakeResponseRequest>,
) -> Result<Json<intake::IntakeProgress>, AppError> {
    let progress = intake::process_intake_response(&state, &body.session_id, &body.answer)?;
    Ok(Json(progress))
}
