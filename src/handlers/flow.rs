use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{AppointmentType, SchedulePreferences};
use crate::services::flow::{self, FlowStatus};
use crate::services::sync;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

fn session_id(query: &SessionQuery) -> &str {
    query.session_id.as_deref().unwrap_or("api")
}

fn flow_or_not_found(status: Option<FlowStatus>, client_id: &str) -> Result<Json<FlowStatus>, AppError> {
    status
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no flow state for client {client_id}")))
}

// GET /api/flow/:client_id
pub async fn get_flow(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<FlowStatus>, AppError> {
    let status = sync::sync_flow_with_state(&state, &client_id, session_id(&query));
    flow_or_not_found(status, &client_id)
}

// POST /api/flow/:client_id/sync
pub async fn sync_flow(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<FlowStatus>, AppError> {
    let status = sync::sync_flow_with_state(&state, &client_id, session_id(&query));
    flow_or_not_found(status, &client_id)
}

// POST /api/flow/:client_id/advance
#[derive(Deserialize, Default)]
pub struct AdvanceRequest {
    pub stage_data: Option<serde_json::Value>,
}

pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    body: Option<Json<AdvanceRequest>>,
) -> Result<Json<FlowStatus>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let _ = sync::sync_flow_with_state(&state, &client_id, "api");
    let status = flow::advance_flow(&state, &client_id, body.stage_data);
    flow_or_not_found(status, &client_id)
}

// POST /api/flow/:client_id/confirm-summary
pub async fn confirm_summary(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<Json<FlowStatus>, AppError> {
    let _ = sync::sync_flow_with_state(&state, &client_id, "api");
    let status = flow::confirm_summary(&state, &client_id);
    flow_or_not_found(status, &client_id)
}

// POST /api/flow/:client_id/preferences
#[derive(Deserialize)]
pub struct PreferencesRequest {
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub appointment_type: Option<String>,
}

pub async fn set_preferences(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    Json(body): Json<PreferencesRequest>,
) -> Result<Json<FlowStatus>, AppError> {
    let _ = sync::sync_flow_with_state(&state, &client_id, "api");
    let status = flow::set_scheduling_preferences(
        &state,
        &client_id,
        SchedulePreferences {
            dates: body.dates,
            times: body.times,
            appointment_type: body
                .appointment_type
                .as_deref()
                .map(AppointmentType::parse)
                .unwrap_or(AppointmentType::Virtual),
        },
    );
    flow_or_not_found(status, &client_id)
}

// POST /api/flow/:client_id/select-taxpro
#[derive(Deserialize)]
pub struct SelectTaxProRequest {
    pub tax_pro_id: String,
}

pub async fn select_tax_pro(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    Json(body): Json<SelectTaxProRequest>,
) -> Result<Json<FlowStatus>, AppError> {
    if state.stores.tax_pros.get(&body.tax_pro_id).is_none() {
        return Err(AppError::NotFound(format!(
            "tax professional {}",
            body.tax_pro_id
        )));
    }
    let _ = sync::sync_flow_with_state(&state, &client_id, "api");
    let status = flow::set_selected_tax_pro(&state, &client_id, &body.tax_pro_id);
    flow_or_not_found(status, &client_id)
}

// GET /api/flow/:client_id/progress
#[derive(Serialize)]
pub struct ProgressResponse {
    pub client_id: String,
    pub display: String,
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<Json<ProgressResponse>, AppError> {
    let _ = sync::sync_flow_with_state(&state, &client_id, "api");
    let display = flow::flow_progress_display(&state, &client_id)
        .ok_or_else(|| AppError::NotFound(format!("no flow state for client {client_id}")))?;
    Ok(Json(ProgressResponse { client_id, display }))
}

// GET /api/flow/:client_id/next-action
pub async fn get_next_action(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<Json<FlowStatus>, AppError> {
    let _ = sync::sync_flow_with_state(&state, &client_id, "api");
    let status = flow::get_next_action(&state, &client_id);
    flow_or_not_found(status, &client_id)
}
