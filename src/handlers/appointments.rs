use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::AppointmentType;
use crate::services::appointments::{self, AppointmentRequest};
use crate::services::sync;
use crate::state::AppState;

// GET /api/clients/:id/estimate
pub async fn get_estimate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<appointments::AppointmentEstimate>, AppError> {
    let estimate = appointments::get_appointment_estimate(&state, &id)?;
    Ok(Json(estimate))
}

// POST /api/appointments
#[derive(Deserialize)]
pub struct CreateAppointmentRequest {
    pub client_id: String,
    pub tax_pro_id: Option<String>,
    pub scheduled_time: String,
    pub appointment_type: Option<String>,
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<Json<appointments::BookingOutcome>, AppError> {
    let scheduled_time = chrono::NaiveDateTime::parse_from_str(
        &body.scheduled_time,
        "%Y-%m-%d %H:%M",
    )
    .or_else(|_| {
        chrono::NaiveDateTime::parse_from_str(&body.scheduled_time, "%Y-%m-%d %H:%M:%S")
    })
    .map_err(|_| {
        AppError::InvalidInput(format!(
            "cannot parse scheduled_time {:?}, expected YYYY-MM-DD HH:MM",
            body.scheduled_time
        ))
    })?;

    let _ = sync::sync_flow_with_state(&state, &body.client_id, "api");
    let outcome = appointments::create_appointment(
        &state,
        AppointmentRequest {
            client_id: body.client_id,
            tax_pro_id: body.tax_pro_id,
            scheduled_time,
            appointment_type: body
                .appointment_type
                .as_deref()
                .map(AppointmentType::parse)
                .unwrap_or(AppointmentType::Virtual),
        },
    )
    .await?;
    Ok(Json(outcome))
}
