use chrono::NaiveDateTime;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentType, ComplexityLevel,
};
use crate::services::complexity::{client_complexity, estimated_duration_minutes};
use crate::services::flow::{self, FlowStatus};
use crate::services::reminders;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AppointmentRequest {
    pub client_id: String,
    pub tax_pro_id: Option<String>,
    pub scheduled_time: NaiveDateTime,
    pub appointment_type: AppointmentType,
}

#[derive(Debug, Serialize)]
pub struct AppointmentEstimate {
    pub client_id: String,
    pub complexity_score: u32,
    pub complexity_level: ComplexityLevel,
    pub intake_completed: bool,
    pub duration_minutes: u32,
}

#[derive(Debug, Serialize)]
pub struct BookingOutcome {
    pub booked: bool,
    pub appointment: Option<Appointment>,
    pub message: String,
    pub flow: Option<FlowStatus>,
}

/// Expected duration for the client as they stand right now. A completed
/// intake saves the time otherwise spent collecting basics in the room.
pub fn get_appointment_estimate(
    state: &AppState,
    client_id: &str,
) -> Result<AppointmentEstimate, AppError> {
    let client = state
        .stores
        .clients
        .get(client_id)
        .ok_or_else(|| AppError::NotFound(format!("client {client_id}")))?;

    let (score, level) = client_complexity(&client);
    Ok(AppointmentEstimate {
        client_id: client_id.to_string(),
        complexity_score: score,
        complexity_level: level,
        intake_completed: client.intake_completed,
        duration_minutes: estimated_duration_minutes(level, client.intake_completed),
    })
}

/// Book the appointment: reserve the professional if not already reserved
/// by routing, store the record, stamp the client, then set up reminders.
pub async fn create_appointment(
    state: &AppState,
    req: AppointmentRequest,
) -> Result<BookingOutcome, AppError> {
    let client = state
        .stores
        .clients
        .get(&req.client_id)
        .ok_or_else(|| AppError::NotFound(format!("client {}", req.client_id)))?;

    let tax_pro_id = req
        .tax_pro_id
        .or_else(|| client.assigned_tax_pro.clone())
        .or_else(|| {
            flow::get_flow_state(state, &req.client_id).and_then(|f| f.selected_tax_pro)
        })
        .ok_or_else(|| {
            AppError::InvalidInput(
                "no tax professional selected; route the client first".to_string(),
            )
        })?;

    let tax_pro = state
        .stores
        .tax_pros
        .get(&tax_pro_id)
        .ok_or_else(|| AppError::NotFound(format!("tax professional {tax_pro_id}")))?;

    // Routing already holds a slot when this professional is the assigned
    // one; a direct booking has to take its own.
    let already_reserved = client.assigned_tax_pro.as_deref() == Some(tax_pro_id.as_str());
    if !already_reserved && !state.stores.try_reserve_tax_pro(&tax_pro_id) {
        return Ok(BookingOutcome {
            booked: false,
            appointment: None,
            message: format!("{} has no remaining appointment slots today", tax_pro.name),
            flow: flow::get_next_action(state, &req.client_id),
        });
    }

    // Booking with someone other than the routed professional hands the
    // routed slot back; the assignment follows the appointment.
    if let Some(previous) = client.assigned_tax_pro.as_deref() {
        if previous != tax_pro_id {
            state.stores.release_tax_pro(previous);
        }
    }

    let (score, level) = client_complexity(&client);
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: req.client_id.clone(),
        tax_pro_id: tax_pro_id.clone(),
        scheduled_time: req.scheduled_time,
        duration_minutes: estimated_duration_minutes(level, client.intake_completed),
        appointment_type: req.appointment_type,
        estimated_complexity: level,
        status: AppointmentStatus::Scheduled,
        created_at: chrono::Utc::now().naive_utc(),
    };
    state.stores.appointments.put(&appointment.id, appointment.clone());

    state.stores.clients.update(&req.client_id, |c| {
        c.appointment_id = Some(appointment.id.clone());
        c.assigned_tax_pro = Some(tax_pro_id.clone());
        c.updated_at = chrono::Utc::now().naive_utc();
    });

    tracing::info!(
        client_id = %req.client_id,
        appointment_id = %appointment.id,
        tax_pro = %tax_pro_id,
        level = level.as_str(),
        score,
        minutes = appointment.duration_minutes,
        "appointment created"
    );

    // The booking satisfies appointment_scheduling; reminder creation then
    // satisfies reminders_setup on its own advance call.
    flow::advance_flow(state, &req.client_id, None);
    reminders::create_appointment_reminders(state, &appointment).await?;

    Ok(BookingOutcome {
        booked: true,
        appointment: Some(appointment),
        message: format!("Appointment booked with {}", tax_pro.name),
        flow: flow::get_next_action(state, &req.client_id),
    })
}
