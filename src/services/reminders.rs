use chrono::Duration;

use crate::errors::AppError;
use crate::models::{Appointment, Reminder};
use crate::services::flow;
use crate::state::AppState;

fn build_reminder(
    appointment: &Appointment,
    message: String,
    lead: Duration,
) -> Reminder {
    Reminder {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: appointment.client_id.clone(),
        appointment_id: Some(appointment.id.clone()),
        message,
        scheduled_time: appointment.scheduled_time - lead,
        sent: false,
        sent_at: None,
    }
}

/// Create the standard reminder set for a freshly booked appointment and
/// move the flow past reminders_setup. Delivery failures are logged, not
/// fatal; the reminder records still exist.
pub async fn create_appointment_reminders(
    state: &AppState,
    appointment: &Appointment,
) -> Result<Vec<Reminder>, AppError> {
    let pending = state
        .stores
        .clients
        .get(&appointment.client_id)
        .map(|c| c.documents_pending)
        .unwrap_or_default();

    let when = appointment.scheduled_time.format("%Y-%m-%d %H:%M");
    let mut reminders = vec![
        build_reminder(
            appointment,
            format!("Your tax appointment is tomorrow at {when}."),
            Duration::hours(24),
        ),
        build_reminder(
            appointment,
            format!("Your tax appointment starts in one hour ({when})."),
            Duration::hours(1),
        ),
    ];
    if !pending.is_empty() {
        reminders.push(build_reminder(
            appointment,
            format!(
                "Before your appointment, please gather: {}.",
                pending.join(", ")
            ),
            Duration::hours(48),
        ));
    }

    for reminder in &reminders {
        state.stores.reminders.put(&reminder.id, reminder.clone());
        if let Err(e) = state
            .notifier
            .send(&reminder.client_id, &reminder.message)
            .await
        {
            tracing::error!(error = %e, reminder_id = %reminder.id, "failed to deliver reminder");
        }
    }

    tracing::info!(
        client_id = %appointment.client_id,
        appointment_id = %appointment.id,
        count = reminders.len(),
        "reminders created"
    );

    flow::advance_flow(
        state,
        &appointment.client_id,
        Some(serde_json::json!({"reminders_created": true})),
    );

    Ok(reminders)
}

/// Reminders on file for one client, soonest first.
pub fn reminders_for_client(state: &AppState, client_id: &str) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = state
        .stores
        .reminders
        .all()
        .into_iter()
        .filter(|r| r.client_id == client_id)
        .collect();
    reminders.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));
    reminders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{
        Appointment, AppointmentStatus, AppointmentType, ClientProfile, ComplexityLevel,
        ConversationFlowState, FlowStage,
    };
    use crate::services::notify::LogNotifier;
    use crate::store::Stores;

    fn test_state() -> AppState {
        AppState {
            stores: Stores::new(),
            config: AppConfig::default(),
            notifier: Box::new(LogNotifier),
        }
    }

    fn appointment() -> Appointment {
        Appointment {
            id: "a1".to_string(),
            client_id: "c1".to_string(),
            tax_pro_id: "p1".to_string(),
            scheduled_time: chrono::NaiveDateTime::parse_from_str(
                "2026-03-02 10:00",
                "%Y-%m-%d %H:%M",
            )
            .unwrap(),
            duration_minutes: 60,
            appointment_type: AppointmentType::Virtual,
            estimated_complexity: ComplexityLevel::Moderate,
            status: AppointmentStatus::Scheduled,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_creates_day_and_hour_reminders() {
        let state = test_state();
        state
            .stores
            .clients
            .put("c1", ClientProfile::new("c1".to_string()));

        let reminders = create_appointment_reminders(&state, &appointment())
            .await
            .unwrap();
        assert_eq!(reminders.len(), 2);
        assert_eq!(state.stores.reminders.len(), 2);
        assert!(reminders[0].scheduled_time < appointment().scheduled_time);
    }

    #[tokio::test]
    async fn test_pending_documents_add_gather_reminder() {
        let state = test_state();
        let mut client = ClientProfile::new("c1".to_string());
        client.documents_pending = vec!["W-2 forms".to_string()];
        state.stores.clients.put("c1", client);

        let reminders = create_appointment_reminders(&state, &appointment())
            .await
            .unwrap();
        assert_eq!(reminders.len(), 3);
        assert!(reminders.iter().any(|r| r.message.contains("W-2 forms")));
    }

    #[tokio::test]
    async fn test_advances_reminders_stage() {
        let state = test_state();
        state
            .stores
            .clients
            .put("c1", ClientProfile::new("c1".to_string()));
        state.stores.flows.put("c1", {
            let mut f = ConversationFlowState::new("c1".to_string(), "s1".to_string());
            f.completed_stages = FlowStage::ALL[..8].to_vec();
            f.current_stage = FlowStage::RemindersSetup;
            f
        });

        create_appointment_reminders(&state, &appointment())
            .await
            .unwrap();
        let flow = state.stores.flows.get("c1").unwrap();
        assert_eq!(flow.current_stage, FlowStage::Complete);
    }

    #[tokio::test]
    async fn test_reminders_for_client_sorted() {
        let state = test_state();
        state
            .stores
            .clients
            .put("c1", ClientProfile::new("c1".to_string()));
        create_appointment_reminders(&state, &appointment())
            .await
            .unwrap();

        let reminders = reminders_for_client(&state, "c1");
        for pair in reminders.windows(2) {
            assert!(pair[0].scheduled_time <= pair[1].scheduled_time);
        }
        assert!(reminders_for_client(&state, "nobody").is_empty());
    }
}
