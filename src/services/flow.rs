use chrono::Utc;
use serde::Serialize;

use crate::models::{ClientProfile, ConversationFlowState, FlowStage, SchedulePreferences};
use crate::state::AppState;

/// One row of the stage table: presentation metadata plus the completion
/// predicate, expressed as "what still blocks this stage"; an empty list
/// means the stage may be left.
pub struct StageSpec {
    pub stage: FlowStage,
    pub description: &'static str,
    pub next_action: &'static str,
    pub instructions: &'static str,
    pub suggested_operations: &'static [&'static str],
    blockers: fn(&ConversationFlowState, Option<&ClientProfile>) -> Vec<String>,
}

fn client_missing() -> Vec<String> {
    vec!["client profile not found".to_string()]
}

const STAGES: [StageSpec; 10] = [
    StageSpec {
        stage: FlowStage::Welcome,
        description: "Greet the client and open an intake session",
        next_action: "Start the intake interview",
        instructions: "Welcome the client, explain the process, and call start_intake to open a session.",
        suggested_operations: &["start_intake"],
        blockers: |flow, _| {
            if flow.stage_flag(FlowStage::Welcome, "started") {
                vec![]
            } else {
                vec!["intake has not been started".to_string()]
            }
        },
    },
    StageSpec {
        stage: FlowStage::IntakeQuestions,
        description: "Work through the intake question script",
        next_action: "Ask the next intake question",
        instructions: "Relay each intake prompt and record the answer with process_intake_response until the script reports completion.",
        suggested_operations: &["process_intake_response"],
        blockers: |_, client| match client {
            Some(c) if c.intake_completed => vec![],
            Some(_) => vec!["intake questions are not finished".to_string()],
            None => client_missing(),
        },
    },
    StageSpec {
        stage: FlowStage::SummaryReview,
        description: "Present the collected profile back to the client",
        next_action: "Show the client their summary",
        instructions: "Fetch get_client_summary and read it back so the client can spot mistakes.",
        suggested_operations: &["get_client_summary"],
        blockers: |flow, _| {
            if flow.stage_flag(FlowStage::SummaryReview, "summary_shown") {
                vec![]
            } else {
                vec!["client summary has not been shown".to_string()]
            }
        },
    },
    StageSpec {
        stage: FlowStage::SummaryConfirmation,
        description: "Get an explicit yes on the summary",
        next_action: "Ask the client to confirm their summary",
        instructions: "Once the client agrees the summary is accurate, call confirm_summary.",
        suggested_operations: &["confirm_summary"],
        blockers: |flow, _| {
            if flow.summary_confirmed {
                vec![]
            } else {
                vec!["summary has not been confirmed by the client".to_string()]
            }
        },
    },
    StageSpec {
        stage: FlowStage::DocumentChecklist,
        description: "Tell the client which documents to gather",
        next_action: "Generate the document checklist",
        instructions: "Call generate_document_checklist and walk the client through what to bring.",
        suggested_operations: &["generate_document_checklist", "get_pending_documents"],
        blockers: |flow, _| {
            if flow.stage_flag(FlowStage::DocumentChecklist, "checklist_generated") {
                vec![]
            } else {
                vec!["document checklist has not been generated".to_string()]
            }
        },
    },
    StageSpec {
        stage: FlowStage::AvailabilityInquiry,
        description: "Collect scheduling preferences",
        next_action: "Ask for preferred dates, times, and appointment type",
        instructions: "Record at least one preferred date and time plus virtual/in-person with set_scheduling_preferences.",
        suggested_operations: &["set_scheduling_preferences"],
        blockers: |flow, _| match &flow.preferred_schedule {
            Some(p) if !p.dates.is_empty() && !p.times.is_empty() => vec![],
            Some(_) => vec!["scheduling preferences need at least one date and one time".to_string()],
            None => vec!["scheduling preferences have not been collected".to_string()],
        },
    },
    StageSpec {
        stage: FlowStage::TaxproRouting,
        description: "Match the client with a tax professional",
        next_action: "Route the client to a qualified professional",
        instructions: "Call route_client_to_tax_pro; review get_tax_pro_recommendations first if the client wants options.",
        suggested_operations: &["route_client_to_tax_pro", "get_tax_pro_recommendations"],
        blockers: |flow, client| {
            let assigned = flow.selected_tax_pro.is_some()
                || client.map(|c| c.assigned_tax_pro.is_some()).unwrap_or(false);
            if assigned {
                vec![]
            } else {
                vec!["no tax professional has been selected".to_string()]
            }
        },
    },
    StageSpec {
        stage: FlowStage::AppointmentScheduling,
        description: "Book the appointment",
        next_action: "Create the appointment",
        instructions: "Pick a concrete time from the preferences and call create_appointment; get_appointment_estimate gives the expected duration.",
        suggested_operations: &["create_appointment", "get_appointment_estimate"],
        blockers: |_, client| match client {
            Some(c) if c.appointment_id.is_some() => vec![],
            Some(_) => vec!["no appointment has been created".to_string()],
            None => client_missing(),
        },
    },
    StageSpec {
        stage: FlowStage::RemindersSetup,
        description: "Set up appointment reminders",
        next_action: "Create the appointment reminders",
        instructions: "Reminders are created automatically when the appointment is booked; confirm they exist before closing.",
        suggested_operations: &["create_appointment_reminders"],
        blockers: |flow, _| {
            if flow.stage_flag(FlowStage::RemindersSetup, "reminders_created") {
                vec![]
            } else {
                vec!["reminders have not been created".to_string()]
            }
        },
    },
    StageSpec {
        stage: FlowStage::Complete,
        description: "Conversation finished",
        next_action: "Nothing left to do",
        instructions: "The client is fully booked; no further action is required.",
        suggested_operations: &[],
        blockers: |_, _| vec![],
    },
];

pub fn stage_spec(stage: FlowStage) -> &'static StageSpec {
    &STAGES[stage.index()]
}

/// Snapshot returned from every flow mutation.
#[derive(Debug, Clone, Serialize)]
pub struct FlowStatus {
    pub client_id: String,
    pub current_stage: FlowStage,
    pub completed_stages: Vec<FlowStage>,
    pub advanced: bool,
    pub can_proceed: bool,
    pub next_action: String,
    pub instructions: String,
    pub suggested_operations: Vec<String>,
    pub blockers: Vec<String>,
    pub progress: f64,
}

/// Fraction of the nine advanceable stages already behind us.
pub fn progress_fraction(flow: &ConversationFlowState) -> f64 {
    flow.completed_stages.len() as f64 / (FlowStage::ALL.len() - 1) as f64
}

fn build_status(
    flow: &ConversationFlowState,
    client: Option<&ClientProfile>,
    advanced: bool,
) -> FlowStatus {
    let spec = stage_spec(flow.current_stage);
    let blockers = (spec.blockers)(flow, client);
    FlowStatus {
        client_id: flow.client_id.clone(),
        current_stage: flow.current_stage,
        completed_stages: flow.completed_stages.clone(),
        advanced,
        can_proceed: blockers.is_empty() && flow.current_stage.next().is_some(),
        next_action: spec.next_action.to_string(),
        instructions: spec.instructions.to_string(),
        suggested_operations: spec
            .suggested_operations
            .iter()
            .map(|s| s.to_string())
            .collect(),
        blockers,
        progress: progress_fraction(flow),
    }
}

pub fn get_or_create_flow_state(
    state: &AppState,
    client_id: &str,
    session_id: &str,
) -> ConversationFlowState {
    if let Some(flow) = state.stores.flows.update(client_id, |flow| {
        flow.last_activity = Utc::now().naive_utc();
        flow.clone()
    }) {
        return flow;
    }

    let flow = ConversationFlowState::new(client_id.to_string(), session_id.to_string());
    state.stores.flows.put(client_id, flow.clone());
    tracing::info!(client_id, session_id, "created flow state");
    flow
}

pub fn get_flow_state(state: &AppState, client_id: &str) -> Option<ConversationFlowState> {
    state.stores.flows.get(client_id)
}

fn merge_stage_data(flow: &mut ConversationFlowState, data: serde_json::Value) {
    let entry = flow
        .stage_data
        .entry(flow.current_stage)
        .or_insert_with(|| serde_json::json!({}));
    match (entry.as_object_mut(), data) {
        (Some(existing), serde_json::Value::Object(incoming)) => {
            for (k, v) in incoming {
                existing.insert(k, v);
            }
        }
        (_, other) => *entry = other,
    }
}

/// Merge `stage_data` into the current stage, re-check that stage's
/// predicate, and advance one stage at most. Returns None when the client
/// has no flow yet.
pub fn advance_flow(
    state: &AppState,
    client_id: &str,
    stage_data: Option<serde_json::Value>,
) -> Option<FlowStatus> {
    let client = state.stores.clients.get(client_id);

    // The whole check-and-advance runs inside one update closure, so two
    // racing calls cannot both advance the same stage.
    let (flow, advanced) = state.stores.flows.update(client_id, |flow| {
        flow.last_activity = Utc::now().naive_utc();
        if let Some(data) = stage_data {
            merge_stage_data(flow, data);
        }

        let spec = stage_spec(flow.current_stage);
        let blockers = (spec.blockers)(flow, client.as_ref());
        let mut advanced = false;
        if blockers.is_empty() {
            if let Some(next) = flow.current_stage.next() {
                flow.completed_stages.push(flow.current_stage);
                flow.current_stage = next;
                advanced = true;
            }
        }
        (flow.clone(), advanced)
    })?;

    if advanced {
        tracing::info!(client_id, stage = flow.current_stage.as_str(), "flow advanced");
    }
    Some(build_status(&flow, client.as_ref(), advanced))
}

/// Record the client's sign-off on their summary, then re-check the stage.
pub fn confirm_summary(state: &AppState, client_id: &str) -> Option<FlowStatus> {
    state.stores.flows.update(client_id, |flow| {
        flow.summary_confirmed = true;
    })?;
    advance_flow(state, client_id, None)
}

pub fn set_scheduling_preferences(
    state: &AppState,
    client_id: &str,
    preferences: SchedulePreferences,
) -> Option<FlowStatus> {
    state.stores.flows.update(client_id, |flow| {
        flow.preferred_schedule = Some(preferences);
    })?;
    advance_flow(state, client_id, None)
}

pub fn set_selected_tax_pro(
    state: &AppState,
    client_id: &str,
    tax_pro_id: &str,
) -> Option<FlowStatus> {
    state.stores.flows.update(client_id, |flow| {
        flow.selected_tax_pro = Some(tax_pro_id.to_string());
    })?;
    advance_flow(state, client_id, None)
}

/// Progress report: one line per stage with completed/current/pending
/// markers plus a percentage.
pub fn flow_progress_display(state: &AppState, client_id: &str) -> Option<String> {
    let flow = state.stores.flows.get(client_id)?;

    let mut lines = Vec::with_capacity(FlowStage::ALL.len() + 1);
    for stage in FlowStage::ALL {
        let marker = if flow.completed_stages.contains(&stage) {
            "[x]"
        } else if stage == flow.current_stage {
            "[>]"
        } else {
            "[ ]"
        };
        lines.push(format!("{marker} {}", stage.as_str()));
    }
    lines.push(format!(
        "Progress: {:.0}%",
        progress_fraction(&flow) * 100.0
    ));
    Some(lines.join("\n"))
}

/// Guidance block for whoever is driving the conversation.
pub fn get_next_action(state: &AppState, client_id: &str) -> Option<FlowStatus> {
    let flow = state.stores.flows.get(client_id)?;
    let client = state.stores.clients.get(client_id);
    Some(build_status(&flow, client.as_ref(), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::notify::LogNotifier;
    use crate::store::Stores;

    fn test_state() -> AppState {
        AppState {
            stores: Stores::new(),
            config: AppConfig::default(),
            notifier: Box::new(LogNotifier),
        }
    }

    fn seed_client(state: &AppState, id: &str) {
        state
            .stores
            .clients
            .put(id, ClientProfile::new(id.to_string()));
    }

    #[test]
    fn test_get_or_create_starts_at_welcome() {
        let state = test_state();
        let flow = get_or_create_flow_state(&state, "c1", "s1");
        assert_eq!(flow.current_stage, FlowStage::Welcome);
        assert!(flow.completed_stages.is_empty());

        // Second call returns the existing state, not a fresh one
        state.stores.flows.update("c1", |f| f.summary_confirmed = true);
        let again = get_or_create_flow_state(&state, "c1", "s2");
        assert!(again.summary_confirmed);
        assert_eq!(again.session_id, "s1");
    }

    #[test]
    fn test_advance_requires_predicate() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");

        let status = advance_flow(&state, "c1", None).unwrap();
        assert!(!status.advanced);
        assert_eq!(status.current_stage, FlowStage::Welcome);
        assert_eq!(status.blockers, vec!["intake has not been started"]);

        let status =
            advance_flow(&state, "c1", Some(serde_json::json!({"started": true}))).unwrap();
        assert!(status.advanced);
        assert_eq!(status.current_stage, FlowStage::IntakeQuestions);
        assert_eq!(status.completed_stages, vec![FlowStage::Welcome]);
    }

    #[test]
    fn test_advance_at_most_one_stage_per_call() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");

        // Make both welcome and intake_questions satisfiable at once
        state.stores.clients.update("c1", |c| c.intake_completed = true);
        let status =
            advance_flow(&state, "c1", Some(serde_json::json!({"started": true}))).unwrap();
        assert_eq!(status.current_stage, FlowStage::IntakeQuestions);

        // The second stage only completes on the next call
        let status = advance_flow(&state, "c1", None).unwrap();
        assert_eq!(status.current_stage, FlowStage::SummaryReview);
    }

    #[test]
    fn test_stalled_advance_leaves_stage_unchanged() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");
        advance_flow(&state, "c1", Some(serde_json::json!({"started": true})));

        // Intake incomplete: repeated calls with no new data stay put
        for _ in 0..3 {
            let status = advance_flow(&state, "c1", None).unwrap();
            assert_eq!(status.current_stage, FlowStage::IntakeQuestions);
            assert!(!status.advanced);
        }
    }

    #[test]
    fn test_completed_is_exact_prefix_throughout() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");

        let mut checks = 0;
        loop {
            let flow = state.stores.flows.get("c1").unwrap();
            let prefix: Vec<FlowStage> = FlowStage::ALL
                .iter()
                .copied()
                .take_while(|s| *s != flow.current_stage)
                .collect();
            assert_eq!(flow.completed_stages, prefix);
            checks += 1;

            if flow.current_stage == FlowStage::Complete {
                break;
            }
            satisfy_current_stage(&state, "c1");
            advance_flow(&state, "c1", None).unwrap();
        }
        assert_eq!(checks, FlowStage::ALL.len());
    }

    #[test]
    fn test_complete_is_terminal() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");
        state.stores.flows.update("c1", |f| {
            f.completed_stages = FlowStage::ALL[..9].to_vec();
            f.current_stage = FlowStage::Complete;
        });

        let status = advance_flow(&state, "c1", None).unwrap();
        assert!(!status.advanced);
        assert!(!status.can_proceed);
        assert_eq!(status.current_stage, FlowStage::Complete);
        assert!((status.progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrappers_delegate_to_advance() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");
        state.stores.flows.update("c1", |f| {
            f.completed_stages = FlowStage::ALL[..3].to_vec();
            f.current_stage = FlowStage::SummaryConfirmation;
        });

        let status = confirm_summary(&state, "c1").unwrap();
        assert!(status.advanced);
        assert_eq!(status.current_stage, FlowStage::DocumentChecklist);
    }

    #[test]
    fn test_preferences_need_dates_and_times() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");
        state.stores.flows.update("c1", |f| {
            f.completed_stages = FlowStage::ALL[..5].to_vec();
            f.current_stage = FlowStage::AvailabilityInquiry;
        });

        let status = set_scheduling_preferences(
            &state,
            "c1",
            SchedulePreferences {
                dates: vec![],
                times: vec!["10:00".to_string()],
                appointment_type: crate::models::AppointmentType::Virtual,
            },
        )
        .unwrap();
        assert!(!status.advanced);
        assert!(!status.blockers.is_empty());

        let status = set_scheduling_preferences(
            &state,
            "c1",
            SchedulePreferences {
                dates: vec!["2026-03-02".to_string()],
                times: vec!["10:00".to_string()],
                appointment_type: crate::models::AppointmentType::Virtual,
            },
        )
        .unwrap();
        assert!(status.advanced);
        assert_eq!(status.current_stage, FlowStage::TaxproRouting);
    }

    #[test]
    fn test_missing_flow_returns_none() {
        let state = test_state();
        assert!(advance_flow(&state, "ghost", None).is_none());
        assert!(confirm_summary(&state, "ghost").is_none());
        assert!(flow_progress_display(&state, "ghost").is_none());
        assert!(get_next_action(&state, "ghost").is_none());
    }

    #[test]
    fn test_progress_display_markers() {
        let state = test_state();
        seed_client(&state, "c1");
        get_or_create_flow_state(&state, "c1", "s1");
        advance_flow(&state, "c1", Some(serde_json::json!({"started": true})));

        let display = flow_progress_display(&state, "c1").unwrap();
        assert!(display.contains("[x] welcome"));
        assert!(display.contains("[>] intake_questions"));
        assert!(display.contains("[ ] summary_review"));
        assert!(display.contains("Progress: 11%"));
    }

    /// Flip whatever the current stage is waiting on so the next advance
    /// call succeeds.
    pub(super) fn satisfy_current_stage(state: &AppState, client_id: &str) {
        let flow = state.stores.flows.get(client_id).unwrap();
        match flow.current_stage {
            FlowStage::Welcome => {
                state.stores.flows.update(client_id, |f| {
                    super::merge_stage_data(f, serde_json::json!({"started": true}));
                });
            }
            FlowStage::IntakeQuestions => {
                state.stores.clients.update(client_id, |c| c.intake_completed = true);
            }
            FlowStage::SummaryReview => {
                state.stores.flows.update(client_id, |f| {
                    super::merge_stage_data(f, serde_json::json!({"summary_shown": true}));
                });
            }
            FlowStage::SummaryConfirmation => {
                state.stores.flows.update(client_id, |f| f.summary_confirmed = true);
            }
            FlowStage::DocumentChecklist => {
                state.stores.flows.update(client_id, |f| {
                    super::merge_stage_data(
                        f,
                        serde_json::json!({"checklist_generated": true}),
                    );
                });
            }
            FlowStage::AvailabilityInquiry => {
                state.stores.flows.update(client_id, |f| {
                    f.preferred_schedule = Some(SchedulePreferences {
                        dates: vec!["2026-03-02".to_string()],
                        times: vec!["10:00".to_string()],
                        appointment_type: crate::models::AppointmentType::Virtual,
                    });
                });
            }
            FlowStage::TaxproRouting => {
                state
                    .stores
                    .flows
                    .update(client_id, |f| f.selected_tax_pro = Some("p1".to_string()));
            }
            FlowStage::AppointmentScheduling => {
                state
                    .stores
                    .clients
                    .update(client_id, |c| c.appointment_id = Some("a1".to_string()));
            }
            FlowStage::RemindersSetup => {
                state.stores.flows.update(client_id, |f| {
                    super::merge_stage_data(
                        f,
                        serde_json::json!({"reminders_created": true}),
                    );
                });
            }
            FlowStage::Complete => {}
        }
    }
}
