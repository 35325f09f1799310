use crate::models::{ConversationFlowState, FlowStage};
use crate::services::flow::{self, FlowStatus};
use crate::state::AppState;

/// Jump forward to `target`, rebuilding the completed list as the exact
/// prefix. Never moves backward.
fn fast_forward(flow: &mut ConversationFlowState, target: FlowStage) {
    if target.index() > flow.current_stage.index() {
        flow.completed_stages = FlowStage::ALL[..target.index()].to_vec();
        flow.current_stage = target;
    }
}

fn set_stage_flag(flow: &mut ConversationFlowState, stage: FlowStage, key: &str) {
    let entry = flow
        .stage_data
        .entry(stage)
        .or_insert_with(|| serde_json::json!({}));
    if let Some(obj) = entry.as_object_mut() {
        obj.insert(key.to_string(), serde_json::Value::Bool(true));
    }
}

/// Reconcile flow state with ground truth observed in the stores. The flow
/// can fall behind when the client is mutated through direct API calls
/// rather than conversational ones; this pass backfills it. Idempotent and
/// forward-only.
pub fn sync_flow_with_state(
    state: &AppState,
    client_id: &str,
    session_id: &str,
) -> Option<FlowStatus> {
    let client = state.stores.clients.get(client_id)?;
    flow::get_or_create_flow_state(state, client_id, session_id);

    state.stores.flows.update(client_id, |flow| {
        let before = flow.current_stage;

        if client.intake_completed {
            set_stage_flag(flow, FlowStage::Welcome, "started");
            fast_forward(flow, FlowStage::SummaryReview);
        }

        let has_checklist =
            !client.documents_pending.is_empty() || !client.documents_collected.is_empty();
        if has_checklist {
            // Record that generation already happened; only move the stage
            // when the stages before it are themselves accounted for. A
            // confirmed summary alone is not enough without a finished
            // intake backing it.
            set_stage_flag(flow, FlowStage::DocumentChecklist, "checklist_generated");
            if client.intake_completed && flow.summary_confirmed {
                set_stage_flag(flow, FlowStage::SummaryReview, "summary_shown");
                fast_forward(flow, FlowStage::AvailabilityInquiry);
            }
        }

        if let Some(pro_id) = &client.assigned_tax_pro {
            if flow.selected_tax_pro.is_none() {
                flow.selected_tax_pro = Some(pro_id.clone());
            }
        }

        if client.appointment_id.is_some() {
            fast_forward(flow, FlowStage::RemindersSetup);
        }

        if flow.current_stage != before {
            tracing::info!(
                client_id,
                from = before.as_str(),
                to = flow.current_stage.as_str(),
                "flow resynced from store ground truth"
            );
        }
    });

    flow::get_next_action(state, client_id)
}
