use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::appointment::AppointmentType;

/// The ten conversation stages, in the only order they may be visited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    Welcome,
    IntakeQuestions,
    SummaryReview,
    SummaryConfirmation,
    DocumentChecklist,
    AvailabilityInquiry,
    TaxproRouting,
    AppointmentScheduling,
    RemindersSetup,
    Complete,
}

impl FlowStage {
    pub const ALL: [FlowStage; 10] = [
        FlowStage::Welcome,
        FlowStage::IntakeQuestions,
        FlowStage::SummaryReview,
        FlowStage::SummaryConfirmation,
        FlowStage::DocumentChecklist,
        FlowStage::AvailabilityInquiry,
        FlowStage::TaxproRouting,
        FlowStage::AppointmentScheduling,
        FlowStage::RemindersSetup,
        FlowStage::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStage::Welcome => "welcome",
            FlowStage::IntakeQuestions => "intake_questions",
            FlowStage::SummaryReview => "summary_review",
            FlowStage::SummaryConfirmation => "summary_confirmation",
            FlowStage::DocumentChecklist => "document_checklist",
            FlowStage::AvailabilityInquiry => "availability_inquiry",
            FlowStage::TaxproRouting => "taxpro_routing",
            FlowStage::AppointmentScheduling => "appointment_scheduling",
            FlowStage::RemindersSetup => "reminders_setup",
            FlowStage::Complete => "complete",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    /// The stage after this one; `Complete` is terminal.
    pub fn next(&self) -> Option<FlowStage> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulePreferences {
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub appointment_type: AppointmentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationFlowState {
    pub client_id: String,
    pub session_id: String,
    pub current_stage: FlowStage,
    pub completed_stages: Vec<FlowStage>,
    pub stage_data: HashMap<FlowStage, serde_json::Value>,
    pub summary_confirmed: bool,
    pub selected_tax_pro: Option<String>,
    pub preferred_schedule: Option<SchedulePreferences>,
    pub created_at: NaiveDateTime,
    pub last_activity: NaiveDateTime,
}

impl ConversationFlowState {
    pub fn new(client_id: String, session_id: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            client_id,
            session_id,
            current_stage: FlowStage::Welcome,
            completed_stages: vec![],
            stage_data: HashMap::new(),
            summary_confirmed: false,
            selected_tax_pro: None,
            preferred_schedule: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// True when the current stage's stored data has `key` set to a
    /// non-null, non-false value.
    pub fn stage_flag(&self, stage: FlowStage, key: &str) -> bool {
        self.stage_data
            .get(&stage)
            .and_then(|v| v.get(key))
            .map(|v| v != &serde_json::Value::Bool(false) && !v.is_null())
            .unwrap_or(false)
    }
}
