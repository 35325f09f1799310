use serde::Serialize;

use crate::errors::AppError;
use crate::models::{
    ClientProfile, DeductionKind, FilingStatus, FlowStage, IncomeKind, IntakeSession,
    SpecialSituation,
};
use crate::services::complexity::client_complexity;
use crate::services::flow::{self, FlowStatus};
use crate::state::AppState;

/// One prompt of the fixed intake script plus how its answer lands on the
/// profile. The script order is the conversation order.
struct IntakeStep {
    id: &'static str,
    prompt: &'static str,
    apply: fn(&mut ClientProfile, &str),
}

const SCRIPT: [IntakeStep; 7] = [
    IntakeStep {
        id: "name",
        prompt: "What is your full name?",
        apply: |client, answer| {
            let answer = answer.trim();
            if !answer.is_empty() {
                client.name = Some(answer.to_string());
            }
        },
    },
    IntakeStep {
        id: "filing_status",
        prompt: "What is your filing status? (single, married filing jointly, married filing separately, head of household, qualifying widow(er))",
        apply: |client, answer| client.filing_status = FilingStatus::parse(answer),
    },
    IntakeStep {
        id: "dependents",
        prompt: "How many dependents will you claim this year?",
        apply: |client, answer| {
            client.dependents = answer
                .split_whitespace()
                .find_map(|w| w.parse::<u32>().ok())
                .unwrap_or(0);
        },
    },
    IntakeStep {
        id: "income",
        prompt: "What kinds of income did you have? (wages/W-2, self-employment, business, investments, rental, retirement)",
        apply: apply_income,
    },
    IntakeStep {
        id: "deductions",
        prompt: "Which deductions do you expect to claim? (mortgage interest, charitable donations, medical, education, retirement contributions, home office)",
        apply: apply_deductions,
    },
    IntakeStep {
        id: "special_situations",
        prompt: "Do any of these apply to you? Crypto trading, foreign accounts, rental property, a small business, stock options, an estate or trust, or a prior audit.",
        apply: apply_special_situations,
    },
    IntakeStep {
        id: "notes",
        prompt: "Anything else we should know before your appointment?",
        apply: |_, _| {},
    },
];

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

fn apply_income(client: &mut ClientProfile, answer: &str) {
    let a = answer.to_lowercase();
    if a.contains("w2") || a.contains("w-2") || a.contains("wage") || a.contains("salary") {
        push_unique(&mut client.income_kinds, IncomeKind::W2);
    }
    if a.contains("self") || a.contains("freelance") || a.contains("1099") {
        push_unique(&mut client.income_kinds, IncomeKind::SelfEmployment);
    }
    if a.contains("business") {
        push_unique(&mut client.income_kinds, IncomeKind::Business);
    }
    if a.contains("invest") || a.contains("stock") || a.contains("dividend") {
        push_unique(&mut client.income_kinds, IncomeKind::Investments);
    }
    if a.contains("rent") {
        push_unique(&mut client.income_kinds, IncomeKind::Rental);
    }
    if a.contains("retire") || a.contains("pension") || a.contains("social security") {
        push_unique(&mut client.income_kinds, IncomeKind::Retirement);
    }
}

fn apply_deductions(client: &mut ClientProfile, answer: &str) {
    let a = answer.to_lowercase();
    if a.contains("mortgage") {
        push_unique(&mut client.deductions, DeductionKind::MortgageInterest);
    }
    if a.contains("charit") || a.contains("donat") {
        push_unique(&mut client.deductions, DeductionKind::CharitableDonations);
    }
    if a.contains("medical") {
        push_unique(&mut client.deductions, DeductionKind::MedicalExpenses);
    }
    if a.contains("educat") || a.contains("tuition") || a.contains("student") {
        push_unique(&mut client.deductions, DeductionKind::Education);
    }
    if a.contains("ira") || a.contains("401") || a.contains("retirement") {
        push_unique(&mut client.deductions, DeductionKind::RetirementContributions);
    }
    if a.contains("home office") {
        push_unique(&mut client.deductions, DeductionKind::HomeOffice);
    }
}

fn apply_special_situations(client: &mut ClientProfile, answer: &str) {
    let a = answer.to_lowercase();
    if a.contains("crypto") || a.contains("bitcoin") || a.contains("nft") {
        push_unique(&mut client.special_situations, SpecialSituation::Crypto);
    }
    if a.contains("foreign") || a.contains("overseas") || a.contains("fbar") {
        push_unique(
            &mut client.special_situations,
            SpecialSituation::ForeignAccounts,
        );
    }
    if a.contains("rental") || a.contains("landlord") {
        push_unique(
            &mut client.special_situations,
            SpecialSituation::RentalProperty,
        );
    }
    if a.contains("self-employ") || a.contains("self employ") || a.contains("freelance") {
        push_unique(
            &mut client.special_situations,
            SpecialSituation::SelfEmployment,
        );
    }
    if a.contains("small business") || a.contains("llc") || a.contains("s-corp") {
        push_unique(
            &mut client.special_situations,
            SpecialSituation::SmallBusiness,
        );
    }
    if a.contains("stock option") || a.contains("brokerage") {
        push_unique(
            &mut client.special_situations,
            SpecialSituation::MajorInvestments,
        );
    }
    if a.contains("estate") || a.contains("trust") || a.contains("inherit") {
        push_unique(
            &mut client.special_situations,
            SpecialSituation::EstatePlanning,
        );
    }
    if a.contains("audit") {
        push_unique(
            &mut client.special_situations,
            SpecialSituation::AuditHistory,
        );
    }
}

#[derive(Debug, Serialize)]
pub struct IntakeStart {
    pub client_id: String,
    pub session_id: String,
    pub prompt: String,
    pub flow: Option<FlowStatus>,
}

#[derive(Debug, Serialize)]
pub struct IntakeProgress {
    pub session_id: String,
    pub step: &'static str,
    pub completed: bool,
    pub next_prompt: Option<String>,
    pub flow: Option<FlowStatus>,
}

/// Open (or resume for an existing client) an intake session and move the
/// flow past welcome.
pub fn start_intake(
    state: &AppState,
    existing_client_id: Option<String>,
) -> Result<IntakeStart, AppError> {
    let client_id = match existing_client_id {
        Some(id) => {
            if state.stores.clients.get(&id).is_none() {
                return Err(AppError::NotFound(format!("client {id}")));
            }
            id
        }
        None => {
            let client = ClientProfile::new(uuid::Uuid::new_v4().to_string());
            let id = client.id.clone();
            state.stores.clients.put(&id, client);
            id
        }
    };

    let session = IntakeSession::new(client_id.clone());
    state.stores.sessions.put(&session.id, session.clone());

    flow::get_or_create_flow_state(state, &client_id, &session.id);
    let flow = flow::advance_flow(
        state,
        &client_id,
        Some(serde_json::json!({"started": true, "session_id": session.id})),
    );

    tracing::info!(%client_id, session_id = %session.id, "intake started");
    Ok(IntakeStart {
        client_id,
        session_id: session.id,
        prompt: SCRIPT[0].prompt.to_string(),
        flow,
    })
}

/// Record one answer, apply it to the profile, and hand back the next
/// prompt. The final answer flips `intake_completed` and re-checks the flow.
pub fn process_intake_response(
    state: &AppState,
    session_id: &str,
    answer: &str,
) -> Result<IntakeProgress, AppError> {
    let session = state
        .stores
        .sessions
        .get(session_id)
        .ok_or_else(|| AppError::NotFound(format!("intake session {session_id}")))?;

    if session.step_index >= SCRIPT.len() {
        return Ok(IntakeProgress {
            session_id: session_id.to_string(),
            step: "done",
            completed: true,
            next_prompt: None,
            flow: flow::get_next_action(state, &session.client_id),
        });
    }

    let step = &SCRIPT[session.step_index];
    state
        .stores
        .clients
        .update(&session.client_id, |client| {
            (step.apply)(client, answer);
            client.updated_at = chrono::Utc::now().naive_utc();
        })
        .ok_or_else(|| AppError::NotFound(format!("client {}", session.client_id)))?;

    let next_index = session.step_index + 1;
    state.stores.sessions.update(session_id, |s| {
        s.answers.push(answer.to_string());
        s.step_index = next_index;
        s.last_activity = chrono::Utc::now().naive_utc();
    });

    let completed = next_index >= SCRIPT.len();
    if completed {
        state
            .stores
            .clients
            .update(&session.client_id, |c| c.intake_completed = true);
        tracing::info!(client_id = %session.client_id, "intake completed");
    }

    let flow = flow::advance_flow(state, &session.client_id, None);
    Ok(IntakeProgress {
        session_id: session_id.to_string(),
        step: step.id,
        completed,
        next_prompt: SCRIPT.get(next_index).map(|s| s.prompt.to_string()),
        flow,
    })
}

/// Text projection of the profile used by the summary_review stage.
/// Viewing it records the summary as shown and re-checks the flow.
pub fn get_client_summary(state: &AppState, client_id: &str) -> Result<String, AppError> {
    let client = state
        .stores
        .clients
        .get(client_id)
        .ok_or_else(|| AppError::NotFound(format!("client {client_id}")))?;

    let (score, level) = client_complexity(&client);
    let income = client
        .income_kinds
        .iter()
        .map(|k| format!("{k:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    let situations = client
        .special_situations
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let summary = format!(
        "Client: {}\nFiling status: {}\nDependents: {}\nIncome: {}\nSpecial situations: {}\nDeductions claimed: {}\nEstimated complexity: {} (score {score})",
        client.name.as_deref().unwrap_or("(name not provided)"),
        client.filing_status.as_str(),
        client.dependents,
        if income.is_empty() { "none reported".to_string() } else { income },
        if situations.is_empty() { "none".to_string() } else { situations },
        client.deductions.len(),
        level.as_str(),
    );

    if let Some(flow_state) = flow::get_flow_state(state, client_id) {
        if flow_state.current_stage == FlowStage::SummaryReview {
            flow::advance_flow(
                state,
                client_id,
                Some(serde_json::json!({"summary_shown": true})),
            );
        }
    }

    Ok(summary)
}

/// Number of steps in the intake script; the transport layer reports this
/// alongside session progress.
pub fn script_len() -> usize {
    SCRIPT.len()
}
