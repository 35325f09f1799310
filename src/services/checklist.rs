use serde::Serialize;

use crate::errors::AppError;
use crate::models::{ClientProfile, DeductionKind, IncomeKind, SpecialSituation};
use crate::services::flow::{self, FlowStatus};
use crate::state::AppState;

/// Lookup from tax situations to the documents they require.
fn documents_for(client: &ClientProfile) -> Vec<String> {
    let mut docs = vec![
        "Photo ID".to_string(),
        "Prior year tax return".to_string(),
        "Social Security numbers for household members".to_string(),
    ];

    for kind in &client.income_kinds {
        let extra: &[&str] = match kind {
            IncomeKind::W2 => &["W-2 forms from all employers"],
            IncomeKind::SelfEmployment => &["1099-NEC forms", "Business expense records"],
            IncomeKind::Business => &["Profit and loss statement", "Business bank statements"],
            IncomeKind::Investments => &["1099-B brokerage statements", "1099-DIV forms"],
            IncomeKind::Rental => &["Rental income and expense records"],
            IncomeKind::Retirement => &["1099-R forms", "SSA-1099 if receiving Social Security"],
            IncomeKind::Other => &["Records of other income"],
        };
        docs.extend(extra.iter().map(|d| d.to_string()));
    }

    for deduction in &client.deductions {
        let extra: &[&str] = match deduction {
            DeductionKind::MortgageInterest => &["Form 1098 mortgage interest statement"],
            DeductionKind::CharitableDonations => &["Charitable donation receipts"],
            DeductionKind::MedicalExpenses => &["Medical expense receipts"],
            DeductionKind::Education => &["Form 1098-T tuition statement"],
            DeductionKind::RetirementContributions => &["IRA/401(k) contribution statements"],
            DeductionKind::HomeOffice => &["Home office measurements and utility bills"],
        };
        docs.extend(extra.iter().map(|d| d.to_string()));
    }

    for situation in &client.special_situations {
        let extra: &[&str] = match situation {
            SpecialSituation::Crypto => &["Complete crypto transaction history (all exchanges)"],
            SpecialSituation::ForeignAccounts => {
                &["Foreign account statements", "FBAR filing details"]
            }
            SpecialSituation::RentalProperty => &["Property tax and depreciation records"],
            SpecialSituation::SelfEmployment => &["Quarterly estimated tax payment records"],
            SpecialSituation::SmallBusiness => &["Entity formation documents", "Payroll records"],
            SpecialSituation::MajorInvestments => &["Stock option grant and exercise records"],
            SpecialSituation::EstatePlanning => &["Trust documents", "Estate valuation records"],
            SpecialSituation::AuditHistory => &["Prior audit correspondence"],
        };
        docs.extend(extra.iter().map(|d| d.to_string()));
    }

    docs.dedup();
    docs
}

#[derive(Debug, Serialize)]
pub struct Checklist {
    pub client_id: String,
    pub documents: Vec<String>,
    pub flow: Option<FlowStatus>,
}

/// Build the checklist from the profile, stamp it on the client, and
/// re-check the document_checklist stage.
pub fn generate_checklist(state: &AppState, client_id: &str) -> Result<Checklist, AppError> {
    let client = state
        .stores
        .clients
        .get(client_id)
        .ok_or_else(|| AppError::NotFound(format!("client {client_id}")))?;

    let documents = documents_for(&client);
    state.stores.clients.update(client_id, |c| {
        // Keep anything already collected off the pending list
        c.documents_pending = documents
            .iter()
            .filter(|d| !c.documents_collected.contains(d))
            .cloned()
            .collect();
        c.updated_at = chrono::Utc::now().naive_utc();
    });

    let flow = flow::advance_flow(
        state,
        client_id,
        Some(serde_json::json!({
            "checklist_generated": true,
            "document_count": documents.len(),
        })),
    );

    tracing::info!(client_id, count = documents.len(), "checklist generated");
    Ok(Checklist {
        client_id: client_id.to_string(),
        documents,
        flow,
    })
}

pub fn pending_documents(state: &AppState, client_id: &str) -> Result<Vec<String>, AppError> {
    state
        .stores
        .clients
        .get(client_id)
        .map(|c| c.documents_pending)
        .ok_or_else(|| AppError::NotFound(format!("client {client_id}")))
}

/// Move one document from pending to collected.
pub fn mark_document_collected(
    state: &AppState,
    client_id: &str,
    document: &str,
) -> Result<Vec<String>, AppError> {
    state
        .stores
        .clients
        .update(client_id, |c| {
            if let Some(pos) = c.documents_pending.iter().position(|d| d == document) {
                let doc = c.documents_pending.remove(pos);
                c.documents_collected.push(doc);
                c.updated_at = chrono::Utc::now().naive_utc();
            }
            c.documents_pending.clone()
        })
        .ok_or_else(|| AppError::NotFound(format!("client {client_id}")))
}
