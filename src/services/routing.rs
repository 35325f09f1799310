use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::errors::AppError;
use crate::models::{ClientProfile, ComplexityLevel, Specialization, TaxProfessional};
use crate::services::complexity::{client_complexity, required_specializations};
use crate::services::flow;
use crate::state::AppState;

const MAX_ALTERNATES: usize = 2;

/// Result of the pure matching pass. `tax_pro` is None when nobody in the
/// pool qualifies; `reason` is always human-readable.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub tax_pro: Option<TaxProfessional>,
    pub reason: String,
    pub alternates: Vec<TaxProfessional>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutingOutcome {
    pub matched: bool,
    pub tax_pro: Option<TaxProfessional>,
    pub message: String,
    pub alternates: Vec<TaxProfessional>,
    pub complexity_score: u32,
    pub complexity_level: ComplexityLevel,
}

fn qualifies(
    pro: &TaxProfessional,
    level: ComplexityLevel,
    required: &BTreeSet<Specialization>,
) -> bool {
    pro.available
        && pro.has_capacity()
        && pro.max_complexity >= level
        && required.iter().all(|s| pro.specializations.contains(s))
}

/// Rating first, then least-loaded, then id so equal candidates always come
/// back in the same order.
fn rank(a: &TaxProfessional, b: &TaxProfessional) -> Ordering {
    b.rating
        .partial_cmp(&a.rating)
        .unwrap_or(Ordering::Equal)
        .then(a.current_load.cmp(&b.current_load))
        .then(a.id.cmp(&b.id))
}

fn specialization_list(required: &BTreeSet<Specialization>) -> String {
    required
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn match_reason(
    pro: &TaxProfessional,
    required: &BTreeSet<Specialization>,
    level: ComplexityLevel,
    score: u32,
) -> String {
    format!(
        "{} covers {} at {} complexity (score {score}, rating {:.1}, {} of {} slots used)",
        pro.name,
        specialization_list(required),
        level.as_str(),
        pro.rating,
        pro.current_load,
        pro.max_daily_appointments,
    )
}

/// Pure candidate selection over a pool snapshot. No side effects; the
/// caller decides whether to reserve capacity on the result.
pub fn find_best_tax_pro(client: &ClientProfile, pool: &[TaxProfessional]) -> MatchOutcome {
    let (score, level) = client_complexity(client);
    let required = required_specializations(client);

    let mut candidates: Vec<&TaxProfessional> = pool
        .iter()
        .filter(|p| qualifies(p, level, &required))
        .collect();
    candidates.sort_by(|a, b| rank(a, b));

    match candidates.first() {
        Some(best) => {
            MatchOutcome {
                tax_pro: Some((*best).clone()),
                reason: match_reason(best, &required, level, score),
                alternates: candidates
                    .iter()
                    .skip(1)
                    .take(MAX_ALTERNATES)
                    .map(|p| (*p).clone())
                    .collect(),
            }
        }
        None => MatchOutcome {
            tax_pro: None,
            reason: format!(
                "no available professional handles {}-level {} cases",
                level.as_str(),
                specialization_list(&required),
            ),
            alternates: vec![],
        },
    }
}

/// The one routing entry point with side effects: reserves a slot on the
/// chosen professional, stamps the assignment on the client, records the
/// selection in the flow and re-checks it. Falls back through the ranked
/// alternates when a concurrent booking takes the last slot first.
pub fn route_client_to_tax_pro(
    state: &AppState,
    client_id: &str,
) -> Result<RoutingOutcome, AppError> {
    let client = state
        .stores
        .clients
        .get(client_id)
        .ok_or_else(|| AppError::NotFound(format!("client {client_id}")))?;

    let pool = state.stores.tax_pros.all();
    let outcome = find_best_tax_pro(&client, &pool);
    let (score, level) = client_complexity(&client);
    let required = required_specializations(&client);

    let mut ranked = vec![];
    if let Some(best) = &outcome.tax_pro {
        ranked.push(best.clone());
        ranked.extend(outcome.alternates.iter().cloned());
    }

    for candidate in &ranked {
        if !state.stores.try_reserve_tax_pro(&candidate.id) {
            tracing::debug!(
                client_id,
                tax_pro = %candidate.id,
                "candidate filled up before reservation, trying next"
            );
            continue;
        }

        state.stores.clients.update(client_id, |c| {
            c.assigned_tax_pro = Some(candidate.id.clone());
            c.updated_at = chrono::Utc::now().naive_utc();
        });
        flow::set_selected_tax_pro(state, client_id, &candidate.id);

        tracing::info!(
            client_id,
            tax_pro = %candidate.id,
            level = level.as_str(),
            score,
            "routed client"
        );

        let assigned = state
            .stores
            .tax_pros
            .get(&candidate.id)
            .unwrap_or_else(|| candidate.clone());
        // Re-read the alternates so one that filled up in the meantime
        // (the outranked original included) is not offered.
        let alternates: Vec<TaxProfessional> = ranked
            .iter()
            .filter(|p| p.id != candidate.id)
            .filter_map(|p| state.stores.tax_pros.get(&p.id))
            .filter(|p| p.available && p.has_capacity())
            .take(MAX_ALTERNATES)
            .collect();
        // The ranked snapshot's reason may describe a candidate that lost
        // the race; describe the one actually reserved.
        let message = match_reason(&assigned, &required, level, score);
        return Ok(RoutingOutcome {
            matched: true,
            tax_pro: Some(assigned),
            message,
            alternates,
            complexity_score: score,
            complexity_level: level,
        });
    }

    tracing::info!(client_id, reason = %outcome.reason, "no eligible tax professional");
    Ok(RoutingOutcome {
        matched: false,
        tax_pro: None,
        message: outcome.reason,
        alternates: vec![],
        complexity_score: score,
        complexity_level: level,
    })
}

/// Read-only ranked view of who would match right now.
pub fn tax_pro_recommendations(
    state: &AppState,
    client_id: &str,
) -> Result<MatchOutcome, AppError> {
    let client = state
        .stores
        .clients
        .get(client_id)
        .ok_or_else(|| AppError::NotFound(format!("client {client_id}")))?;
    Ok(find_best_tax_pro(&client, &state.stores.tax_pros.all()))
}
