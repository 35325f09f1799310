use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::TaxProfessional;
use crate::services::{routing, sync};
use crate::state::AppState;

// POST /api/clients/:id/route
pub async fn route_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<routing::RoutingOutcome>, AppError> {
    let _ = sync::sync_flow_with_state(&state, &id, "api");
    let outcome = routing::route_client_to_tax_pro(&state, &id)?;
    Ok(Json(outcome))
}

// GET /api/clients/:id/recommendations
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<routing::MatchOutcome>, AppError> {
    let outcome = routing::tax_pro_recommendations(&state, &id)?;
    Ok(Json(outcome))
}

// GET /api/taxpros
#[derive(Serialize)]
pub struct TaxProsResponse {
    pub tax_pros: Vec<TaxProfessional>,
}

pub async fn list_tax_pros(
    State(state): State<Arc<AppState>>,
) -> Json<TaxProsResponse> {
    let mut tax_pros = state.stores.tax_pros.all();
    tax_pros.sort_by(|a, b| a.id.cmp(&b.id));
    Json(TaxProsResponse { tax_pros })
}
