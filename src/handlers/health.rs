use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "clients": state.stores.clients.len(),
        "tax_pros": state.stores.tax_pros.len(),
        "appointments": state.stores.appointments.len(),
    }))
}
