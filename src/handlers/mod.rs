pub mod appointments;
pub mod clients;
pub mod flow;
pub mod health;
pub mod intake;
pub mod routing;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/intake/start", post(intake::start_intake))
        .route("/api/intake/respond", post(intake::process_response))
        .route("/api/clients/:id/summary", get(clients::get_summary))
        .route("/api/clients/:id/checklist", post(clients::generate_checklist))
        .route("/api/clients/:id/documents", get(clients::get_documents))
        .route(
            "/api/clients/:id/documents/collect",
            post(clients::collect_document),
        )
        .route("/api/clients/:id/complexity", get(clients::get_complexity))
        .route("/api/clients/:id/estimate", get(appointments::get_estimate))
        .route("/api/clients/:id/route", post(routing::route_client))
        .route(
            "/api/clients/:id/recommendations",
            get(routing::get_recommendations),
        )
        .route("/api/taxpros", get(routing::list_tax_pros))
        .route("/api/appointments", post(appointments::create_appointment))
        .route("/api/flow/:client_id", get(flow::get_flow))
        .route("/api/flow/:client_id/sync", post(flow::sync_flow))
        .route("/api/flow/:client_id/advance", post(flow::advance))
        .route("/api/flow/:client_id/confirm-summary", post(flow::confirm_summary))
        .route("/api/flow/:client_id/preferences", post(flow::set_preferences))
        .route("/api/flow/:client_id/select-taxpro", post(flow::select_tax_pro))
        .route("/api/flow/:client_id/progress", get(flow::get_progress))
        .route("/api/flow/:client_id/next-action", get(flow::get_next_action))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
