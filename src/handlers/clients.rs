use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::complexity::{client_complexity, required_specializations};
use crate::services::{checklist, intake, sync};
use crate::state::AppState;

// GET /api/clients/:id/summary
#[derive(Serialize)]
pub struct SummaryResponse {
    pub client_id: String,
    pub summary: String,
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, AppError> {
    let _ = sync::sync_flow_with_state(&state, &id, "api");
    let summary = intake::get_client_summary(&state, &id)?;
    Ok(Json(SummaryResponse {
        client_id: id,
        summary,
    }))
}

// POST /api/clients/:id/checklist
pub async fn generate_checklist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<checklist::Checklist>, AppError> {
    let _ = sync::sync_flow_with_state(&state, &id, "api");
    let checklist = checklist::generate_checklist(&state, &id)?;
    Ok(Json(checklist))
}

// GET /api/clients/:id/documents
#[derive(Serialize)]
pub struct DocumentsResponse {
    pub client_id: String,
    pub pending: Vec<String>,
    pub collected: Vec<String>,
}

pub async fn get_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let client = state
        .stores
        .clients
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;
    Ok(Json(DocumentsResponse {
        client_id: id,
        pending: client.documents_pending,
        collected: client.documents_collected,
    }))
}

// POST /api/clients/:id/documents/collect
#[derive(Deserialize)]
pub struct CollectDocumentRequest {
    pub document: String,
}

pub async fn collect_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CollectDocumentRequest>,
) -> Result<Json<DocumentsResponse>, AppError> {
    checklist::mark_document_collected(&state, &id, &body.document)?;
    let client = state
        .stores
        .clients
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;
    Ok(Json(DocumentsResponse {
        client_id: id,
        pending: client.documents_pending,
        collected: client.documents_collected,
    }))
}

// GET /api/clients/:id/complexity
#[derive(Serialize)]
pub struct ComplexityResponse {
    pub client_id: String,
    pub score: u32,
    pub level: String,
    pub required_specializations: Vec<String>,
}

pub async fn get_complexity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ComplexityResponse>, AppError> {
    let client = state
        .stores
        .clients
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("client {id}")))?;

    let (score, level) = client_complexity(&client);
    Ok(Json(ComplexityResponse {
        client_id: id,
        score,
        level: level.as_str().to_string(),
        required_specializations: required_specializations(&client)
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
    }))
}
