use axum::{extract::Path, http::StatusCode, Json};
use serde::Deserialize;

use crate::contracts::{Contract, CreateContractParams};
use crate::database::Database;
use crate::proposals::Proposal;

/// Request body for creating a proposal directly (without a lead)
#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    pub lead_id: Option<i64>,
    pub property_id: i64,
    pub service_category_id: i64,
    pub title: String,
}

/// GET /api/proposals
pub async fn list_proposals() -> Result<Json<Vec<Proposal>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let proposals = Proposal::list(&conn).map_err(|e| {
        log::error!("Failed to list proposals: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(proposals))
}

/// POST /api/proposals
pub async fn create_proposal(
    Json(request): Json<CreateProposalRequest>,
) -> Result<Json<Proposal>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let proposal = Proposal::create(
        &conn,
        request.lead_id,
        request.property_id,
        request.service_category_id,
        &request.title,
    )
    .map_err(|e| {
        log::error!("Failed to create proposal: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(proposal))
}

/// POST /api/proposals/:id/accept
/// Accept a proposal, creating the contract it described (no scheduling)
pub async fn accept_proposal(
    Path(proposal_id): Path<i64>,
    Json(terms): Json<CreateContractParams>,
) -> Result<Json<Contract>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let contract = Proposal::accept(&conn, proposal_id, terms).map_err(|e| {
        log::error!("Failed to accept proposal {}: {}", proposal_id, e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(contract))
}
