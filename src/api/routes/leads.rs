use axum::{extract::Path, http::StatusCode, Json};
use serde::Deserialize;

use crate::database::Database;
use crate::leads::Lead;
use crate::proposals::Proposal;

/// Request body for creating a lead
#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub contact_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub property_id: Option<i64>,
}

/// Request body for converting a lead into a proposal
#[derive(Debug, Deserialize)]
pub struct ConvertLeadRequest {
    pub service_category_id: i64,
    pub title: String,
}

/// GET /api/leads
pub async fn list_leads() -> Result<Json<Vec<Lead>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let leads = Lead::list(&conn).map_err(|e| {
        log::error!("Failed to list leads: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(leads))
}

/// POST /api/leads
pub async fn create_lead(
    Json(request): Json<CreateLeadRequest>,
) -> Result<Json<Lead>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let lead = Lead::create(
        &conn,
        &request.contact_name,
        request.phone.as_deref(),
        request.email.as_deref(),
        request.property_id,
    )
    .map_err(|e| {
        log::error!("Failed to create lead: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(lead))
}

/// POST /api/leads/:id/convert
pub async fn convert_lead(
    Path(lead_id): Path<i64>,
    Json(request): Json<ConvertLeadRequest>,
) -> Result<Json<Proposal>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let proposal = Proposal::create_from_lead(
        &conn,
        lead_id,
        request.service_category_id,
        &request.title,
    )
    .map_err(|e| {
        log::error!("Failed to convert lead {}: {}", lead_id, e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(proposal))
}
