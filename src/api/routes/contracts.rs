use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::contracts::{Contract, CreateContractParams};
use crate::database::Database;
use crate::jobs::{Job, ScheduleOutcome};
use crate::pickup::DbPickupLookup;
use crate::preview::{self, PreviewHorizon, SchedulePreview};

/// Query parameters for schedule preview
#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub horizon: Option<u32>,
}

/// GET /api/contracts
pub async fn list_contracts() -> Result<Json<Vec<Contract>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let contracts = Contract::list(&conn).map_err(|e| {
        log::error!("Failed to list contracts: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(contracts))
}

/// POST /api/contracts
pub async fn create_contract(
    Json(params): Json<CreateContractParams>,
) -> Result<Json<Contract>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let contract = Contract::create(&conn, params).map_err(|e| {
        log::error!("Failed to create contract: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(contract))
}

/// GET /api/contracts/:id
pub async fn get_contract(Path(contract_id): Path<i64>) -> Result<Json<Contract>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let contract = Contract::get_by_id(&conn, contract_id)
        .map_err(|e| {
            log::error!("Failed to get contract: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(contract))
}

/// GET /api/contracts/:id/preview?horizon=N
/// Read-only projection of upcoming visits. An empty visit list is a valid
/// 200 response ("no scheduled visits"), never an error.
pub async fn preview_contract_schedule(
    Path(contract_id): Path<i64>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<SchedulePreview>, StatusCode> {
    let horizon = match params.horizon {
        Some(days) => PreviewHorizon::from_days(days).ok_or_else(|| {
            log::error!("Unsupported preview horizon: {} days", days);
            StatusCode::BAD_REQUEST
        })?,
        None => PreviewHorizon::from_days(crate::config::Config::get_preview_horizon_days())
            .unwrap_or_default(),
    };

    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let contract = Contract::get_by_id(&conn, contract_id)
        .map_err(|e| {
            log::error!("Failed to get contract: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let lookup = DbPickupLookup::new(&conn);
    let today = chrono::Local::now().date_naive();

    let preview = preview::preview_contract(&conn, &contract, &lookup, today, horizon)
        .map_err(|e| {
            log::error!("Failed to preview contract {}: {}", contract_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(preview))
}

/// POST /api/contracts/:id/schedule
/// Materialize the contract's visits as a parent job plus instances. The
/// response reports parent creation and the instance batch separately.
pub async fn schedule_contract(
    Path(contract_id): Path<i64>,
) -> Result<Json<ScheduleOutcome>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let contract = Contract::get_by_id(&conn, contract_id)
        .map_err(|e| {
            log::error!("Failed to get contract: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let lookup = DbPickupLookup::new(&conn);

    let outcome = Job::schedule_recurring(&conn, &contract, &lookup).map_err(|e| {
        log::error!("Failed to schedule contract {}: {}", contract_id, e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(outcome))
}
