use axum::{http::StatusCode, Json};
use serde::Deserialize;

use crate::database::Database;
use crate::properties::Property;

/// Request body for creating a property
#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub address: String,
    pub borough: Option<String>,
    #[serde(default = "default_unit_count")]
    pub unit_count: i64,
}

fn default_unit_count() -> i64 {
    1
}

/// GET /api/properties
pub async fn list_properties() -> Result<Json<Vec<Property>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let properties = Property::list(&conn).map_err(|e| {
        log::error!("Failed to list properties: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(properties))
}

/// POST /api/properties
pub async fn create_property(
    Json(request): Json<CreatePropertyRequest>,
) -> Result<Json<Property>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let property = Property::create(
        &conn,
        &request.address,
        request.borough.as_deref(),
        request.unit_count,
    )
    .map_err(|e| {
        log::error!("Failed to create property: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(property))
}
