use axum::{http::StatusCode, Json};

use crate::database::Database;
use crate::service_categories::ServiceCategory;

/// GET /api/service-categories
/// Categories carry the `curbside_pickup` capability flag the UI uses to
/// decide whether to show collection-calendar fields
pub async fn list_categories() -> Result<Json<Vec<ServiceCategory>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let categories = ServiceCategory::list(&conn).map_err(|e| {
        log::error!("Failed to list service categories: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(categories))
}
