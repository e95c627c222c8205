use axum::{extract::Path, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::database::Database;
use crate::jobs::Job;
use crate::materialize::JobInstance;

/// Request body for creating a one-shot job
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub contract_id: Option<i64>,
    pub property_id: i64,
    pub title: String,
    pub scheduled_date: NaiveDate,
    pub notes: Option<String>,
}

/// GET /api/jobs
pub async fn list_jobs() -> Result<Json<Vec<Job>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let jobs = Job::list(&conn).map_err(|e| {
        log::error!("Failed to list jobs: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(jobs))
}

/// POST /api/jobs
/// One-shot job creation; recurring visits go through contract scheduling
pub async fn create_job(Json(request): Json<CreateJobRequest>) -> Result<Json<Job>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let job = Job::create(
        &conn,
        request.contract_id,
        request.property_id,
        &request.title,
        request.scheduled_date,
        false,
        request.notes.as_deref(),
    )
    .map_err(|e| {
        log::error!("Failed to create job: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(job))
}

/// GET /api/jobs/:id/instances
pub async fn list_job_instances(
    Path(job_id): Path<i64>,
) -> Result<Json<Vec<JobInstance>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        log::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let instances = JobInstance::list_for_job(&conn, job_id).map_err(|e| {
        log::error!("Failed to list instances for job {}: {}", job_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(instances))
}
