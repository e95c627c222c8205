use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::FieldOpsError;

use super::routes;

pub struct WebServer {
    host: String,
    port: u16,
}

impl WebServer {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    pub async fn start(&self) -> Result<(), FieldOpsError> {
        let app = self.create_router();

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| FieldOpsError::Error(format!("Invalid address: {}", e)))?;

        log::info!("FieldOps API listening on http://{}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| FieldOpsError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| FieldOpsError::Error(format!("Server error: {}", e)))?;

        Ok(())
    }

    fn create_router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            // Pipeline
            .route(
                "/api/leads",
                get(routes::leads::list_leads).post(routes::leads::create_lead),
            )
            .route("/api/leads/{id}/convert", post(routes::leads::convert_lead))
            .route(
                "/api/proposals",
                get(routes::proposals::list_proposals).post(routes::proposals::create_proposal),
            )
            .route(
                "/api/proposals/{id}/accept",
                post(routes::proposals::accept_proposal),
            )
            // Entities
            .route(
                "/api/properties",
                get(routes::properties::list_properties)
                    .post(routes::properties::create_property),
            )
            .route(
                "/api/service-categories",
                get(routes::categories::list_categories),
            )
            // Contracts and scheduling
            .route(
                "/api/contracts",
                get(routes::contracts::list_contracts).post(routes::contracts::create_contract),
            )
            .route("/api/contracts/{id}", get(routes::contracts::get_contract))
            .route(
                "/api/contracts/{id}/preview",
                get(routes::contracts::preview_contract_schedule),
            )
            .route(
                "/api/contracts/{id}/schedule",
                post(routes::contracts::schedule_contract),
            )
            // Jobs
            .route(
                "/api/jobs",
                get(routes::jobs::list_jobs).post(routes::jobs::create_job),
            )
            .route(
                "/api/jobs/{id}/instances",
                get(routes::jobs::list_job_instances),
            )
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
