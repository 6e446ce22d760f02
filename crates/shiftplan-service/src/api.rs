//! Router and request handlers.

use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use shiftplan_core::{SolveRequest, SolveResponse};

/// Name reported by the health probe.
pub const SERVICE_NAME: &str = "shiftplan-solver";

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    service: &'static str,
}

/// Builds the service router.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/solve", post(solve))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: SERVICE_NAME,
    })
}

/// Solves one scheduling model. Each request compiles and solves
/// independently; the blocking search runs off the async runtime.
async fn solve(Json(request): Json<SolveRequest>) -> Json<SolveResponse> {
    info!(
        variables = request.variables.len(),
        constraints = request.constraints.len(),
        "solve request received"
    );
    let response = tokio::task::spawn_blocking(move || shiftplan::solve_request(&request))
        .await
        .unwrap_or_else(|err| SolveResponse::error(format!("solver task failed: {err}")));
    info!(status = ?response.status, "solve request finished");
    Json(response)
}
