//! HTTP request handlers for the status endpoints.
//!
//! Every endpoint that talks to the game server runs under the request
//! deadline. When it expires the in-flight work is dropped and the client
//! gets a 504.

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Run `work` under the request deadline.
async fn with_deadline<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let timeout = state.request_timeout();
    tokio::time::timeout(timeout, work)
        .await
        .map_err(|_| ApiError::request_timeout(state.server_name(), timeout.as_secs()))?
}

/// Handle GET / endpoint.
///
/// Describes the service: monitored server, endpoints, cache setup and
/// runtime statistics. Never contacts the game server.
pub async fn handle_home(State(state): State<Arc<AppState>>) -> Response {
    tracing::debug!("Handling home request");

    let stats = state.stats(Instant::now());
    Json(state.assembler().home(state.features().clone(), stats)).into_response()
}

/// Handle GET /server/info endpoint.
///
/// # Errors
///
/// Returns `ApiError` if the status query fails or the deadline expires.
pub async fn handle_info(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    tracing::debug!("Handling info request");
    let now = Instant::now();

    let body = with_deadline(&state, async {
        let status = state
            .current_status(now)
            .await
            .map_err(|e| state.query_error(&e))?;
        let essentials = state.enrich_players(&status, now).await;
        Ok::<_, ApiError>(state.assembler().info(&status, essentials))
    })
    .await?;

    Ok(Json(body).into_response())
}

/// Handle GET /server/status endpoint.
///
/// # Errors
///
/// Returns `ApiError` if the status query fails or the deadline expires.
pub async fn handle_status(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    tracing::debug!("Handling status request");
    let now = Instant::now();

    let body = with_deadline(&state, async {
        let status = state
            .current_status(now)
            .await
            .map_err(|e| state.query_error(&e))?;
        Ok::<_, ApiError>(state.assembler().status(&status))
    })
    .await?;

    Ok(Json(body).into_response())
}

/// Handle GET /server/players endpoint.
///
/// # Errors
///
/// Returns `ApiError` if the status query fails or the deadline expires.
/// Enrichment problems never fail the request.
pub async fn handle_players(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    tracing::debug!("Handling players request");
    let now = Instant::now();

    let body = with_deadline(&state, async {
        let status = state
            .current_status(now)
            .await
            .map_err(|e| state.query_error(&e))?;
        let essentials = state.enrich_players(&status, now).await;
        Ok::<_, ApiError>(state.assembler().players(&status, essentials))
    })
    .await?;

    Ok(Json(body).into_response())
}

/// Handle GET /server/ping endpoint. Not cached.
///
/// # Errors
///
/// Returns `ApiError` if the ping fails or the deadline expires.
pub async fn handle_ping(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    tracing::debug!("Handling ping request");

    let latency = with_deadline(&state, async {
        state.ping().await.map_err(|e| state.query_error(&e))
    })
    .await?;

    Ok(Json(state.assembler().ping(latency)).into_response())
}

/// Fallback for unknown paths.
pub async fn handle_not_found(State(state): State<Arc<AppState>>) -> ApiError {
    ApiError::not_found(state.server_name())
}
