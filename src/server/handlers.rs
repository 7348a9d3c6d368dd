use std::time::Instant;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use chrono::Utc;
use plancoach_llm::supported_providers;
use plancoach_utils::error::ProviderError;
use plancoach_utils::logging::{log_request_complete, log_request_error, request_span};
use plancoach_utils::types::{
    AdvisoryResult, DiagnosticReport, HealthStatus, ProviderInfo, QuickAdvice, QuickAdviceRequest,
    ServiceInfo,
};
use serde::Deserialize;
use tracing::Instrument;

use super::{API_KEY_HEADER, ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct KeyParams {
    api_key: Option<String>,
}

pub(crate) async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(state.info.as_ref().clone())
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        llm_configured: state.orchestrator.is_some(),
    })
}

pub(crate) async fn providers() -> Json<Vec<ProviderInfo>> {
    Json(supported_providers())
}

pub(crate) async fn analyze_planning(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<KeyParams>, QueryRejection>,
    body: Result<Json<DiagnosticReport>, JsonRejection>,
) -> Result<Json<AdvisoryResult>, ApiError> {
    const ENDPOINT: &str = "/analyze-planning";
    let started = Instant::now();
    let outcome = run_analysis(&state, &headers, &query, body).await;
    finish(&state, ENDPOINT, started, outcome)
}

async fn run_analysis(
    state: &AppState,
    headers: &HeaderMap,
    query: &Result<Query<KeyParams>, QueryRejection>,
    body: Result<Json<DiagnosticReport>, JsonRejection>,
) -> Result<AdvisoryResult, ApiError> {
    authorize(state, headers, query)?;
    let Json(report) = body.map_err(|rejection| ApiError::unprocessable(&rejection))?;
    let orchestrator = state.orchestrator.as_ref().ok_or_else(not_configured)?;

    orchestrator
        .analyze_planning(&report)
        .instrument(request_span("/analyze-planning", Some(report.planning_id)))
        .await
        .map_err(|err| ApiError::from(&err))
}

pub(crate) async fn quick_advice(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<KeyParams>, QueryRejection>,
    body: Result<Json<QuickAdviceRequest>, JsonRejection>,
) -> Result<Json<QuickAdvice>, ApiError> {
    const ENDPOINT: &str = "/quick-advice";
    let started = Instant::now();
    let outcome = run_quick_advice(&state, &headers, &query, body).await;
    finish(&state, ENDPOINT, started, outcome)
}

async fn run_quick_advice(
    state: &AppState,
    headers: &HeaderMap,
    query: &Result<Query<KeyParams>, QueryRejection>,
    body: Result<Json<QuickAdviceRequest>, JsonRejection>,
) -> Result<QuickAdvice, ApiError> {
    authorize(state, headers, query)?;
    let Json(request) = body.map_err(|rejection| ApiError::unprocessable(&rejection))?;
    let orchestrator = state.orchestrator.as_ref().ok_or_else(not_configured)?;

    orchestrator
        .quick_advice(&request)
        .instrument(request_span("/quick-advice", None))
        .await
        .map_err(|err| ApiError::from(&err))
}

/// Header key first, then the `api_key` query parameter.
fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    query: &Result<Query<KeyParams>, QueryRejection>,
) -> Result<(), ApiError> {
    let header_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let query_key = query
        .as_ref()
        .ok()
        .and_then(|Query(params)| params.api_key.as_deref());

    if state.gate.authorize(header_key, query_key).is_authorized() {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

fn not_configured() -> ApiError {
    ApiError::provider(&ProviderError::Misconfiguration(
        "no LLM provider is configured".to_string(),
    ))
}

fn finish<T>(
    state: &AppState,
    endpoint: &str,
    started: Instant,
    outcome: Result<T, ApiError>,
) -> Result<Json<T>, ApiError> {
    match outcome {
        Ok(value) => {
            log_request_complete(endpoint, started.elapsed());
            Ok(Json(value))
        }
        Err(err) => {
            let err = err.redacted(&state.secrets[..]);
            log_request_error(endpoint, err.status.as_u16(), &err.detail, started.elapsed());
            Err(err)
        }
    }
}
