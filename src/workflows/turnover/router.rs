use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use super::domain::{Job, JobId};
use super::gateways::PaymentGateway;
use super::repository::{RepositoryError, TurnoverStore};
use super::service::{EvidenceSubmission, TurnoverError, TurnoverService};
use super::settlement::{SettlementEngine, SettlementError, SettlementOutcome};

/// Shared handler state: the lifecycle service plus the settlement engine.
pub struct TurnoverApi<S, G> {
    pub service: Arc<TurnoverService<S>>,
    pub settlement: Arc<SettlementEngine<S, G>>,
}

impl<S, G> Clone for TurnoverApi<S, G> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            settlement: self.settlement.clone(),
        }
    }
}

/// Router exposing lifecycle triggers and settlement for one job.
pub fn turnover_router<S, G>(api: TurnoverApi<S, G>) -> Router
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    Router::new()
        .route("/api/v1/turnover/jobs/:job_id", get(job_handler::<S, G>))
        .route(
            "/api/v1/turnover/jobs/:job_id/check-in",
            post(check_in_handler::<S, G>),
        )
        .route(
            "/api/v1/turnover/jobs/:job_id/check-out",
            post(check_out_handler::<S, G>),
        )
        .route(
            "/api/v1/turnover/jobs/:job_id/cancel",
            post(cancel_handler::<S, G>),
        )
        .route(
            "/api/v1/turnover/jobs/:job_id/urgent-replacement",
            post(urgent_replacement_handler::<S, G>),
        )
        .route(
            "/api/v1/turnover/jobs/:job_id/evidence",
            post(evidence_handler::<S, G>),
        )
        .route(
            "/api/v1/turnover/jobs/:job_id/settle",
            post(settle_handler::<S, G>),
        )
        .with_state(api)
}

#[derive(Debug, Serialize)]
struct JobView {
    job_id: JobId,
    status: &'static str,
    payment_status: &'static str,
    is_urgent_bonus: bool,
    expected_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_in_time: Option<chrono::DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_out_time: Option<chrono::DateTime<Utc>>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status.label(),
            payment_status: job.payment_status.label(),
            is_urgent_bonus: job.is_urgent_bonus,
            expected_hours: job.expected_hours,
            check_in_time: job.check_in_time,
            check_out_time: job.check_out_time,
        }
    }
}

async fn job_handler<S, G>(
    State(api): State<TurnoverApi<S, G>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    match api.service.job(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(job))).into_response(),
        Err(error) => turnover_error_response(error),
    }
}

async fn check_in_handler<S, G>(
    State(api): State<TurnoverApi<S, G>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    respond(api.service.check_in(&JobId(job_id), Utc::now()))
}

async fn check_out_handler<S, G>(
    State(api): State<TurnoverApi<S, G>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    respond(api.service.check_out(&JobId(job_id), Utc::now()))
}

async fn cancel_handler<S, G>(
    State(api): State<TurnoverApi<S, G>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    respond(api.service.cancel(&JobId(job_id)))
}

async fn urgent_replacement_handler<S, G>(
    State(api): State<TurnoverApi<S, G>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    respond(api.service.urgent_replacement(&JobId(job_id)))
}

async fn evidence_handler<S, G>(
    State(api): State<TurnoverApi<S, G>>,
    Path(job_id): Path<String>,
    axum::Json(submission): axum::Json<EvidenceSubmission>,
) -> Response
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    match api.service.record_evidence(&JobId(job_id), submission) {
        Ok(packet) => (StatusCode::ACCEPTED, axum::Json(packet)).into_response(),
        Err(error) => turnover_error_response(error),
    }
}

async fn settle_handler<S, G>(
    State(api): State<TurnoverApi<S, G>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: TurnoverStore + 'static,
    G: PaymentGateway + 'static,
{
    match api.settlement.capture_and_settle(&JobId(job_id), Utc::now()) {
        Ok(outcome) => {
            let status = match outcome {
                SettlementOutcome::AlreadyCaptured { .. } => StatusCode::OK,
                SettlementOutcome::Settled(_) => StatusCode::CREATED,
            };
            (status, axum::Json(outcome)).into_response()
        }
        Err(SettlementError::JobNotFound(job_id)) => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": format!("job {} not found", job_id.0) })),
        )
            .into_response(),
        Err(SettlementError::EvidenceIncomplete(gaps)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "evidence incomplete",
                "gaps": gaps.0,
            })),
        )
            .into_response(),
        Err(error @ SettlementError::NoPaymentIntent(_))
        | Err(error @ SettlementError::NoEvidencePacket(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        Err(error @ SettlementError::CaptureFailed { .. }) => (
            StatusCode::BAD_GATEWAY,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        Err(other) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": other.to_string() })),
        )
            .into_response(),
    }
}

fn respond(result: Result<Job, TurnoverError>) -> Response {
    match result {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(job))).into_response(),
        Err(error) => turnover_error_response(error),
    }
}

fn turnover_error_response(error: TurnoverError) -> Response {
    let status = match &error {
        TurnoverError::JobNotFound(_) | TurnoverError::CleanerNotFound(_) => StatusCode::NOT_FOUND,
        TurnoverError::NoPrimaryCleaner(_) | TurnoverError::NoEvidencePacket(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TurnoverError::Transition(_) => StatusCode::CONFLICT,
        TurnoverError::Repository(RepositoryError::StaleStatus { .. }) => StatusCode::CONFLICT,
        TurnoverError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        axum::Json(json!({ "error": error.to_string() })),
    )
        .into_response()
}
