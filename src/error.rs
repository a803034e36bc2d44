use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::turnover::assignment::AssignmentError;
use crate::workflows::turnover::ingestion::SyncError;
use crate::workflows::turnover::{SettlementError, TurnoverError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Turnover(TurnoverError),
    Settlement(SettlementError),
    Sync(SyncError),
    Assignment(AssignmentError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Turnover(err) => write!(f, "turnover error: {}", err),
            AppError::Settlement(err) => write!(f, "settlement error: {}", err),
            AppError::Sync(err) => write!(f, "calendar sync error: {}", err),
            AppError::Assignment(err) => write!(f, "assignment error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Turnover(err) => Some(err),
            AppError::Settlement(err) => Some(err),
            AppError::Sync(err) => Some(err),
            AppError::Assignment(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Turnover(_)
            | AppError::Settlement(_)
            | AppError::Sync(_)
            | AppError::Assignment(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<TurnoverError> for AppError {
    fn from(value: TurnoverError) -> Self {
        Self::Turnover(value)
    }
}

impl From<SettlementError> for AppError {
    fn from(value: SettlementError) -> Self {
        Self::Settlement(value)
    }
}

impl From<SyncError> for AppError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<AssignmentError> for AppError {
    fn from(value: AssignmentError) -> Self {
        Self::Assignment(value)
    }
}
