use crate::engine::LedgerError;
use crate::intake::IntakeError;
use crate::orchestration::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownSymbol(_) => AppError::NotFound(err.to_string()),
            SessionError::Intake(intake) => intake.into(),
            SessionError::Journal(_) | SessionError::Replay { .. } | SessionError::Export(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Ledger(LedgerError::Position { .. }) => AppError::Conflict(err.to_string()),
            IntakeError::Ledger(_)
            | IntakeError::MissingLimitPrice
            | IntakeError::SymbolMismatch { .. } => AppError::BadRequest(err.to_string()),
            IntakeError::NoMarkPrice(_) => AppError::Unavailable(err.to_string()),
            IntakeError::LiveTradingUnsupported => AppError::Forbidden(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
