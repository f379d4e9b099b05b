//! The one `AppError` the control plane maps every propagated error through.
//! A single enum rather than per-handler ad-hoc `(StatusCode, Json(...))`
//! tuples, since every handler here funnels through the same small set of
//! Store/Scheduler/Delivery/Vault error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mailagg_common::ErrorKind;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] mailagg_store::StoreError),

    #[error(transparent)]
    Scheduler(#[from] mailagg_scheduler::SchedulerError),

    #[error(transparent)]
    Vault(#[from] mailagg_vault::VaultError),

    #[error("{0}")]
    Invalid(String),

    #[error("authentication required")]
    Unauthorized,
}

impl AppError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Scheduler(e) => e.kind(),
            Self::Vault(e) => e.kind(),
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::Unauthorized => ErrorKind::AuthFailure,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::AuthFailure => StatusCode::UNAUTHORIZED,
            ErrorKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
