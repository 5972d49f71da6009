use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::suppliers::SupplierError;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by services and handlers outside the auth flow
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Supplier error: {0}")]
    Supplier(#[from] SupplierError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Auth(err) => err.status_code(),
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Supplier(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_label(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "Not found",
            AppError::Validation(_) => "Validation failed",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Auth(_) => "Authentication error",
            AppError::Database(_) => "Database error",
            AppError::Supplier(_) => "Upstream service error",
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let err = match self {
            AppError::Auth(err) => return err.into_response(),
            other => other,
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }

        let message = if status.is_server_error() {
            err.error_label().to_string()
        } else {
            err.to_string()
        };

        let body = Json(json!({
            "error": err.error_label(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
