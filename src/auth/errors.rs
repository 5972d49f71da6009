use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::password::PasswordError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username is already taken")]
    UsernameIsTaken,
    #[error("Not valid credentials")]
    NotValidCredentials,
    #[error("User does not exist")]
    UserDoesNotExist,
    #[error("Invite has not been accepted yet")]
    InviteNotAccepted,
    #[error("Invite token is invalid or expired")]
    InvalidInvite,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password processing error: {0}")]
    PasswordHashing(PasswordError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        if err.is_policy_violation() {
            AuthError::PasswordValidation(err.to_string())
        } else {
            AuthError::PasswordHashing(err)
        }
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UsernameIsTaken => StatusCode::BAD_REQUEST,
            AuthError::NotValidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserDoesNotExist => StatusCode::NOT_FOUND,
            AuthError::InviteNotAccepted => StatusCode::FORBIDDEN,
            AuthError::InvalidInvite => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::MissingAuthHeader => StatusCode::UNAUTHORIZED,
            AuthError::InvalidAuthHeaderFormat => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AuthError::PasswordValidation(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_label(&self) -> &'static str {
        match self {
            AuthError::UsernameIsTaken => "Username is taken",
            AuthError::NotValidCredentials => "Not valid credentials",
            AuthError::UserDoesNotExist => "User does not exist",
            AuthError::InviteNotAccepted => "Invite not accepted",
            AuthError::InvalidInvite => "Invalid invite",
            AuthError::InvalidToken => "Invalid token",
            AuthError::TokenExpired => "Token expired",
            AuthError::MissingAuthHeader => "Missing authorization header",
            AuthError::InvalidAuthHeaderFormat => "Invalid authorization header format",
            AuthError::InsufficientPermissions => "Insufficient permissions",
            AuthError::RateLimitExceeded => "Rate limit exceeded",
            AuthError::PasswordValidation(_) => "Password validation failed",
            AuthError::Database(_) => "Database error",
            AuthError::Jwt(_) => "Token error",
            AuthError::PasswordHashing(_) => "Password processing error",
            AuthError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
        }

        // Server-side details stay in the logs.
        let message = if status.is_server_error() {
            self.error_label().to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": self.error_label(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::UsernameIsTaken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::NotValidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UserDoesNotExist.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InsufficientPermissions.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_password_errors_split_by_cause() {
        assert!(matches!(
            AuthError::from(PasswordError::TooShort),
            AuthError::PasswordValidation(_)
        ));
        assert!(matches!(
            AuthError::from(PasswordError::HashingFailed),
            AuthError::PasswordHashing(_)
        ));
    }

    #[tokio::test]
    async fn test_database_errors_are_not_leaked() {
        let response = AuthError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Database error");
    }
}
