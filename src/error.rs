//! Error taxonomy for the service and its translation into HTTP responses.
//!
//! Every operation returns `Result<_, AppError>`; the `IntoResponse` impl below
//! is the only place where an error kind becomes a status code and a
//! `{name, message}` body.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::password::CredentialError;
use crate::users::repo::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("username `{0}` is already taken")]
    DuplicateKey(String),

    #[error("No token provided")]
    NoTokenProvided,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("`{0}` is not a valid user id")]
    InvalidIdentifier(String),

    #[error("stored credential is corrupt")]
    CorruptCredential,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub name: &'static str,
    pub message: String,
}

impl AppError {
    pub fn name(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::DuplicateKey(_) => "DuplicateKey",
            AppError::NoTokenProvided => "NoTokenProvided",
            AppError::InvalidToken => "InvalidToken",
            AppError::IncorrectPassword => "IncorrectPassword",
            AppError::UserNotFound => "UserNotFound",
            AppError::InvalidIdentifier(_) => "InvalidIdentifier",
            AppError::CorruptCredential => "CorruptCredential",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoTokenProvided
            | AppError::InvalidToken
            | AppError::IncorrectPassword
            | AppError::UserNotFound => StatusCode::UNAUTHORIZED,
            AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::CorruptCredential | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::CorruptCredential | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = ?self, kind = self.name(), "request failed");
        }
        let body = ErrorBody {
            name: self.name(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey(username) => AppError::DuplicateKey(username),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e).context("user store")),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Corrupt(_) => AppError::CorruptCredential,
            CredentialError::Hash(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(AppError::NoTokenProvided.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::IncorrectPassword.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::DuplicateKey("alice".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidIdentifier("42".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::CorruptCredential.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_body_has_name_and_message() {
        let resp = AppError::IncorrectPassword.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(resp).await;
        assert_eq!(body["name"], "IncorrectPassword");
        assert_eq!(body["message"], "Incorrect password");
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let resp = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3")).into_response();
        let body = body_json(resp).await;
        assert_eq!(body["name"], "InternalError");
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn store_duplicate_becomes_duplicate_key() {
        let err: AppError = StoreError::DuplicateKey("bob".into()).into();
        assert!(matches!(err, AppError::DuplicateKey(ref u) if u == "bob"));
    }
}
