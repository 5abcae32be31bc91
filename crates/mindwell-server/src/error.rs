//! Error taxonomy at the HTTP boundary.
//!
//! Every handler returns `Result<_, AppError>`; the conversion into a
//! response happens here so that no failure escapes a request.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use mindwell_auth::{AuthError, IdentityFailure};
use mindwell_core::error::MindwellError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;

pub const LOGIN_PATH: &str = "/login";

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum AppError {
    /// No valid session; the client is sent to the sign-in page.
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    /// Rejection from the identity service, passed through verbatim.
    #[error("{0}")]
    Identity(String),

    #[error("Store failure: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MindwellError> for AppError {
    fn from(err: MindwellError) -> Self {
        match err {
            MindwellError::Validation { message } => AppError::Validation(message),
            MindwellError::Database(msg) => AppError::Store(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<IdentityFailure> for AppError {
    fn from(err: IdentityFailure) -> Self {
        AppError::Identity(err.message)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) | AuthError::Config(msg) => AppError::Internal(msg),
            _ => AppError::Unauthenticated,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated => return Redirect::to(LOGIN_PATH).into_response(),
            AppError::Validation(message) | AppError::Identity(message) => {
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Store(detail) | AppError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Failures while bringing the server up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] mindwell_db::DbError),

    #[error("database connection error: {0}")]
    Connect(#[from] surrealdb::Error),

    #[error("auth setup error: {0}")]
    Auth(#[from] AuthError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
