use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::entities::registration::LoginError;
use crate::entities::ride::RideError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    /// Login required; `redirect` points at the login page for the caller
    #[error("{message}")]
    Unauthorized { message: String, redirect: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RideError> for AppError {
    fn from(err: RideError) -> Self {
        match err {
            RideError::Unauthenticated => AppError::Unauthorized {
                message: "Please login to request a ride".to_string(),
                redirect: crate::routes::pages::login_redirect("/search"),
            },
            RideError::IncorrectOtp => AppError::BadRequest(err.to_string()),
            RideError::NoActiveRide => AppError::NotFound(err.to_string()),
            RideError::AlreadyActive | RideError::InvalidTransition { .. } => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::IncorrectCode | LoginError::MissingDocuments => {
                AppError::BadRequest(err.to_string())
            }
            LoginError::ResendTooSoon { .. } => AppError::TooManyRequests(err.to_string()),
            LoginError::OutOfOrder { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization failed: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("Storage I/O failed: {}", err))
    }
}

fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string(), "fields": field_messages(errors) }),
            ),
            AppError::Unauthorized { message, redirect } => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": message, "redirect": redirect }),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, json!({ "error": msg }))
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
