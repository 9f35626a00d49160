use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{repository::{DuplicateKey, RepositoryError}, storage::StorageError};

pub const EMAIL_TAKEN: &str = "An account with the given email address already exists.";
pub const SLUG_TAKEN: &str = "There is already a post with the same slug";

/// ApiError
///
/// The single error type returned by services and handlers. Every variant maps to one
/// HTTP status and renders the `{statusCode, message, error}` body.
///
/// All authentication failures that originate from the token or from a deleted account
/// collapse into `Unauthorized` so a client cannot tell them apart.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Email or password is invalid")]
    InvalidCredentials,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("File too large")]
    PayloadTooLarge,

    #[error("Internal server error")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// ErrorBody
///
/// Wire shape of every error response. `message` is a string, or an array of
/// field-level strings for validation failures.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    #[schema(value_type = Object)]
    pub message: serde_json::Value,
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials | Self::InvalidPassword => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let status = self.status_code();
        let message = match self {
            Self::Validation(messages) => serde_json::json!(messages),
            other => serde_json::json!(other.to_string()),
        };

        ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Error").to_string(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            // The detail never reaches the client.
            tracing::error!(error = %detail, "request failed with an internal error");
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}

// --- Conversions ---

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages("", &errors, &mut messages);
        messages.sort();
        Self::Validation(messages)
    }
}

/// Flattens nested validator output into class-validator style strings, e.g.
/// `data.0.index must not be less than 0`.
fn collect_messages(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("{field} is invalid"),
                    };
                    if prefix.is_empty() {
                        out.push(message);
                    } else {
                        out.push(format!("{prefix}.{message}"));
                    }
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_messages(&join_path(prefix, field), inner, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let path = format!("{}.{index}", join_path(prefix, field));
                    collect_messages(&path, inner, out);
                }
            }
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(vec![rejection.body_text()])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(vec![rejection.body_text()])
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(vec![rejection.body_text()])
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::Validation(vec![err.body_text()])
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(DuplicateKey::Email) => Self::BadRequest(EMAIL_TAKEN.into()),
            RepositoryError::Duplicate(DuplicateKey::Slug) => Self::BadRequest(SLUG_TAKEN.into()),
            RepositoryError::Duplicate(DuplicateKey::Filename) => {
                Self::BadRequest("A picture with the same filename already exists".into())
            }
            RepositoryError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Internal(err.to_string())
    }
}
