use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_access::{AccessError, CoreAccessError};
use serde_json::json;
use syncscript::{CitationError, StoreError};
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates the errors of every layer the handlers call into,
/// allowing them to be converted into HTTP responses with a stable `code`.
pub enum AppError {
    /// Authorization and membership outcomes from `core-access`.
    Access(AccessError),
    /// Account and credential errors from `core-access`.
    Account(CoreAccessError),
    /// Repository errors from `syncscript`.
    Store(StoreError),
    Citation(CitationError),
    BadRequest(String),
    NotFound(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        AppError::Access(err)
    }
}

impl From<CoreAccessError> for AppError {
    fn from(err: CoreAccessError) -> Self {
        AppError::Account(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<CitationError> for AppError {
    fn from(err: CitationError) -> Self {
        AppError::Citation(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

const INTERNAL_MESSAGE: &str = "An internal server error occurred.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, code, error_message, required_role) = match self {
            AppError::Access(err) => {
                let Some(status) = access_status(&err) else {
                    error!("AccessError: {:?}", err);
                    return internal_response();
                };
                let required = match &err {
                    AccessError::Forbidden { required, .. } => Some(*required),
                    _ => None,
                };
                (status, err.code(), err.to_string(), required)
            }
            AppError::Account(err) => match err {
                CoreAccessError::EmailTaken(_) => {
                    (StatusCode::CONFLICT, "EMAIL_TAKEN", err.to_string(), None)
                }
                CoreAccessError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    err.to_string(),
                    None,
                ),
                CoreAccessError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string(), None)
                }
                other => {
                    error!("CoreAccessError: {:?}", other);
                    return internal_response();
                }
            },
            AppError::Store(err) => match err {
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string(), None),
                StoreError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string(), None)
                }
                other => {
                    error!("StoreError: {:?}", other);
                    return internal_response();
                }
            },
            AppError::Citation(err) => match err {
                CitationError::NothingToCite => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string(), None)
                }
                other => {
                    error!("CitationError: {:?}", other);
                    (StatusCode::BAD_GATEWAY, "CITATION_FAILED", other.to_string(), None)
                }
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                return internal_response();
            }
        };

        let mut body = json!({
            "error": error_message,
            "code": code,
        });
        if let Some(role) = required_role {
            body["required_role"] = json!(role);
        }

        (status_code, Json(body)).into_response()
    }
}

/// The status of an access outcome, or `None` for infrastructure failures.
fn access_status(err: &AccessError) -> Option<StatusCode> {
    if err.is_denial() {
        return Some(match err {
            AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
            _ => StatusCode::FORBIDDEN,
        });
    }
    match err {
        AccessError::AlreadyMember => Some(StatusCode::CONFLICT),
        AccessError::MemberNotFound | AccessError::VaultNotFound => Some(StatusCode::NOT_FOUND),
        _ => None,
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": INTERNAL_MESSAGE, "code": "INTERNAL" })),
    )
        .into_response()
}
