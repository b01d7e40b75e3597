use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The single error taxonomy every handler and extractor resolves to. Each
/// variant maps to exactly one HTTP status and one response body shape, so a
/// client can always distinguish "fix your payload" (400) from "who are you"
/// (401) from "you cannot do that" (403) from "it does not exist" (404).
///
/// Storage and upstream variants keep the source error for server-side logs
/// but only ever expose their generic message to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field validation failures, all collected. Serialized as
    /// `{"errors": [...]}` with one human-readable message per violation.
    #[error("validation failed")]
    Validation(Vec<String>),

    /// A malformed request that is not a field-level validation failure
    /// (bad id, empty patch). Serialized as `{"message": ...}`.
    #[error("{0}")]
    BadRequest(&'static str),

    /// No valid session could be resolved from the request. Absence of a
    /// session is a normal negative result, not an exception.
    #[error("unauthorized")]
    Unauthenticated,

    /// A valid session whose role does not permit the operation.
    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(&'static str),

    /// Credential sign-in failed. Deliberately indistinguishable between
    /// unknown email and wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A storage operation failed. `message` is the endpoint's generic
    /// client-facing text; `source` stays in the server logs.
    #[error("{message}")]
    Storage {
        message: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The external identity provider could not be reached or returned an
    /// unusable response.
    #[error("identity provider exchange failed")]
    Upstream(#[from] reqwest::Error),

    /// Anything else unexpected (hashing failures, token signing failures).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Wraps a `sqlx::Error` with the generic message the failing endpoint
    /// exposes to clients.
    pub fn storage(message: &'static str, source: sqlx::Error) -> Self {
        ApiError::Storage { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                // Validation is the one variant with a list body: the caller
                // sees every problem at once, never just the first.
                let body = Json(json!({ "errors": errors }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.to_string()),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Forbidden: Admin access required".to_string(),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password.".to_string(),
            ),
            ApiError::Storage { message, source } => {
                // Internal detail is logged here and nowhere else; the client
                // gets the endpoint's generic message.
                tracing::error!("storage failure: {:?}", source);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
            ApiError::Upstream(source) => {
                tracing::error!("identity provider failure: {:?}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication with the identity provider failed.".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong.".to_string(),
                )
            }
        };

        let body = Json(json!({ "message": message }));
        (status, body).into_response()
    }
}
