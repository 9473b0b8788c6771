use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_auth::AuthError;
use storefront_core::DomainError;
use storefront_infra::{ServiceError, StoreError};
use storefront_reviews::DUPLICATE_REVIEW_MESSAGE;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Auth(e) => auth_error_to_response(e),
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidField { field, message } => field_error(&field, message),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        DomainError::Conflict(msg) => {
            let code = if msg == DUPLICATE_REVIEW_MESSAGE {
                "duplicate_review"
            } else {
                "conflict"
            };
            json_error(StatusCode::BAD_REQUEST, code, msg)
        }
        DomainError::Unauthorized => json_error(
            StatusCode::FORBIDDEN,
            "permission_denied",
            "You do not have permission to perform this action.",
        ),
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::PasswordHash(_) | AuthError::TokenSigning(_) => {
            tracing::error!(error = %err, "credential processing failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
        AuthError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        AuthError::InvalidToken | AuthError::Expired | AuthError::WrongTokenType => {
            json_error(StatusCode::UNAUTHORIZED, "token_not_valid", err.to_string())
        }
    }
}

/// Store faults are never shown to clients.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store error");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_error",
        "internal server error",
    )
}

/// Malformed or mistyped JSON bodies are client errors (400).
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 400 naming the offending field, e.g. `{"error": "validation_error",
/// "message": "...", "field": "password"}`.
pub fn field_error(field: &str, message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": message.into(),
            "field": field,
        })),
    )
        .into_response()
}
