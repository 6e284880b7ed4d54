use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use civica_core::DomainError;

/// Map a domain error for create/list routes (no entity id in play).
pub fn domain_error_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::InvalidTransition { from, requested } => json_error(
            StatusCode::CONFLICT,
            "invalid_transition",
            format!("no transition from '{from}' to '{requested}'"),
        ),
        DomainError::VerificationFailed(reason) => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "verification_failed",
            format!("certificate verification failed: {reason}"),
        ),
        DomainError::VerificationUnavailable(msg) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "verification_unavailable",
            format!("health-domain verification unavailable, retry later: {msg}"),
        ),
        DomainError::DuplicateProvisioning(msg) => {
            json_error(StatusCode::CONFLICT, "duplicate_provisioning", msg)
        }
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

/// Map a domain error for entity-scoped routes.
///
/// `Unauthorized` renders byte-identical to `NotFound` here, so a caller
/// without permission cannot learn whether the id exists.
pub fn scoped_error_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Unauthorized | DomainError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        other => domain_error_response(other),
    }
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
