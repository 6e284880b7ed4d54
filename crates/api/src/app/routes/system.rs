use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::CallerContext;

pub async fn health() -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "ok", "service": "civica-api"})),
    )
        .into_response()
}

pub async fn whoami(Extension(caller): Extension<CallerContext>) -> axum::response::Response {
    let claim = caller.claim();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "subject_id": claim.subject_id,
            "role": claim.role,
            "email": claim.email,
            "display_name": claim.display_name(),
        })),
    )
        .into_response()
}
