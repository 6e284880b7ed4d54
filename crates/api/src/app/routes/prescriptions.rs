use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;

use civica_core::EntityId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_prescription).get(list_prescriptions))
        .route("/:id", get(get_prescription))
        .route("/:id/status", patch(update_prescription_status))
}

pub async fn get_prescription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EntityId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid prescription id",
            )
        }
    };
    match services.health.get_prescription(caller.claim(), id) {
        Ok(p) => (StatusCode::OK, Json(dto::prescription_to_json(&p, Utc::now()))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn create_prescription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreatePrescriptionRequest>,
) -> axum::response::Response {
    match services.health.issue_prescription(
        caller.claim(),
        body.patient_id,
        body.medication,
        body.dosage,
        body.valid_until,
    ) {
        Ok(p) => (
            StatusCode::CREATED,
            Json(dto::prescription_to_json(&p, Utc::now())),
        )
            .into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_prescriptions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    let now = Utc::now();
    match services.health.list_prescriptions(caller.claim()) {
        Ok(list) => {
            let items = list
                .iter()
                .map(|p| dto::prescription_to_json(p, now))
                .collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

/// Always fails: prescription statuses are derived, not driven.
pub async fn update_prescription_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionRequest>,
) -> axum::response::Response {
    let id: EntityId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid prescription id",
            )
        }
    };
    match services
        .health
        .transition_prescription(caller.claim(), id, body.status)
    {
        Ok(p) => (StatusCode::OK, Json(dto::prescription_to_json(&p, Utc::now()))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}
