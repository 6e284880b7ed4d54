use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use civica_core::EntityId;
use civica_infra::services::school::NewEnrollment;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_enrollment).get(list_enrollments))
        .route("/:id", get(get_enrollment))
        .route("/:id/status", patch(update_enrollment_status))
        .route("/:id/transitions", get(list_enrollment_transitions))
}

pub async fn create_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateEnrollmentRequest>,
) -> axum::response::Response {
    let req = NewEnrollment {
        student_subject_id: body.student_subject_id,
        first_name: body.first_name,
        last_name: body.last_name,
        date_of_birth: body.date_of_birth,
        school_year: body.school_year,
        certificate_id: body.certificate_id,
        notes: body.notes,
    };

    match services.school.submit_enrollment(caller.claim(), req) {
        Ok(e) => (StatusCode::CREATED, Json(dto::enrollment_to_json(&e))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_enrollments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.school.list_enrollments(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::enrollment_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EntityId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid enrollment id")
        }
    };
    match services.school.get_enrollment(caller.claim(), id) {
        Ok(e) => (StatusCode::OK, Json(dto::enrollment_to_json(&e))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn update_enrollment_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionRequest>,
) -> axum::response::Response {
    let id: EntityId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid enrollment id")
        }
    };
    match services
        .school
        .transition_enrollment(caller.claim(), id, body.status, body.notes)
    {
        Ok(decision) => {
            let mut payload = dto::enrollment_to_json(&decision.enrollment);
            if let Some(obj) = payload.as_object_mut() {
                obj.insert(
                    "student_id".to_string(),
                    serde_json::to_value(decision.student_id).unwrap_or_default(),
                );
            }
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn list_enrollment_transitions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EntityId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid enrollment id")
        }
    };
    match services.school.enrollment_transitions(caller.claim(), id) {
        Ok(list) => {
            let items = list.iter().map(dto::transition_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::scoped_error_response(e),
    }
}
