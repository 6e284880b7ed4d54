use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use civica_core::EntityId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_appointment).get(list_appointments))
        .route("/:id", get(get_appointment))
        .route("/:id/status", patch(update_appointment_status))
        .route("/:id/transitions", get(list_appointment_transitions))
}

fn parse_id(id: &str) -> Result<EntityId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid appointment id")
    })
}

pub async fn create_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateSchoolAppointmentRequest>,
) -> axum::response::Response {
    match services.school.request_appointment(
        caller.claim(),
        body.staff_subject_id,
        body.scheduled_at,
        body.purpose,
        body.notes,
    ) {
        Ok(a) => (
            StatusCode::CREATED,
            Json(dto::school_appointment_to_json(&a)),
        )
            .into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_appointments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.school.list_appointments(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::school_appointment_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.school.get_appointment(caller.claim(), id) {
        Ok(a) => (StatusCode::OK, Json(dto::school_appointment_to_json(&a))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn update_appointment_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .school
        .transition_appointment(caller.claim(), id, body.status, body.notes)
    {
        Ok(a) => (StatusCode::OK, Json(dto::school_appointment_to_json(&a))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn list_appointment_transitions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.school.appointment_transitions(caller.claim(), id) {
        Ok(list) => {
            let items = list.iter().map(dto::transition_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::scoped_error_response(e),
    }
}
