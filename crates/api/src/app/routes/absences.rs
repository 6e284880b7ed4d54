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
        .route("/", post(create_absence).get(list_absences))
        .route("/:id", get(get_absence))
        .route("/:id/status", patch(update_absence_status))
        .route("/:id/transitions", get(list_absence_transitions))
}

fn parse_id(id: &str) -> Result<EntityId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid absence id"))
}

pub async fn create_absence(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateAbsenceRequest>,
) -> axum::response::Response {
    match services.school.submit_absence(
        caller.claim(),
        body.student_id,
        body.start_date,
        body.end_date,
        body.reason,
        body.certificate_id,
    ) {
        Ok(a) => (StatusCode::CREATED, Json(dto::absence_to_json(&a))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_absences(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.school.list_absences(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::absence_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_absence(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.school.get_absence(caller.claim(), id) {
        Ok(a) => (StatusCode::OK, Json(dto::absence_to_json(&a))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn update_absence_status(
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
        .transition_absence(caller.claim(), id, body.status)
    {
        Ok(a) => (StatusCode::OK, Json(dto::absence_to_json(&a))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn list_absence_transitions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.school.absence_transitions(caller.claim(), id) {
        Ok(list) => {
            let items = list.iter().map(dto::transition_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::scoped_error_response(e),
    }
}
