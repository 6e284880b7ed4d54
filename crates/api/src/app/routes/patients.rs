//! Patient and doctor directory endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use civica_core::PatientId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/patients", post(create_patient).get(list_patients))
        .route("/patients/:id", get(get_patient))
        .route("/doctors", post(create_doctor).get(list_doctors))
}

pub async fn create_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreatePatientRequest>,
) -> axum::response::Response {
    match services.health.register_patient(
        caller.claim(),
        body.subject_id,
        body.first_name,
        body.last_name,
        body.date_of_birth,
    ) {
        Ok(p) => (StatusCode::CREATED, Json(dto::patient_to_json(&p))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_patients(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.health.list_patients(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::patient_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PatientId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid patient id")
        }
    };
    match services.health.get_patient(caller.claim(), id) {
        Ok(p) => (StatusCode::OK, Json(dto::patient_to_json(&p))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn create_doctor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateDoctorRequest>,
) -> axum::response::Response {
    match services.health.register_doctor(
        caller.claim(),
        body.subject_id,
        body.first_name,
        body.last_name,
        body.specialty,
    ) {
        Ok(d) => (StatusCode::CREATED, Json(dto::doctor_to_json(&d))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_doctors(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.health.list_doctors() {
        Ok(list) => {
            let items = list.iter().map(dto::doctor_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}
