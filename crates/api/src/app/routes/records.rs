use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use civica_core::PatientId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new().route("/", post(create_record).get(list_records))
}

pub async fn create_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateRecordRequest>,
) -> axum::response::Response {
    match services.health.add_record(
        caller.claim(),
        body.patient_id,
        body.diagnosis,
        body.treatment,
        body.recorded_on,
    ) {
        Ok(r) => (StatusCode::CREATED, Json(dto::record_to_json(&r))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordFilter {
    pub patient_id: Option<PatientId>,
}

pub async fn list_records(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Query(filter): Query<RecordFilter>,
) -> axum::response::Response {
    match services.health.list_records(caller.claim(), filter.patient_id) {
        Ok(list) => {
            let items = list.iter().map(dto::record_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}
