//! Medical certificate issuance and lookup (the school/health bridge).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use civica_core::{CertificateId, PatientId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_certificate).get(list_certificates))
        .route("/:id", get(get_certificate))
}

pub async fn create_certificate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateCertificateRequest>,
) -> axum::response::Response {
    match services.health.issue_certificate(
        caller.claim(),
        body.patient_id,
        body.kind,
        body.valid_from,
        body.valid_to,
        body.notes,
    ) {
        Ok(c) => (StatusCode::CREATED, Json(dto::certificate_to_json(&c))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CertificateFilter {
    pub patient_id: Option<PatientId>,
}

pub async fn list_certificates(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Query(filter): Query<CertificateFilter>,
) -> axum::response::Response {
    match services
        .health
        .list_certificates(caller.claim(), filter.patient_id)
    {
        Ok(list) => {
            let items = list.iter().map(dto::certificate_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_certificate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CertificateId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid certificate id",
            )
        }
    };
    match services.health.get_certificate(caller.claim(), id) {
        Ok(c) => (StatusCode::OK, Json(dto::certificate_to_json(&c))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}
