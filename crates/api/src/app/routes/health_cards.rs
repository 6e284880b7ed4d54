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
        .route("/", post(create_card_request).get(list_card_requests))
        .route("/:id", get(get_card_request))
        .route("/:id/status", patch(update_card_request_status))
        .route("/:id/transitions", get(list_card_request_transitions))
}

fn parse_id(id: &str) -> Result<EntityId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid request id")
    })
}

pub async fn create_card_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateHealthCardRequest>,
) -> axum::response::Response {
    match services
        .health
        .submit_card_request(caller.claim(), body.request_kind, body.notes)
    {
        Ok(r) => (StatusCode::CREATED, Json(dto::card_request_to_json(&r))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn list_card_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.health.list_card_requests(caller.claim()) {
        Ok(list) => {
            let items = list.iter().map(dto::card_request_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_card_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.health.get_card_request(caller.claim(), id) {
        Ok(r) => (StatusCode::OK, Json(dto::card_request_to_json(&r))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn update_card_request_status(
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
        .health
        .transition_card_request(caller.claim(), id, body.status, body.notes)
    {
        Ok(r) => (StatusCode::OK, Json(dto::card_request_to_json(&r))).into_response(),
        Err(e) => errors::scoped_error_response(e),
    }
}

pub async fn list_card_request_transitions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.health.card_request_transitions(caller.claim(), id) {
        Ok(list) => {
            let items = list.iter().map(dto::transition_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::scoped_error_response(e),
    }
}
