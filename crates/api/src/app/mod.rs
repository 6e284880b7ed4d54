//! HTTP API application wiring (axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: store/service construction (shared certificate store)
//! - `routes/`: HTTP routes + handlers (one file per resource family)
//! - `dto.rs`: request DTOs and JSON response mapping
//! - `errors.rs`: consistent error responses (with existence masking)

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(jwt_secret: String) -> Router {
    let jwt = Arc::new(civica_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services());

    // Protected routes: require a verified claim.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
