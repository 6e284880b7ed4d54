use axum::{routing::get, Router};

pub mod absences;
pub mod certificates;
pub mod enrollments;
pub mod health_appointments;
pub mod health_cards;
pub mod patients;
pub mod prescriptions;
pub mod records;
pub mod roster;
pub mod school_appointments;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/school", school_router())
        .nest("/health", health_router())
}

fn school_router() -> Router {
    Router::new()
        .nest("/enrollments", enrollments::router())
        .nest("/absences", absences::router())
        .nest("/appointments", school_appointments::router())
        .merge(roster::router())
}

fn health_router() -> Router {
    Router::new()
        .nest("/appointments", health_appointments::router())
        .nest("/prescriptions", prescriptions::router())
        .nest("/card-requests", health_cards::router())
        .nest("/certificates", certificates::router())
        .nest("/records", records::router())
        .merge(patients::router())
}
