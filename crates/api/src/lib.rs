//! `civica-api` — HTTP surface for the citizen-services portal.

pub mod app;
pub mod context;
pub mod middleware;
