use axum::Router;

pub mod catalog;
pub mod guests;
pub mod reservations;
pub mod system;

/// Router for the versioned booking API (mounted under `/api/v1`).
pub fn router() -> Router {
    Router::new()
        .merge(guests::router())
        .merge(reservations::router())
        .merge(catalog::router())
}
