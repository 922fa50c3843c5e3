use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use innkeep_booking::NewGuest;
use innkeep_core::GuestId;
use innkeep_infra::EngineError;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/guest", post(register_guest))
        .route("/guest/:id", get(get_guest).delete(delete_guest))
        .route("/guests", get(list_guests))
}

async fn register_guest(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterGuestRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let input = NewGuest {
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        age: body.age,
    };

    match services.facade.register_guest(input).await {
        Ok(guest) => (StatusCode::CREATED, Json(guest)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn get_guest(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: GuestId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.guest(id).await {
        Ok(guest) => (StatusCode::OK, Json(guest)).into_response(),
        Err(EngineError::NotFound(_)) => errors::not_found("guest"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn delete_guest(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: GuestId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.tombstone_guest(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(EngineError::NotFound(_)) => errors::not_found("guest"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn list_guests(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.facade.guests().await {
        Ok(items) => (StatusCode::OK, Json(dto::items(items))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
