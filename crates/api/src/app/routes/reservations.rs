use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use innkeep_core::{GuestId, HotelId, RoomTypeId};
use innkeep_infra::CreateReservation;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/reservation", post(create_reservation).get(get_reservation))
        .route("/cancel-reservation", post(cancel_reservation))
        .route("/reservations", get(list_reservations))
}

async fn create_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateReservationRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let guest_id: GuestId = match dto::parse_id(&body.guest_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let hotel_id: HotelId = match dto::parse_id(&body.hotel_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let room_type_id: RoomTypeId = match dto::parse_id(&body.roomtype_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let result = match (body.start_date, body.end_date) {
        (Some(start_date), Some(end_date)) => {
            services
                .facade
                .book_period(CreateReservation {
                    guest_id,
                    hotel_id,
                    room_type_id,
                    start_date,
                    end_date,
                })
                .await
        }
        (None, None) => services.facade.book(guest_id, hotel_id, room_type_id).await,
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "start_date and end_date must be given together",
            );
        }
    };

    match result {
        Ok(reservation) => (StatusCode::CREATED, Json(reservation)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn cancel_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CancelReservationRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let guest_id: GuestId = match dto::parse_id(&body.guest_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let room_type_id: RoomTypeId = match dto::parse_id(&body.roomtype_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.cancel(guest_id, room_type_id).await {
        Ok(reservation) => (StatusCode::OK, Json(reservation)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Most recent reservation (any status) for a guest and room type.
async fn get_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ReservationQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };

    let guest_id: GuestId = match dto::parse_id(&query.guest_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let room_type_id: RoomTypeId = match dto::parse_id(&query.roomtype_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.latest_reservation(guest_id, room_type_id).await {
        Ok(Some(reservation)) => (StatusCode::OK, Json(reservation)).into_response(),
        Ok(None) => errors::not_found("reservation"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn list_reservations(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.facade.reservations().await {
        Ok(items) => (StatusCode::OK, Json(dto::items(items))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
