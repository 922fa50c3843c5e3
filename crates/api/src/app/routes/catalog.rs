//! Hotel inventory administration: hotels, room types, rooms and rates.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use innkeep_booking::{NewHotel, NewRate, NewRoom, NewRoomType};
use innkeep_core::{HotelId, RoomTypeId};
use innkeep_infra::EngineError;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/hotel", post(create_hotel))
        .route("/hotel/:id", delete(delete_hotel))
        .route("/hotels", get(list_hotels))
        .route("/room-type", post(create_room_type))
        .route("/room-type/:id", delete(delete_room_type))
        .route("/room-type/:id/capacity", get(room_type_capacity))
        .route("/room-types", get(list_room_types))
        .route("/room", post(create_room).get(get_room))
        .route("/rooms", get(list_rooms))
        .route("/rate", post(create_rate).get(get_rate))
        .route("/rates", get(list_rates))
}

async fn create_hotel(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateHotelRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let input = NewHotel {
        name: body.name,
        address: body.address,
        location: body.location,
    };

    match services.facade.create_hotel(input).await {
        Ok(hotel) => (StatusCode::CREATED, Json(hotel)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn create_room_type(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateRoomTypeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let hotel_id: HotelId = match dto::parse_id(&body.hotel_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = NewRoomType {
        hotel_id,
        inventory: body.inventory,
        reserved: body.reserved,
    };

    match services.facade.create_room_type(input).await {
        Ok(room_type) => (StatusCode::CREATED, Json(room_type)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn create_room(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateRoomRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let room_type_id: RoomTypeId = match dto::parse_id(&body.roomtype_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let hotel_id: HotelId = match dto::parse_id(&body.hotel_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = NewRoom {
        room_type_id,
        hotel_id,
        available: body.available,
    };

    match services.facade.create_room(input).await {
        Ok(room) => (StatusCode::CREATED, Json(room)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn create_rate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateRateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let hotel_id: HotelId = match dto::parse_id(&body.hotel_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let room_type_id: RoomTypeId = match dto::parse_id(&body.roomtype_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = NewRate {
        hotel_id,
        room_type_id,
        rate: body.rate,
        date: body.date,
    };

    match services.facade.create_rate(input).await {
        Ok(rate) => (StatusCode::CREATED, Json(rate)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn get_room(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::RoomQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };

    let room_type_id: RoomTypeId = match dto::parse_id(&query.roomtype_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let hotel_id: HotelId = match dto::parse_id(&query.hotel_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.room(room_type_id, hotel_id).await {
        Ok(Some(room)) => (StatusCode::OK, Json(room)).into_response(),
        Ok(None) => errors::not_found("room"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn get_rate(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::RateQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };

    let hotel_id: HotelId = match dto::parse_id(&query.hotel_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let room_type_id: RoomTypeId = match dto::parse_id(&query.roomtype_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.rate(hotel_id, room_type_id).await {
        Ok(Some(rate)) => (StatusCode::OK, Json(rate)).into_response(),
        Ok(None) => errors::not_found("rate"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn room_type_capacity(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RoomTypeId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.capacity(id).await {
        Ok(capacity) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "roomtype_uuid": id,
                "inventory": capacity.inventory(),
                "reserved": capacity.reserved(),
                "available": capacity.available(),
            })),
        )
            .into_response(),
        Err(EngineError::NotFound(_)) => errors::not_found("room type"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn delete_hotel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: HotelId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.tombstone_hotel(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(EngineError::NotFound(_)) => errors::not_found("hotel"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn delete_room_type(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RoomTypeId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.facade.tombstone_room_type(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(EngineError::NotFound(_)) => errors::not_found("room type"),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn list_hotels(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.facade.hotels().await {
        Ok(items) => (StatusCode::OK, Json(dto::items(items))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn list_room_types(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.facade.room_types().await {
        Ok(items) => (StatusCode::OK, Json(dto::items(items))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn list_rooms(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.facade.rooms().await {
        Ok(items) => (StatusCode::OK, Json(dto::items(items))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn list_rates(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.facade.rates().await {
        Ok(items) => (StatusCode::OK, Json(dto::items(items))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
