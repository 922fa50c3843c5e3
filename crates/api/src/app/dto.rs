use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use innkeep_core::DomainError;

use super::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterGuestRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub guest_uuid: String,
    pub hotel_uuid: String,
    pub roomtype_uuid: String,
    /// Both dates must be given together; otherwise the default stay applies.
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CancelReservationRequest {
    pub guest_uuid: String,
    pub roomtype_uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateHotelRequest {
    pub name: String,
    pub address: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomTypeRequest {
    pub hotel_uuid: String,
    pub inventory: i64,
    #[serde(default)]
    pub reserved: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub roomtype_uuid: String,
    pub hotel_uuid: String,
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateRateRequest {
    pub hotel_uuid: String,
    pub roomtype_uuid: String,
    pub rate: i64,
    pub date: NaiveDate,
}

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    pub roomtype_uuid: String,
    pub hotel_uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub hotel_uuid: String,
    pub roomtype_uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct ReservationQuery {
    pub guest_uuid: String,
    pub roomtype_uuid: String,
}

// -------------------------
// Helpers
// -------------------------

/// Parse a typed id from a request field, or a ready-made 400 response.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    T::from_str(raw)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub fn items<T: serde::Serialize>(items: Vec<T>) -> serde_json::Value {
    serde_json::json!({ "items": items })
}
