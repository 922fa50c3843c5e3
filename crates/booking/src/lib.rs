//! Booking domain module.
//!
//! Business rules for guests, hotel inventory and reservations, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod guest;
pub mod ledger;
pub mod property;
pub mod reservation;

pub use guest::{Email, Guest, NewGuest};
pub use ledger::{Capacity, DenyReason, ReserveOutcome};
pub use property::{Hotel, NewHotel, NewRate, NewRoom, NewRoomType, Rate, Room, RoomType};
pub use reservation::{
    CancelReservation, PlaceReservation, Reservation, ReservationCancelled, ReservationCommand,
    ReservationEvent, ReservationPlaced, ReservationStatus, StayPeriod,
};
