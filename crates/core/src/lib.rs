//! `innkeep-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod audit;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use audit::AuditFields;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{GuestId, HotelId, RateId, ReservationId, RoomId, RoomTypeId};
