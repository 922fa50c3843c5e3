//! Entity store contracts and adapters.
//!
//! Capabilities are split into narrow traits (create / get / delete /
//! transactional booking) so callers only receive what they use. Adapters:
//!
//! - `InMemoryStore` (dev/test)
//! - `PostgresStore` (sqlx)
//!
//! ## Booking transactions
//!
//! The reservation counter and the reservation row are written through one
//! `BookingTransaction`. Writes become visible only on `commit`; dropping a
//! transaction discards them. Both adapters serialize transactions touching
//! the same room type and let different room types proceed in parallel.

use async_trait::async_trait;
use thiserror::Error;

use innkeep_booking::{
    Capacity, Guest, Hotel, NewGuest, NewHotel, NewRate, NewRoom, NewRoomType, Rate,
    Reservation, ReserveOutcome, Room, RoomType,
};
use innkeep_core::{DomainError, GuestId, HotelId, RoomTypeId};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity store operation error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed record does not exist (or is tombstoned).
    #[error("{0} not found")]
    NotFound(String),
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The input could not be turned into a valid record.
    #[error("invalid record: {0}")]
    Invalid(String),
    /// The backend rejected or failed the operation.
    #[error("database error: {0}")]
    Database(String),
    /// The backend is not reachable (closed pool, poisoned lock, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(what) => StoreError::NotFound(what),
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
            other => StoreError::Invalid(other.to_string()),
        }
    }
}

/// Create contract. The store assigns identity and timestamps.
#[async_trait]
pub trait CreateRepository: Send + Sync {
    /// Fails with `Conflict` when an active guest already uses the email.
    async fn create_guest(&self, guest: NewGuest) -> StoreResult<Guest>;
    async fn create_hotel(&self, hotel: NewHotel) -> StoreResult<Hotel>;
    async fn create_room_type(&self, room_type: NewRoomType) -> StoreResult<RoomType>;
    async fn create_room(&self, room: NewRoom) -> StoreResult<Room>;
    async fn create_rate(&self, rate: NewRate) -> StoreResult<Rate>;
}

/// Get/fetch contract. Tombstoned records are never returned.
#[async_trait]
pub trait GetRepository: Send + Sync {
    async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>>;
    async fn get_hotel(&self, id: HotelId) -> StoreResult<Option<Hotel>>;
    async fn get_room_type(&self, id: RoomTypeId) -> StoreResult<Option<RoomType>>;

    /// A room of the given type within the given hotel.
    async fn get_room(&self, room_type_id: RoomTypeId, hotel_id: HotelId)
    -> StoreResult<Option<Room>>;

    /// A rate for the given room type within the given hotel.
    async fn get_rate(&self, hotel_id: HotelId, room_type_id: RoomTypeId)
    -> StoreResult<Option<Rate>>;

    /// Most recently created reservation for the pair, in any status.
    async fn get_reservation(
        &self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Option<Reservation>>;

    async fn list_guests(&self) -> StoreResult<Vec<Guest>>;
    async fn list_hotels(&self) -> StoreResult<Vec<Hotel>>;
    async fn list_room_types(&self) -> StoreResult<Vec<RoomType>>;
    async fn list_rooms(&self) -> StoreResult<Vec<Room>>;
    async fn list_rates(&self) -> StoreResult<Vec<Rate>>;
    async fn list_reservations(&self) -> StoreResult<Vec<Reservation>>;
}

/// Deletion/inactivation contract. Records are tombstoned, never erased.
#[async_trait]
pub trait DeleteRepository: Send + Sync {
    async fn tombstone_guest(&self, id: GuestId) -> StoreResult<()>;
    async fn tombstone_hotel(&self, id: HotelId) -> StoreResult<()>;
    async fn tombstone_room_type(&self, id: RoomTypeId) -> StoreResult<()>;
}

/// Per room type reserve/release under the surrounding transaction.
///
/// The first call touching a room type takes that room type's lock, held
/// until the transaction ends. `try_reserve` and `release` are the only
/// mutation paths for the counter.
#[async_trait]
pub trait InventoryLedger: Send {
    /// Take one unit if `reserved < inventory`. `NotFound` if the room type
    /// does not exist or is tombstoned.
    async fn try_reserve(&mut self, room_type_id: RoomTypeId) -> StoreResult<ReserveOutcome>;

    /// Give one unit back, floored at zero. Returns the post-release snapshot.
    async fn release(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity>;

    /// Consistent `(inventory, reserved)` snapshot as seen by this transaction.
    async fn capacity(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity>;
}

/// Update contract: reservation row + counter writes as one unit.
#[async_trait]
pub trait BookingTransaction: InventoryLedger {
    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()>;

    /// Live reservations for the pair in any status, oldest first. Locks the
    /// room type first so concurrent cancellations of the same pair serialize.
    async fn reservations_for(
        &mut self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Vec<Reservation>>;

    /// Persist the status and `updated_at` of an existing reservation.
    async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Opens booking transactions.
#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn BookingTransaction>>;
}
