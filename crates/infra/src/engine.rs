//! Reservation engine: create and cancel reservations against the inventory
//! ledger.
//!
//! ```text
//! CreateReservation
//!   ↓
//! 1. Validate the stay period, resolve guest / hotel / room type (live only)
//!   ↓
//! 2. Decide the Reservation (pure aggregate command)
//!   ↓
//! 3. begin → try_reserve (Denied → CapacityExceeded, nothing written)
//!   ↓
//! 4. insert reservation (failure → compensating release, rollback)
//!   ↓
//! 5. commit
//! ```
//!
//! Cancellation runs the same way: lock the room type, find the single
//! RESERVED match, cancel it, release one unit, persist, commit.
//!
//! Every operation runs under an `OpContext`. When the deadline passes the
//! in-flight transaction is dropped, which discards its staged writes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;
use tracing::instrument;

use innkeep_booking::{
    Capacity, PlaceReservation, Reservation, ReservationStatus, StayPeriod,
};
use innkeep_core::{DomainError, GuestId, HotelId, ReservationId, RoomTypeId};

use crate::store::{BookingTransaction, GetRepository, StoreError, TransactionalRepository};

/// Engine-level error taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed input or bad date ordering.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A referenced record does not exist or is tombstoned.
    #[error("{0} not found")]
    NotFound(String),
    /// `reserved == inventory`; never retried automatically.
    #[error("capacity exceeded: {reserved} of {inventory} units reserved")]
    CapacityExceeded { inventory: i64, reserved: i64 },
    #[error("reservation already cancelled")]
    AlreadyCancelled,
    /// More than one record matched where exactly one was expected.
    #[error("ambiguous: {0}")]
    Ambiguous(String),
    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The store failed; a compensating release was attempted where relevant.
    #[error("storage error: {0}")]
    Storage(String),
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl EngineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::NotFound(_) => "not_found",
            EngineError::CapacityExceeded { .. } => "capacity_exceeded",
            EngineError::AlreadyCancelled => "already_cancelled",
            EngineError::Ambiguous(_) => "ambiguous",
            EngineError::Conflict(_) => "conflict",
            EngineError::Storage(_) => "storage_error",
            EngineError::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::InvariantViolation(msg) => EngineError::Validation(msg),
            DomainError::NotFound(what) => EngineError::NotFound(what),
            DomainError::CapacityExceeded {
                inventory,
                reserved,
            } => EngineError::CapacityExceeded {
                inventory,
                reserved,
            },
            DomainError::AlreadyCancelled => EngineError::AlreadyCancelled,
            DomainError::Ambiguous(msg) => EngineError::Ambiguous(msg),
            DomainError::Conflict(msg) => EngineError::Conflict(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            StoreError::Conflict(msg) => EngineError::Conflict(msg),
            StoreError::Invalid(msg) => EngineError::Validation(msg),
            other @ (StoreError::Database(_) | StoreError::Unavailable(_)) => {
                EngineError::Storage(other.to_string())
            }
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Per-call cancellation context.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
}

impl OpContext {
    /// No deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Drive `op` to completion or until the deadline. An expired context
    /// never starts the operation.
    pub async fn run<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        let Some(deadline) = self.deadline else {
            return op.await;
        };
        if Instant::now() >= deadline {
            return Err(EngineError::DeadlineExceeded);
        }
        match tokio::time::timeout_at(deadline, op).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("operation abandoned at deadline; transaction rolled back");
                Err(EngineError::DeadlineExceeded)
            }
        }
    }
}

/// Input for `ReservationEngine::create_reservation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateReservation {
    pub guest_id: GuestId,
    pub hotel_id: HotelId,
    pub room_type_id: RoomTypeId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Coordinates the inventory ledger and the reservation state machine.
#[derive(Clone)]
pub struct ReservationEngine {
    reader: Arc<dyn GetRepository>,
    transactions: Arc<dyn TransactionalRepository>,
}

impl std::fmt::Debug for ReservationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationEngine").finish_non_exhaustive()
    }
}

impl ReservationEngine {
    pub fn new(
        reader: Arc<dyn GetRepository>,
        transactions: Arc<dyn TransactionalRepository>,
    ) -> Self {
        Self {
            reader,
            transactions,
        }
    }

    /// Reserve one unit of the room type and persist a RESERVED reservation.
    pub async fn create_reservation(
        &self,
        ctx: &OpContext,
        request: CreateReservation,
    ) -> EngineResult<Reservation> {
        ctx.run(self.create(request)).await
    }

    /// Cancel the single RESERVED reservation held by `guest_id` on the room
    /// type and give its unit back.
    pub async fn cancel_reservation(
        &self,
        ctx: &OpContext,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> EngineResult<Reservation> {
        ctx.run(self.cancel(guest_id, room_type_id)).await
    }

    /// Consistent `(inventory, reserved)` snapshot.
    pub async fn capacity(
        &self,
        ctx: &OpContext,
        room_type_id: RoomTypeId,
    ) -> EngineResult<Capacity> {
        ctx.run(self.snapshot(room_type_id)).await
    }

    async fn snapshot(&self, room_type_id: RoomTypeId) -> EngineResult<Capacity> {
        let mut tx = self.transactions.begin().await?;
        let capacity = tx.capacity(room_type_id).await;
        abort(tx).await;
        Ok(capacity?)
    }

    #[instrument(
        skip(self, request),
        fields(
            guest_id = %request.guest_id,
            hotel_id = %request.hotel_id,
            room_type_id = %request.room_type_id
        ),
        err
    )]
    async fn create(&self, request: CreateReservation) -> EngineResult<Reservation> {
        let period = StayPeriod::new(request.start_date, request.end_date)?;

        self.reader
            .get_guest(request.guest_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("guest".to_string()))?;
        self.reader
            .get_hotel(request.hotel_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("hotel".to_string()))?;
        let room_type = self
            .reader
            .get_room_type(request.room_type_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("room type".to_string()))?;
        if room_type.hotel_id != request.hotel_id {
            return Err(EngineError::Validation(
                "room type does not belong to hotel".to_string(),
            ));
        }

        let reservation = Reservation::place(PlaceReservation {
            reservation_id: ReservationId::new(),
            guest_id: request.guest_id,
            hotel_id: request.hotel_id,
            room_type_id: request.room_type_id,
            start_date: period.start(),
            end_date: period.end(),
            occurred_at: Utc::now(),
        })?;

        let mut tx = self.transactions.begin().await?;

        let outcome = match tx.try_reserve(request.room_type_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                abort(tx).await;
                return Err(e.into());
            }
        };
        let capacity = match outcome.into_result() {
            Ok(capacity) => capacity,
            Err(e) => {
                abort(tx).await;
                tracing::info!(error = %e, "reservation rejected: room type at capacity");
                return Err(e.into());
            }
        };

        // The room type is locked from here on, so no concurrent create for
        // the same guest can slip in between this check and the insert.
        let existing = match tx
            .reservations_for(request.guest_id, request.room_type_id)
            .await
        {
            Ok(existing) => existing,
            Err(e) => {
                abort(tx).await;
                return Err(e.into());
            }
        };
        if existing.iter().any(Reservation::is_reserved) {
            abort(tx).await;
            tracing::info!("reservation rejected: guest already holds this room type");
            return Err(EngineError::Conflict(
                "guest already holds an active reservation for this room type".to_string(),
            ));
        }

        if let Err(e) = tx.insert_reservation(&reservation).await {
            tracing::warn!(error = %e, "reservation insert failed; releasing reserved unit");
            if let Err(release_err) = tx.release(request.room_type_id).await {
                tracing::warn!(error = %release_err, "compensating release failed");
            }
            abort(tx).await;
            return Err(e.into());
        }

        tx.commit().await?;

        tracing::info!(
            reservation_id = %reservation.id_typed(),
            reserved = capacity.reserved(),
            "reservation created"
        );
        Ok(reservation)
    }

    #[instrument(skip(self), fields(guest_id = %guest_id, room_type_id = %room_type_id), err)]
    async fn cancel(
        &self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> EngineResult<Reservation> {
        let mut tx = self.transactions.begin().await?;

        let existing = match tx.reservations_for(guest_id, room_type_id).await {
            Ok(existing) => existing,
            Err(e) => {
                abort(tx).await;
                return Err(e.into());
            }
        };

        let mut reserved: Vec<Reservation> =
            existing.iter().filter(|r| r.is_reserved()).cloned().collect();
        let mut reservation = match reserved.len() {
            1 => reserved.remove(0),
            0 => {
                abort(tx).await;
                let any_cancelled = existing
                    .iter()
                    .any(|r| r.status() == ReservationStatus::Cancelled);
                if any_cancelled {
                    tracing::info!("cancel rejected: reservation already cancelled");
                    return Err(EngineError::AlreadyCancelled);
                }
                tracing::info!("cancel rejected: no reservation for guest and room type");
                return Err(EngineError::NotFound("reservation".to_string()));
            }
            n => {
                abort(tx).await;
                return Err(EngineError::Ambiguous(format!(
                    "{n} active reservations for guest and room type"
                )));
            }
        };

        if let Err(e) = reservation.cancel(Utc::now()) {
            abort(tx).await;
            return Err(e.into());
        }

        let released = match tx.release(room_type_id).await {
            Ok(capacity) => capacity,
            Err(e) => {
                abort(tx).await;
                return Err(e.into());
            }
        };

        if let Err(e) = tx.update_reservation(&reservation).await {
            tracing::warn!(error = %e, "reservation update failed; cancellation rolled back");
            abort(tx).await;
            return Err(e.into());
        }

        tx.commit().await?;

        tracing::info!(
            reservation_id = %reservation.id_typed(),
            reserved = released.reserved(),
            "reservation cancelled"
        );
        Ok(reservation)
    }
}

/// Roll back, logging (not surfacing) rollback failures.
async fn abort(tx: Box<dyn BookingTransaction>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use innkeep_booking::{Guest, NewGuest, NewHotel, NewRoomType, ReserveOutcome, RoomType};

    use crate::store::{
        CreateRepository, DeleteRepository, InMemoryStore, InventoryLedger, StoreResult,
    };

    struct Fixture {
        store: InMemoryStore,
        engine: ReservationEngine,
        guest: Guest,
        room_type: RoomType,
    }

    async fn fixture(inventory: i64, reserved: i64) -> Fixture {
        let store = InMemoryStore::new();
        let engine = ReservationEngine::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let (guest, room_type) = seed(&store, inventory, reserved).await;
        Fixture {
            store,
            engine,
            guest,
            room_type,
        }
    }

    async fn seed(store: &InMemoryStore, inventory: i64, reserved: i64) -> (Guest, RoomType) {
        let hotel = store
            .create_hotel(NewHotel {
                name: "Seaview".to_string(),
                address: "2 Shore Rd".to_string(),
                location: "Mombasa".to_string(),
            })
            .await
            .unwrap();
        let room_type = store
            .create_room_type(NewRoomType {
                hotel_id: hotel.id,
                inventory,
                reserved,
            })
            .await
            .unwrap();
        let guest = store
            .create_guest(NewGuest {
                first_name: "Alan".to_string(),
                last_name: "Turing".to_string(),
                email: format!("alan+{}@example.com", GuestId::new()),
                age: 41,
            })
            .await
            .unwrap();
        (guest, room_type)
    }

    fn request(guest: &Guest, room_type: &RoomType) -> CreateReservation {
        let start = Utc::now();
        CreateReservation {
            guest_id: guest.id,
            hotel_id: room_type.hotel_id,
            room_type_id: room_type.id,
            start_date: start,
            end_date: start + ChronoDuration::hours(72),
        }
    }

    async fn reserved(f: &Fixture) -> i64 {
        f.engine
            .capacity(&OpContext::background(), f.room_type.id)
            .await
            .unwrap()
            .reserved()
    }

    #[tokio::test]
    async fn create_increments_reserved() {
        let f = fixture(500, 250).await;

        let reservation = f
            .engine
            .create_reservation(&OpContext::background(), request(&f.guest, &f.room_type))
            .await
            .unwrap();

        assert_eq!(reservation.status(), ReservationStatus::Reserved);
        assert_eq!(reservation.guest_id(), f.guest.id);
        assert_eq!(reserved(&f).await, 251);
    }

    #[tokio::test]
    async fn create_at_capacity_is_rejected_without_side_effects() {
        let f = fixture(1, 1).await;

        let err = f
            .engine
            .create_reservation(&OpContext::background(), request(&f.guest, &f.room_type))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::CapacityExceeded {
                inventory: 1,
                reserved: 1
            }
        );
        assert_eq!(reserved(&f).await, 1);
        assert!(f.store.list_reservations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_releases_one_unit() {
        let f = fixture(3, 0).await;
        let ctx = OpContext::background();
        let created = f
            .engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap();
        assert_eq!(reserved(&f).await, 1);

        let cancelled = f
            .engine
            .cancel_reservation(&ctx, f.guest.id, f.room_type.id)
            .await
            .unwrap();

        assert_eq!(cancelled.id_typed(), created.id_typed());
        assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
        assert!(cancelled.audit_fields().updated_at >= created.audit_fields().updated_at);
        assert_eq!(reserved(&f).await, 0);
    }

    #[tokio::test]
    async fn cancel_without_match_is_not_found() {
        let f = fixture(3, 2).await;

        let err = f
            .engine
            .cancel_reservation(&OpContext::background(), f.guest.id, f.room_type.id)
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::NotFound("reservation".to_string()));
        assert_eq!(reserved(&f).await, 2);
    }

    #[tokio::test]
    async fn second_cancel_is_already_cancelled_and_releases_once() {
        let f = fixture(2, 0).await;
        let ctx = OpContext::background();
        f.engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap();
        f.engine
            .cancel_reservation(&ctx, f.guest.id, f.room_type.id)
            .await
            .unwrap();

        let err = f
            .engine
            .cancel_reservation(&ctx, f.guest.id, f.room_type.id)
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::AlreadyCancelled);
        assert_eq!(reserved(&f).await, 0);
    }

    #[tokio::test]
    async fn second_active_reservation_for_same_guest_is_a_conflict() {
        let f = fixture(5, 0).await;
        let ctx = OpContext::background();
        f.engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap();

        let err = f
            .engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Conflict(_)));
        assert_eq!(reserved(&f).await, 1);
        assert_eq!(f.store.list_reservations().await.unwrap().len(), 1);

        // The single active reservation can still be cancelled, and the guest
        // may book again afterwards.
        f.engine
            .cancel_reservation(&ctx, f.guest.id, f.room_type.id)
            .await
            .unwrap();
        assert_eq!(reserved(&f).await, 0);
        f.engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap();
        assert_eq!(reserved(&f).await, 1);
    }

    #[tokio::test]
    async fn two_active_reservations_are_ambiguous() {
        let f = fixture(5, 0).await;
        let ctx = OpContext::background();

        // Seed two RESERVED rows directly; the engine never produces this.
        let mut tx = f.store.begin().await.unwrap();
        for _ in 0..2 {
            tx.try_reserve(f.room_type.id).await.unwrap();
            let req = request(&f.guest, &f.room_type);
            let reservation = Reservation::place(PlaceReservation {
                reservation_id: ReservationId::new(),
                guest_id: req.guest_id,
                hotel_id: req.hotel_id,
                room_type_id: req.room_type_id,
                start_date: req.start_date,
                end_date: req.end_date,
                occurred_at: Utc::now(),
            })
            .unwrap();
            tx.insert_reservation(&reservation).await.unwrap();
        }
        tx.commit().await.unwrap();

        let err = f
            .engine
            .cancel_reservation(&ctx, f.guest.id, f.room_type.id)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Ambiguous(_)));
        assert_eq!(reserved(&f).await, 2);
    }

    #[tokio::test]
    async fn round_trip_through_store_reads() {
        let f = fixture(4, 0).await;
        let ctx = OpContext::background();
        let created = f
            .engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap();

        let stored = f
            .store
            .get_reservation(f.guest.id, f.room_type.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id_typed(), created.id_typed());
        assert_eq!(stored.hotel_id(), f.room_type.hotel_id);
        assert_eq!(stored.status(), ReservationStatus::Reserved);

        f.engine
            .cancel_reservation(&ctx, f.guest.id, f.room_type.id)
            .await
            .unwrap();
        let stored = f
            .store
            .get_reservation(f.guest.id, f.room_type.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn rejects_inverted_period() {
        let f = fixture(4, 0).await;
        let mut req = request(&f.guest, &f.room_type);
        req.end_date = req.start_date;

        let err = f
            .engine
            .create_reservation(&OpContext::background(), req)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(reserved(&f).await, 0);
    }

    #[tokio::test]
    async fn missing_or_tombstoned_references_are_not_found() {
        let f = fixture(4, 0).await;
        let ctx = OpContext::background();

        let mut req = request(&f.guest, &f.room_type);
        req.guest_id = GuestId::new();
        let err = f.engine.create_reservation(&ctx, req).await.unwrap_err();
        assert_eq!(err, EngineError::NotFound("guest".to_string()));

        f.store.tombstone_room_type(f.room_type.id).await.unwrap();
        let err = f
            .engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound("room type".to_string()));
    }

    #[tokio::test]
    async fn capacity_of_tombstoned_room_type_is_not_found() {
        let f = fixture(5, 2).await;
        f.store.tombstone_room_type(f.room_type.id).await.unwrap();

        let err = f
            .engine
            .capacity(&OpContext::background(), f.room_type.id)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound("room type".to_string()));
    }

    #[tokio::test]
    async fn room_type_of_other_hotel_is_rejected() {
        let f = fixture(4, 0).await;
        let mut req = request(&f.guest, &f.room_type);
        let other = f
            .store
            .create_hotel(NewHotel {
                name: "Inland".to_string(),
                address: "9 Hill Rd".to_string(),
                location: "Nakuru".to_string(),
            })
            .await
            .unwrap();
        req.hotel_id = other.id;

        let err = f
            .engine
            .create_reservation(&OpContext::background(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_never_overbook() {
        const CALLERS: usize = 16;
        let f = fixture(1, 0).await;

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..CALLERS {
            let engine = f.engine.clone();
            let req = request(&f.guest, &f.room_type);
            tasks.spawn(async move {
                engine
                    .create_reservation(&OpContext::background(), req)
                    .await
            });
        }

        let mut successes = 0;
        let mut rejections = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => successes += 1,
                Err(EngineError::CapacityExceeded { .. }) => rejections += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(rejections, CALLERS - 1);
        assert_eq!(reserved(&f).await, 1);
        assert_eq!(f.store.list_reservations().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_and_cancels_stay_within_inventory() {
        let f = fixture(3, 0).await;
        let mut guests = Vec::new();
        for _ in 0..6 {
            let guest = f
                .store
                .create_guest(NewGuest {
                    first_name: "Load".to_string(),
                    last_name: "Tester".to_string(),
                    email: format!("load+{}@example.com", GuestId::new()),
                    age: 30,
                })
                .await
                .unwrap();
            guests.push(guest);
        }

        let mut tasks = tokio::task::JoinSet::new();
        for guest in &guests {
            let engine = f.engine.clone();
            let req = request(guest, &f.room_type);
            let (guest_id, room_type_id) = (guest.id, f.room_type.id);
            tasks.spawn(async move {
                let ctx = OpContext::background();
                if engine.create_reservation(&ctx, req).await.is_ok() {
                    engine
                        .cancel_reservation(&ctx, guest_id, room_type_id)
                        .await
                        .map(|_| ())
                } else {
                    Ok(())
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
            let capacity = f
                .engine
                .capacity(&OpContext::background(), f.room_type.id)
                .await
                .unwrap();
            assert!(capacity.reserved() >= 0 && capacity.reserved() <= capacity.inventory());
        }

        assert_eq!(reserved(&f).await, 0);
    }

    /// Delegates to the in-memory store but fails every reservation insert.
    struct FailingInsertStore(InMemoryStore);

    struct FailingInsertTransaction(Box<dyn BookingTransaction>);

    #[async_trait]
    impl TransactionalRepository for FailingInsertStore {
        async fn begin(&self) -> StoreResult<Box<dyn BookingTransaction>> {
            Ok(Box::new(FailingInsertTransaction(self.0.begin().await?)))
        }
    }

    #[async_trait]
    impl InventoryLedger for FailingInsertTransaction {
        async fn try_reserve(&mut self, room_type_id: RoomTypeId) -> StoreResult<ReserveOutcome> {
            self.0.try_reserve(room_type_id).await
        }

        async fn release(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity> {
            self.0.release(room_type_id).await
        }

        async fn capacity(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity> {
            self.0.capacity(room_type_id).await
        }
    }

    #[async_trait]
    impl BookingTransaction for FailingInsertTransaction {
        async fn insert_reservation(&mut self, _reservation: &Reservation) -> StoreResult<()> {
            Err(StoreError::database("disk full"))
        }

        async fn reservations_for(
            &mut self,
            guest_id: GuestId,
            room_type_id: RoomTypeId,
        ) -> StoreResult<Vec<Reservation>> {
            self.0.reservations_for(guest_id, room_type_id).await
        }

        async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
            self.0.update_reservation(reservation).await
        }

        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.0.commit().await
        }

        async fn rollback(self: Box<Self>) -> StoreResult<()> {
            self.0.rollback().await
        }
    }

    #[tokio::test]
    async fn failed_insert_leaves_counter_untouched() {
        let store = InMemoryStore::new();
        let (guest, room_type) = seed(&store, 2, 1).await;
        let engine = ReservationEngine::new(
            Arc::new(store.clone()),
            Arc::new(FailingInsertStore(store.clone())),
        );

        let err = engine
            .create_reservation(&OpContext::background(), request(&guest, &room_type))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Storage(_)));
        let stored = store.get_room_type(room_type.id).await.unwrap().unwrap();
        assert_eq!(stored.reserved(), 1);
        assert!(store.list_reservations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_context_fails_fast() {
        let f = fixture(2, 0).await;
        let ctx = OpContext::with_deadline(Instant::now());

        let err = f
            .engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::DeadlineExceeded);
        assert_eq!(reserved(&f).await, 0);
    }

    #[tokio::test]
    async fn deadline_while_waiting_for_lock_leaves_no_trace() {
        let f = fixture(2, 0).await;

        // Hold the room type lock with an uncommitted transaction.
        let mut holder = f.store.begin().await.unwrap();
        holder.capacity(f.room_type.id).await.unwrap();

        let ctx = OpContext::with_timeout(Duration::from_millis(50));
        let err = f
            .engine
            .create_reservation(&ctx, request(&f.guest, &f.room_type))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::DeadlineExceeded);

        holder.rollback().await.unwrap();
        assert_eq!(reserved(&f).await, 0);
        assert!(f.store.list_reservations().await.unwrap().is_empty());
    }
}
