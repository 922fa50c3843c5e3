//! Access facade: the single entry point the HTTP layer talks to.
//!
//! Each capability (create / get / delete / transactional booking) is
//! injected as its own trait object. Every call runs under a fresh
//! `OpContext` bounded by the configured request timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as StayLength, Utc};

use innkeep_booking::{
    Capacity, Guest, Hotel, NewGuest, NewHotel, NewRate, NewRoom, NewRoomType, Rate,
    Reservation, Room, RoomType, StayPeriod,
};
use innkeep_core::{GuestId, HotelId, RoomTypeId};

use crate::cache::GuestCache;
use crate::engine::{CreateReservation, EngineError, EngineResult, OpContext, ReservationEngine};
use crate::store::{
    CreateRepository, DeleteRepository, GetRepository, StoreResult, TransactionalRepository,
};

/// Default stay when the caller gives no dates.
pub const DEFAULT_STAY_HOURS: i64 = 72;

#[derive(Clone)]
pub struct BookingFacade {
    creator: Arc<dyn CreateRepository>,
    reader: Arc<dyn GetRepository>,
    deleter: Arc<dyn DeleteRepository>,
    engine: ReservationEngine,
    cache: Option<Arc<dyn GuestCache>>,
    request_timeout: Duration,
}

impl std::fmt::Debug for BookingFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingFacade")
            .field("cached", &self.cache.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl BookingFacade {
    /// Wire every capability from one store.
    pub fn new<S>(store: Arc<S>, request_timeout: Duration) -> Self
    where
        S: CreateRepository + GetRepository + DeleteRepository + TransactionalRepository + 'static,
    {
        Self::from_parts(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            request_timeout,
        )
    }

    pub fn from_parts(
        creator: Arc<dyn CreateRepository>,
        reader: Arc<dyn GetRepository>,
        deleter: Arc<dyn DeleteRepository>,
        transactions: Arc<dyn TransactionalRepository>,
        request_timeout: Duration,
    ) -> Self {
        let engine = ReservationEngine::new(reader.clone(), transactions);
        Self {
            creator,
            reader,
            deleter,
            engine,
            cache: None,
            request_timeout,
        }
    }

    pub fn with_guest_cache(mut self, cache: Arc<dyn GuestCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn context(&self) -> OpContext {
        OpContext::with_timeout(self.request_timeout)
    }

    async fn store_call<T>(&self, op: impl Future<Output = StoreResult<T>>) -> EngineResult<T> {
        self.context()
            .run(async { op.await.map_err(EngineError::from) })
            .await
    }

    // --- guests ---

    pub async fn register_guest(&self, input: NewGuest) -> EngineResult<Guest> {
        let guest = self.store_call(self.creator.create_guest(input)).await?;
        if let Some(cache) = &self.cache {
            cache.set(&guest).await;
        }
        tracing::info!(guest_id = %guest.id, "guest registered");
        Ok(guest)
    }

    /// Cache first, then the store; a store hit refreshes the cache.
    pub async fn guest(&self, id: GuestId) -> EngineResult<Guest> {
        if let Some(cache) = &self.cache {
            if let Some(guest) = cache.get(id).await {
                return Ok(guest);
            }
        }

        let guest = self
            .store_call(self.reader.get_guest(id))
            .await?
            .ok_or_else(|| EngineError::NotFound("guest".to_string()))?;

        if let Some(cache) = &self.cache {
            cache.set(&guest).await;
        }
        Ok(guest)
    }

    pub async fn guests(&self) -> EngineResult<Vec<Guest>> {
        self.store_call(self.reader.list_guests()).await
    }

    pub async fn tombstone_guest(&self, id: GuestId) -> EngineResult<()> {
        self.store_call(self.deleter.tombstone_guest(id)).await?;
        if let Some(cache) = &self.cache {
            cache.remove(id).await;
        }
        Ok(())
    }

    // --- hotel inventory ---

    pub async fn create_hotel(&self, input: NewHotel) -> EngineResult<Hotel> {
        self.store_call(self.creator.create_hotel(input)).await
    }

    pub async fn create_room_type(&self, input: NewRoomType) -> EngineResult<RoomType> {
        self.store_call(self.creator.create_room_type(input)).await
    }

    pub async fn create_room(&self, input: NewRoom) -> EngineResult<Room> {
        self.store_call(self.creator.create_room(input)).await
    }

    pub async fn create_rate(&self, input: NewRate) -> EngineResult<Rate> {
        self.store_call(self.creator.create_rate(input)).await
    }

    pub async fn hotels(&self) -> EngineResult<Vec<Hotel>> {
        self.store_call(self.reader.list_hotels()).await
    }

    pub async fn room_types(&self) -> EngineResult<Vec<RoomType>> {
        self.store_call(self.reader.list_room_types()).await
    }

    pub async fn rooms(&self) -> EngineResult<Vec<Room>> {
        self.store_call(self.reader.list_rooms()).await
    }

    pub async fn rates(&self) -> EngineResult<Vec<Rate>> {
        self.store_call(self.reader.list_rates()).await
    }

    pub async fn room(
        &self,
        room_type_id: RoomTypeId,
        hotel_id: HotelId,
    ) -> EngineResult<Option<Room>> {
        self.store_call(self.reader.get_room(room_type_id, hotel_id)).await
    }

    pub async fn rate(
        &self,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
    ) -> EngineResult<Option<Rate>> {
        self.store_call(self.reader.get_rate(hotel_id, room_type_id)).await
    }

    pub async fn tombstone_hotel(&self, id: HotelId) -> EngineResult<()> {
        self.store_call(self.deleter.tombstone_hotel(id)).await
    }

    pub async fn tombstone_room_type(&self, id: RoomTypeId) -> EngineResult<()> {
        self.store_call(self.deleter.tombstone_room_type(id)).await
    }

    pub async fn capacity(&self, room_type_id: RoomTypeId) -> EngineResult<Capacity> {
        self.engine.capacity(&self.context(), room_type_id).await
    }

    // --- reservations ---

    /// Book starting now for the default stay length.
    pub async fn book(
        &self,
        guest_id: GuestId,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
    ) -> EngineResult<Reservation> {
        let period = StayPeriod::starting_at(Utc::now(), StayLength::hours(DEFAULT_STAY_HOURS))?;
        self.book_period(CreateReservation {
            guest_id,
            hotel_id,
            room_type_id,
            start_date: period.start(),
            end_date: period.end(),
        })
        .await
    }

    pub async fn book_period(&self, request: CreateReservation) -> EngineResult<Reservation> {
        self.engine.create_reservation(&self.context(), request).await
    }

    pub async fn cancel(
        &self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> EngineResult<Reservation> {
        self.engine
            .cancel_reservation(&self.context(), guest_id, room_type_id)
            .await
    }

    pub async fn latest_reservation(
        &self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> EngineResult<Option<Reservation>> {
        self.store_call(self.reader.get_reservation(guest_id, room_type_id)).await
    }

    pub async fn reservations(&self) -> EngineResult<Vec<Reservation>> {
        self.store_call(self.reader.list_reservations()).await
    }
}
