use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

use innkeep_booking::{
    Capacity, Guest, Hotel, NewGuest, NewHotel, NewRate, NewRoom, NewRoomType, Rate,
    Reservation, ReserveOutcome, Room, RoomType,
};
use innkeep_core::{Entity, GuestId, HotelId, RateId, ReservationId, RoomId, RoomTypeId};

use super::{
    BookingTransaction, CreateRepository, DeleteRepository, GetRepository, InventoryLedger,
    StoreError, StoreResult, TransactionalRepository,
};

#[derive(Debug, Default)]
struct Tables {
    guests: HashMap<GuestId, Guest>,
    hotels: HashMap<HotelId, Hotel>,
    room_types: HashMap<RoomTypeId, RoomType>,
    rooms: Vec<Room>,
    rates: Vec<Rate>,
    /// Creation order.
    reservations: Vec<Reservation>,
}

impl Tables {
    fn live_hotel(&self, id: HotelId) -> StoreResult<&Hotel> {
        self.hotels
            .get(&id)
            .filter(|h| h.is_live())
            .ok_or_else(|| StoreError::not_found("hotel"))
    }

    fn live_room_type(&self, id: RoomTypeId) -> StoreResult<&RoomType> {
        self.room_types
            .get(&id)
            .filter(|rt| rt.is_live())
            .ok_or_else(|| StoreError::not_found("room type"))
    }
}

/// In-memory entity store.
///
/// Intended for tests/dev. Cheap to clone; clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    room_type_locks: Arc<Mutex<HashMap<RoomTypeId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn room_type_lock(&self, id: RoomTypeId) -> StoreResult<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .room_type_locks
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(locks.entry(id).or_default().clone())
    }
}

#[async_trait]
impl CreateRepository for InMemoryStore {
    async fn create_guest(&self, guest: NewGuest) -> StoreResult<Guest> {
        let guest = Guest::register(GuestId::new(), guest, Utc::now())?;

        let mut tables = self.write()?;
        let taken = tables
            .guests
            .values()
            .any(|g| g.is_live() && g.email == guest.email);
        if taken {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                guest.email
            )));
        }

        tables.guests.insert(guest.id, guest.clone());
        Ok(guest)
    }

    async fn create_hotel(&self, hotel: NewHotel) -> StoreResult<Hotel> {
        let hotel = Hotel::new(HotelId::new(), hotel, Utc::now())?;
        self.write()?.hotels.insert(hotel.id, hotel.clone());
        Ok(hotel)
    }

    async fn create_room_type(&self, room_type: NewRoomType) -> StoreResult<RoomType> {
        let room_type = RoomType::new(RoomTypeId::new(), room_type, Utc::now())?;

        let mut tables = self.write()?;
        tables.live_hotel(room_type.hotel_id)?;
        tables.room_types.insert(room_type.id, room_type.clone());
        Ok(room_type)
    }

    async fn create_room(&self, room: NewRoom) -> StoreResult<Room> {
        let room = Room::new(RoomId::new(), room, Utc::now());

        let mut tables = self.write()?;
        tables.live_hotel(room.hotel_id)?;
        tables.live_room_type(room.room_type_id)?;
        tables.rooms.push(room.clone());
        Ok(room)
    }

    async fn create_rate(&self, rate: NewRate) -> StoreResult<Rate> {
        let rate = Rate::new(RateId::new(), rate, Utc::now())?;

        let mut tables = self.write()?;
        tables.live_hotel(rate.hotel_id)?;
        tables.live_room_type(rate.room_type_id)?;
        tables.rates.push(rate.clone());
        Ok(rate)
    }
}

#[async_trait]
impl GetRepository for InMemoryStore {
    async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>> {
        Ok(self.read()?.guests.get(&id).filter(|g| g.is_live()).cloned())
    }

    async fn get_hotel(&self, id: HotelId) -> StoreResult<Option<Hotel>> {
        Ok(self.read()?.hotels.get(&id).filter(|h| h.is_live()).cloned())
    }

    async fn get_room_type(&self, id: RoomTypeId) -> StoreResult<Option<RoomType>> {
        Ok(self
            .read()?
            .room_types
            .get(&id)
            .filter(|rt| rt.is_live())
            .cloned())
    }

    async fn get_room(
        &self,
        room_type_id: RoomTypeId,
        hotel_id: HotelId,
    ) -> StoreResult<Option<Room>> {
        Ok(self
            .read()?
            .rooms
            .iter()
            .find(|r| r.is_live() && r.room_type_id == room_type_id && r.hotel_id == hotel_id)
            .cloned())
    }

    async fn get_rate(
        &self,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Option<Rate>> {
        Ok(self
            .read()?
            .rates
            .iter()
            .find(|r| r.is_live() && r.hotel_id == hotel_id && r.room_type_id == room_type_id)
            .cloned())
    }

    async fn get_reservation(
        &self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Option<Reservation>> {
        Ok(self
            .read()?
            .reservations
            .iter()
            .rev()
            .find(|r| {
                r.is_live() && r.guest_id() == guest_id && r.room_type_id() == room_type_id
            })
            .cloned())
    }

    async fn list_guests(&self) -> StoreResult<Vec<Guest>> {
        let tables = self.read()?;
        let mut out: Vec<Guest> = tables.guests.values().filter(|g| g.is_live()).cloned().collect();
        out.sort_by_key(|g| g.audit.created_at);
        Ok(out)
    }

    async fn list_hotels(&self) -> StoreResult<Vec<Hotel>> {
        let tables = self.read()?;
        let mut out: Vec<Hotel> = tables.hotels.values().filter(|h| h.is_live()).cloned().collect();
        out.sort_by_key(|h| h.audit.created_at);
        Ok(out)
    }

    async fn list_room_types(&self) -> StoreResult<Vec<RoomType>> {
        let tables = self.read()?;
        let mut out: Vec<RoomType> = tables
            .room_types
            .values()
            .filter(|rt| rt.is_live())
            .cloned()
            .collect();
        out.sort_by_key(|rt| rt.audit.created_at);
        Ok(out)
    }

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        Ok(self.read()?.rooms.iter().filter(|r| r.is_live()).cloned().collect())
    }

    async fn list_rates(&self) -> StoreResult<Vec<Rate>> {
        Ok(self.read()?.rates.iter().filter(|r| r.is_live()).cloned().collect())
    }

    async fn list_reservations(&self) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .read()?
            .reservations
            .iter()
            .filter(|r| r.is_live())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DeleteRepository for InMemoryStore {
    async fn tombstone_guest(&self, id: GuestId) -> StoreResult<()> {
        let mut tables = self.write()?;
        let guest = tables
            .guests
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("guest"))?;
        guest.audit.tombstone(Utc::now());
        Ok(())
    }

    async fn tombstone_hotel(&self, id: HotelId) -> StoreResult<()> {
        let mut tables = self.write()?;
        let hotel = tables
            .hotels
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("hotel"))?;
        hotel.audit.tombstone(Utc::now());
        Ok(())
    }

    async fn tombstone_room_type(&self, id: RoomTypeId) -> StoreResult<()> {
        let mut tables = self.write()?;
        let room_type = tables
            .room_types
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("room type"))?;
        room_type.audit.tombstone(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl TransactionalRepository for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn BookingTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            store: self.clone(),
            guards: HashMap::new(),
            counters: HashMap::new(),
            inserts: Vec::new(),
            updates: HashMap::new(),
        }))
    }
}

/// Staged booking writes plus the room type locks taken so far.
///
/// Nothing reaches the shared tables until `commit`. Guards are released when
/// the transaction is dropped.
struct InMemoryTransaction {
    store: InMemoryStore,
    guards: HashMap<RoomTypeId, OwnedMutexGuard<()>>,
    counters: HashMap<RoomTypeId, Capacity>,
    inserts: Vec<Reservation>,
    updates: HashMap<ReservationId, Reservation>,
}

impl InMemoryTransaction {
    async fn lock(&mut self, room_type_id: RoomTypeId) -> StoreResult<()> {
        if self.guards.contains_key(&room_type_id) {
            return Ok(());
        }
        let mutex = self.store.room_type_lock(room_type_id)?;
        let guard = mutex.lock_owned().await;
        self.guards.insert(room_type_id, guard);
        Ok(())
    }

    /// Current counter for a locked room type, staged value first. Tombstoned
    /// room types still release units held by earlier reservations.
    fn counter(&self, room_type_id: RoomTypeId) -> StoreResult<Capacity> {
        if let Some(capacity) = self.counters.get(&room_type_id) {
            return Ok(*capacity);
        }
        let tables = self.store.read()?;
        tables
            .room_types
            .get(&room_type_id)
            .map(RoomType::capacity)
            .ok_or_else(|| StoreError::not_found("room type"))
    }

    fn ensure_live(&self, room_type_id: RoomTypeId) -> StoreResult<()> {
        self.store.read()?.live_room_type(room_type_id).map(|_| ())
    }
}

#[async_trait]
impl InventoryLedger for InMemoryTransaction {
    async fn try_reserve(&mut self, room_type_id: RoomTypeId) -> StoreResult<ReserveOutcome> {
        self.lock(room_type_id).await?;
        self.ensure_live(room_type_id)?;
        let mut capacity = self.counter(room_type_id)?;
        let outcome = capacity.try_reserve();
        self.counters.insert(room_type_id, capacity);
        Ok(outcome)
    }

    async fn release(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity> {
        self.lock(room_type_id).await?;
        let mut capacity = self.counter(room_type_id)?;
        capacity.release();
        self.counters.insert(room_type_id, capacity);
        Ok(capacity)
    }

    async fn capacity(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity> {
        self.lock(room_type_id).await?;
        self.ensure_live(room_type_id)?;
        self.counter(room_type_id)
    }
}

#[async_trait]
impl BookingTransaction for InMemoryTransaction {
    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        let id = reservation.id_typed();
        let exists = self.inserts.iter().any(|r| r.id_typed() == id)
            || self
                .store
                .read()?
                .reservations
                .iter()
                .any(|r| r.id_typed() == id);
        if exists {
            return Err(StoreError::Conflict(format!("reservation {id} already exists")));
        }
        self.inserts.push(reservation.clone());
        Ok(())
    }

    async fn reservations_for(
        &mut self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Vec<Reservation>> {
        self.lock(room_type_id).await?;

        let committed: Vec<Reservation> = self.store.read()?.reservations.clone();
        let matches = committed
            .into_iter()
            .chain(self.inserts.iter().cloned())
            .map(|r| self.updates.get(&r.id_typed()).cloned().unwrap_or(r))
            .filter(|r| {
                r.is_live() && r.guest_id() == guest_id && r.room_type_id() == room_type_id
            })
            .collect();
        Ok(matches)
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        let id = reservation.id_typed();
        if let Some(staged) = self.inserts.iter_mut().find(|r| r.id_typed() == id) {
            *staged = reservation.clone();
            return Ok(());
        }
        let known = self
            .store
            .read()?
            .reservations
            .iter()
            .any(|r| r.id_typed() == id);
        if !known {
            return Err(StoreError::not_found("reservation"));
        }
        self.updates.insert(id, reservation.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        let now = Utc::now();
        {
            let mut tables = this.store.write()?;
            for (room_type_id, capacity) in &this.counters {
                let room_type = tables
                    .room_types
                    .get_mut(room_type_id)
                    .ok_or_else(|| StoreError::not_found("room type"))?;
                room_type.record_capacity(*capacity, now);
            }
            for reservation in tables.reservations.iter_mut() {
                if let Some(updated) = this.updates.get(&reservation.id_typed()) {
                    *reservation = updated.clone();
                }
            }
            tables.reservations.extend(this.inserts);
        }
        drop(this.guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
