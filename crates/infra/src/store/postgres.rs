//! Postgres-backed entity store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (check constraint violation) | `23514` | `Invalid` |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | N/A | `Database` |
//!
//! ## Capacity
//!
//! `try_reserve` is a single conditional `UPDATE ... WHERE reserved < inventory`
//! inside the booking transaction. The row lock it takes serializes concurrent
//! reservations for the same room type until the transaction ends.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use async_trait::async_trait;

use innkeep_booking::{
    Capacity, DenyReason, Email, Guest, Hotel, NewGuest, NewHotel, NewRate, NewRoom,
    NewRoomType, Rate, Reservation, ReservationStatus, ReserveOutcome, Room, RoomType, StayPeriod,
};
use innkeep_core::{AuditFields, GuestId, HotelId, RateId, ReservationId, RoomId, RoomTypeId};

use super::{
    BookingTransaction, CreateRepository, DeleteRepository, GetRepository, InventoryLedger,
    StoreError, StoreResult, TransactionalRepository,
};

const GUEST_COLUMNS: &str =
    "uuid, active, created_at, updated_at, deleted_at, first_name, last_name, email, age";
const HOTEL_COLUMNS: &str =
    "uuid, active, created_at, updated_at, deleted_at, name, address, location";
const ROOM_TYPE_COLUMNS: &str =
    "uuid, active, created_at, updated_at, deleted_at, hotel_uuid, inventory, reserved";
const ROOM_COLUMNS: &str =
    "uuid, active, created_at, updated_at, deleted_at, roomtype_uuid, hotel_uuid, available";
const RATE_COLUMNS: &str =
    "uuid, active, created_at, updated_at, deleted_at, hotel_uuid, roomtype_uuid, rate, date";
const RESERVATION_COLUMNS: &str = "uuid, active, created_at, updated_at, deleted_at, \
     guest_uuid, hotel_uuid, roomtype_uuid, start_date, end_date, status";

/// Postgres entity store. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::database(format!("migration failed: {e}")))
    }

    async fn tombstone(&self, table: &'static str, id: Uuid, what: &str) -> StoreResult<()> {
        let sql = format!(
            "UPDATE {table} SET active = FALSE, deleted_at = COALESCE(deleted_at, $2), \
             updated_at = $2 WHERE uuid = $1"
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("tombstone", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(what));
        }
        Ok(())
    }
}

#[async_trait]
impl CreateRepository for PostgresStore {
    #[instrument(skip(self, guest), err)]
    async fn create_guest(&self, guest: NewGuest) -> StoreResult<Guest> {
        let guest = Guest::register(GuestId::new(), guest, Utc::now())?;
        let age = i32::try_from(guest.age)
            .map_err(|_| StoreError::Invalid("age out of range".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO guests (uuid, active, created_at, updated_at, deleted_at,
                                first_name, last_name, email, age)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*guest.id.as_uuid())
        .bind(guest.audit.active)
        .bind(guest.audit.created_at)
        .bind(guest.audit.updated_at)
        .bind(guest.audit.deleted_at)
        .bind(&guest.first_name)
        .bind(&guest.last_name)
        .bind(guest.email.as_str())
        .bind(age)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_guest", e))?;

        Ok(guest)
    }

    #[instrument(skip(self, hotel), err)]
    async fn create_hotel(&self, hotel: NewHotel) -> StoreResult<Hotel> {
        let hotel = Hotel::new(HotelId::new(), hotel, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO hotels (uuid, active, created_at, updated_at, deleted_at,
                                name, address, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*hotel.id.as_uuid())
        .bind(hotel.audit.active)
        .bind(hotel.audit.created_at)
        .bind(hotel.audit.updated_at)
        .bind(hotel.audit.deleted_at)
        .bind(&hotel.name)
        .bind(&hotel.address)
        .bind(&hotel.location)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_hotel", e))?;

        Ok(hotel)
    }

    #[instrument(skip(self, room_type), fields(hotel_id = %room_type.hotel_id), err)]
    async fn create_room_type(&self, room_type: NewRoomType) -> StoreResult<RoomType> {
        let room_type = RoomType::new(RoomTypeId::new(), room_type, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO room_types (uuid, active, created_at, updated_at, deleted_at,
                                    hotel_uuid, inventory, reserved)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*room_type.id.as_uuid())
        .bind(room_type.audit.active)
        .bind(room_type.audit.created_at)
        .bind(room_type.audit.updated_at)
        .bind(room_type.audit.deleted_at)
        .bind(*room_type.hotel_id.as_uuid())
        .bind(room_type.inventory())
        .bind(room_type.reserved())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_room_type", e))?;

        Ok(room_type)
    }

    #[instrument(skip(self, room), fields(room_type_id = %room.room_type_id), err)]
    async fn create_room(&self, room: NewRoom) -> StoreResult<Room> {
        let room = Room::new(RoomId::new(), room, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO rooms (uuid, active, created_at, updated_at, deleted_at,
                               roomtype_uuid, hotel_uuid, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*room.id.as_uuid())
        .bind(room.audit.active)
        .bind(room.audit.created_at)
        .bind(room.audit.updated_at)
        .bind(room.audit.deleted_at)
        .bind(*room.room_type_id.as_uuid())
        .bind(*room.hotel_id.as_uuid())
        .bind(room.available)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_room", e))?;

        Ok(room)
    }

    #[instrument(skip(self, rate), fields(room_type_id = %rate.room_type_id), err)]
    async fn create_rate(&self, rate: NewRate) -> StoreResult<Rate> {
        let rate = Rate::new(RateId::new(), rate, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO rates (uuid, active, created_at, updated_at, deleted_at,
                               hotel_uuid, roomtype_uuid, rate, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*rate.id.as_uuid())
        .bind(rate.audit.active)
        .bind(rate.audit.created_at)
        .bind(rate.audit.updated_at)
        .bind(rate.audit.deleted_at)
        .bind(*rate.hotel_id.as_uuid())
        .bind(*rate.room_type_id.as_uuid())
        .bind(rate.rate)
        .bind(rate.date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_rate", e))?;

        Ok(rate)
    }
}

#[async_trait]
impl GetRepository for PostgresStore {
    #[instrument(skip(self), fields(guest_id = %id), err)]
    async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>> {
        let sql = format!("SELECT {GUEST_COLUMNS} FROM guests WHERE uuid = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_guest", e))?;
        row.as_ref().map(guest_from_row).transpose()
    }

    #[instrument(skip(self), fields(hotel_id = %id), err)]
    async fn get_hotel(&self, id: HotelId) -> StoreResult<Option<Hotel>> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE uuid = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_hotel", e))?;
        row.as_ref().map(hotel_from_row).transpose()
    }

    #[instrument(skip(self), fields(room_type_id = %id), err)]
    async fn get_room_type(&self, id: RoomTypeId) -> StoreResult<Option<RoomType>> {
        let sql = format!(
            "SELECT {ROOM_TYPE_COLUMNS} FROM room_types WHERE uuid = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_room_type", e))?;
        row.as_ref().map(room_type_from_row).transpose()
    }

    #[instrument(skip(self), fields(room_type_id = %room_type_id, hotel_id = %hotel_id), err)]
    async fn get_room(
        &self,
        room_type_id: RoomTypeId,
        hotel_id: HotelId,
    ) -> StoreResult<Option<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms \
             WHERE roomtype_uuid = $1 AND hotel_uuid = $2 AND deleted_at IS NULL \
             ORDER BY created_at LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(*room_type_id.as_uuid())
            .bind(*hotel_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_room", e))?;
        row.as_ref().map(room_from_row).transpose()
    }

    #[instrument(skip(self), fields(hotel_id = %hotel_id, room_type_id = %room_type_id), err)]
    async fn get_rate(
        &self,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Option<Rate>> {
        let sql = format!(
            "SELECT {RATE_COLUMNS} FROM rates \
             WHERE hotel_uuid = $1 AND roomtype_uuid = $2 AND deleted_at IS NULL \
             ORDER BY created_at LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(*hotel_id.as_uuid())
            .bind(*room_type_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_rate", e))?;
        row.as_ref().map(rate_from_row).transpose()
    }

    #[instrument(skip(self), fields(guest_id = %guest_id, room_type_id = %room_type_id), err)]
    async fn get_reservation(
        &self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE guest_uuid = $1 AND roomtype_uuid = $2 AND deleted_at IS NULL \
             ORDER BY created_at DESC, uuid DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(*guest_id.as_uuid())
            .bind(*room_type_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_reservation", e))?;
        row.as_ref().map(reservation_from_row).transpose()
    }

    async fn list_guests(&self) -> StoreResult<Vec<Guest>> {
        let sql = format!("SELECT {GUEST_COLUMNS} FROM guests WHERE deleted_at IS NULL ORDER BY created_at");
        self.list(&sql, "list_guests", guest_from_row).await
    }

    async fn list_hotels(&self) -> StoreResult<Vec<Hotel>> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE deleted_at IS NULL ORDER BY created_at");
        self.list(&sql, "list_hotels", hotel_from_row).await
    }

    async fn list_room_types(&self) -> StoreResult<Vec<RoomType>> {
        let sql = format!(
            "SELECT {ROOM_TYPE_COLUMNS} FROM room_types WHERE deleted_at IS NULL ORDER BY created_at"
        );
        self.list(&sql, "list_room_types", room_type_from_row).await
    }

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE deleted_at IS NULL ORDER BY created_at");
        self.list(&sql, "list_rooms", room_from_row).await
    }

    async fn list_rates(&self) -> StoreResult<Vec<Rate>> {
        let sql = format!("SELECT {RATE_COLUMNS} FROM rates WHERE deleted_at IS NULL ORDER BY created_at");
        self.list(&sql, "list_rates", rate_from_row).await
    }

    async fn list_reservations(&self) -> StoreResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE deleted_at IS NULL ORDER BY created_at"
        );
        self.list(&sql, "list_reservations", reservation_from_row).await
    }
}

impl PostgresStore {
    async fn list<T>(
        &self,
        sql: &str,
        operation: &str,
        decode: fn(&PgRow) -> StoreResult<T>,
    ) -> StoreResult<Vec<T>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter().map(decode).collect()
    }
}

#[async_trait]
impl DeleteRepository for PostgresStore {
    #[instrument(skip(self), fields(guest_id = %id), err)]
    async fn tombstone_guest(&self, id: GuestId) -> StoreResult<()> {
        self.tombstone("guests", *id.as_uuid(), "guest").await
    }

    #[instrument(skip(self), fields(hotel_id = %id), err)]
    async fn tombstone_hotel(&self, id: HotelId) -> StoreResult<()> {
        self.tombstone("hotels", *id.as_uuid(), "hotel").await
    }

    #[instrument(skip(self), fields(room_type_id = %id), err)]
    async fn tombstone_room_type(&self, id: RoomTypeId) -> StoreResult<()> {
        self.tombstone("room_types", *id.as_uuid(), "room type").await
    }
}

#[async_trait]
impl TransactionalRepository for PostgresStore {
    async fn begin(&self) -> StoreResult<Box<dyn BookingTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// A booking unit over one database transaction. Dropping it without
/// `commit` rolls back.
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    /// Row-lock the room type so reads that follow see a stable counter.
    async fn lock_room_type(&mut self, room_type_id: RoomTypeId) -> StoreResult<Option<Capacity>> {
        let row = sqlx::query(
            "SELECT inventory, reserved FROM room_types WHERE uuid = $1 FOR UPDATE",
        )
        .bind(*room_type_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lock_room_type", e))?;
        row.as_ref().map(capacity_from_row).transpose()
    }
}

#[async_trait]
impl InventoryLedger for PostgresTransaction {
    #[instrument(skip(self), fields(room_type_id = %room_type_id), err)]
    async fn try_reserve(&mut self, room_type_id: RoomTypeId) -> StoreResult<ReserveOutcome> {
        let row = sqlx::query(
            r#"
            UPDATE room_types
               SET reserved = reserved + 1, updated_at = $2
             WHERE uuid = $1 AND deleted_at IS NULL AND reserved < inventory
            RETURNING inventory, reserved
            "#,
        )
        .bind(*room_type_id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("try_reserve", e))?;

        if let Some(row) = row {
            return Ok(ReserveOutcome::Reserved(capacity_from_row(&row)?));
        }

        // No row updated: either the room type is gone or it is full.
        let row = sqlx::query(
            "SELECT inventory, reserved FROM room_types WHERE uuid = $1 AND deleted_at IS NULL",
        )
        .bind(*room_type_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("try_reserve", e))?;

        match row {
            Some(row) => Ok(ReserveOutcome::Denied {
                reason: DenyReason::AtCapacity,
                capacity: capacity_from_row(&row)?,
            }),
            None => Err(StoreError::not_found("room type")),
        }
    }

    #[instrument(skip(self), fields(room_type_id = %room_type_id), err)]
    async fn release(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity> {
        let row = sqlx::query(
            r#"
            UPDATE room_types
               SET reserved = GREATEST(reserved - 1, 0), updated_at = $2
             WHERE uuid = $1
            RETURNING inventory, reserved
            "#,
        )
        .bind(*room_type_id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("release", e))?;

        match row {
            Some(row) => capacity_from_row(&row),
            None => Err(StoreError::not_found("room type")),
        }
    }

    async fn capacity(&mut self, room_type_id: RoomTypeId) -> StoreResult<Capacity> {
        let row = sqlx::query(
            "SELECT inventory, reserved FROM room_types WHERE uuid = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(*room_type_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("capacity", e))?;

        match row {
            Some(row) => capacity_from_row(&row),
            None => Err(StoreError::not_found("room type")),
        }
    }
}

#[async_trait]
impl BookingTransaction for PostgresTransaction {
    #[instrument(skip(self, reservation), fields(reservation_id = %reservation.id_typed()), err)]
    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        let audit = reservation.audit_fields();
        let period = reservation.period();

        sqlx::query(
            r#"
            INSERT INTO reservations (uuid, active, created_at, updated_at, deleted_at,
                                      guest_uuid, hotel_uuid, roomtype_uuid,
                                      start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*reservation.id_typed().as_uuid())
        .bind(audit.active)
        .bind(audit.created_at)
        .bind(audit.updated_at)
        .bind(audit.deleted_at)
        .bind(*reservation.guest_id().as_uuid())
        .bind(*reservation.hotel_id().as_uuid())
        .bind(*reservation.room_type_id().as_uuid())
        .bind(period.start())
        .bind(period.end())
        .bind(reservation.status().as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_reservation", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(guest_id = %guest_id, room_type_id = %room_type_id), err)]
    async fn reservations_for(
        &mut self,
        guest_id: GuestId,
        room_type_id: RoomTypeId,
    ) -> StoreResult<Vec<Reservation>> {
        self.lock_room_type(room_type_id).await?;

        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE guest_uuid = $1 AND roomtype_uuid = $2 AND deleted_at IS NULL \
             ORDER BY created_at"
        );
        let rows = sqlx::query(&sql)
            .bind(*guest_id.as_uuid())
            .bind(*room_type_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("reservations_for", e))?;
        rows.iter().map(reservation_from_row).collect()
    }

    #[instrument(skip(self, reservation), fields(reservation_id = %reservation.id_typed()), err)]
    async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        let audit = reservation.audit_fields();
        let result = sqlx::query(
            r#"
            UPDATE reservations
               SET status = $2, updated_at = $3, active = $4, deleted_at = $5
             WHERE uuid = $1
            "#,
        )
        .bind(*reservation.id_typed().as_uuid())
        .bind(reservation.status().as_str())
        .bind(audit.updated_at)
        .bind(audit.active)
        .bind(audit.deleted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_reservation", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("reservation"));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::database(format!("failed to decode column {name}: {e}")))
}

fn audit_from_row(row: &PgRow) -> StoreResult<AuditFields> {
    Ok(AuditFields {
        active: column(row, "active")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
        deleted_at: column::<Option<DateTime<Utc>>>(row, "deleted_at")?,
    })
}

fn capacity_from_row(row: &PgRow) -> StoreResult<Capacity> {
    Ok(Capacity::new(column(row, "inventory")?, column(row, "reserved")?)?)
}

fn guest_from_row(row: &PgRow) -> StoreResult<Guest> {
    let email: String = column(row, "email")?;
    let age: i32 = column(row, "age")?;
    Ok(Guest {
        id: GuestId::from_uuid(column(row, "uuid")?),
        audit: audit_from_row(row)?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        email: Email::parse(&email)?,
        age: u32::try_from(age)
            .map_err(|_| StoreError::database(format!("negative age {age} in guests")))?,
    })
}

fn hotel_from_row(row: &PgRow) -> StoreResult<Hotel> {
    Ok(Hotel {
        id: HotelId::from_uuid(column(row, "uuid")?),
        audit: audit_from_row(row)?,
        name: column(row, "name")?,
        address: column(row, "address")?,
        location: column(row, "location")?,
    })
}

fn room_type_from_row(row: &PgRow) -> StoreResult<RoomType> {
    Ok(RoomType::restore(
        RoomTypeId::from_uuid(column(row, "uuid")?),
        audit_from_row(row)?,
        HotelId::from_uuid(column(row, "hotel_uuid")?),
        capacity_from_row(row)?,
    ))
}

fn room_from_row(row: &PgRow) -> StoreResult<Room> {
    Ok(Room {
        id: RoomId::from_uuid(column(row, "uuid")?),
        audit: audit_from_row(row)?,
        room_type_id: RoomTypeId::from_uuid(column(row, "roomtype_uuid")?),
        hotel_id: HotelId::from_uuid(column(row, "hotel_uuid")?),
        available: column(row, "available")?,
    })
}

fn rate_from_row(row: &PgRow) -> StoreResult<Rate> {
    Ok(Rate {
        id: RateId::from_uuid(column(row, "uuid")?),
        audit: audit_from_row(row)?,
        hotel_id: HotelId::from_uuid(column(row, "hotel_uuid")?),
        room_type_id: RoomTypeId::from_uuid(column(row, "roomtype_uuid")?),
        rate: column(row, "rate")?,
        date: column::<NaiveDate>(row, "date")?,
    })
}

fn reservation_from_row(row: &PgRow) -> StoreResult<Reservation> {
    let status: String = column(row, "status")?;
    let period = StayPeriod::new(column(row, "start_date")?, column(row, "end_date")?)?;
    Ok(Reservation::restore(
        ReservationId::from_uuid(column(row, "uuid")?),
        audit_from_row(row)?,
        GuestId::from_uuid(column(row, "guest_uuid")?),
        HotelId::from_uuid(column(row, "hotel_uuid")?),
        RoomTypeId::from_uuid(column(row, "roomtype_uuid")?),
        period,
        ReservationStatus::parse(&status)?,
    ))
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound(format!("referenced record ({msg})")),
                Some("23514") => StoreError::Invalid(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        other => StoreError::Database(format!("{operation}: {other}")),
    }
}
