//! Hotel inventory records: hotels, room types, rooms and nightly rates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{
    AuditFields, DomainError, DomainResult, Entity, HotelId, RateId, RoomId, RoomTypeId,
};

use crate::ledger::Capacity;

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Hotel creation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHotel {
    pub name: String,
    pub address: String,
    pub location: String,
}

impl NewHotel {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("address", &self.address)?;
        require_text("location", &self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    #[serde(rename = "uuid")]
    pub id: HotelId,
    #[serde(flatten)]
    pub audit: AuditFields,
    pub name: String,
    pub address: String,
    pub location: String,
}

impl Hotel {
    pub fn new(id: HotelId, input: NewHotel, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id,
            audit: AuditFields::new(now),
            name: input.name.trim().to_string(),
            address: input.address.trim().to_string(),
            location: input.location.trim().to_string(),
        })
    }
}

impl Entity for Hotel {
    type Id = HotelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}

/// Room type creation input. `reserved` seeds the counter (normally 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoomType {
    pub hotel_id: HotelId,
    pub inventory: i64,
    #[serde(default)]
    pub reserved: i64,
}

impl NewRoomType {
    pub fn validate(&self) -> DomainResult<()> {
        Capacity::new(self.inventory, self.reserved).map(|_| ())
    }
}

/// A sellable category of rooms. Owns the inventory/reserved counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomType {
    #[serde(rename = "uuid")]
    pub id: RoomTypeId,
    #[serde(flatten)]
    pub audit: AuditFields,
    #[serde(rename = "hotel_uuid")]
    pub hotel_id: HotelId,
    /// Changed only through the ledger operations of a booking transaction.
    #[serde(flatten)]
    capacity: Capacity,
}

impl RoomType {
    pub fn new(id: RoomTypeId, input: NewRoomType, now: DateTime<Utc>) -> DomainResult<Self> {
        let capacity = Capacity::new(input.inventory, input.reserved)?;
        Ok(Self {
            id,
            audit: AuditFields::new(now),
            hotel_id: input.hotel_id,
            capacity,
        })
    }

    /// Rehydrate a stored row.
    pub fn restore(
        id: RoomTypeId,
        audit: AuditFields,
        hotel_id: HotelId,
        capacity: Capacity,
    ) -> Self {
        Self {
            id,
            audit,
            hotel_id,
            capacity,
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Store a counter produced by the ledger, touching `updated_at` when it
    /// changed.
    pub fn record_capacity(&mut self, capacity: Capacity, now: DateTime<Utc>) {
        if self.capacity != capacity {
            self.capacity = capacity;
            self.audit.touch(now);
        }
    }

    pub fn inventory(&self) -> i64 {
        self.capacity.inventory()
    }

    pub fn reserved(&self) -> i64 {
        self.capacity.reserved()
    }
}

impl Entity for RoomType {
    type Id = RoomTypeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}

/// Room creation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub room_type_id: RoomTypeId,
    pub hotel_id: HotelId,
    #[serde(default)]
    pub available: bool,
}

/// A physical room. `available` is a display hint only; capacity decisions
/// use the room type's counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "uuid")]
    pub id: RoomId,
    #[serde(flatten)]
    pub audit: AuditFields,
    #[serde(rename = "roomtype_uuid")]
    pub room_type_id: RoomTypeId,
    #[serde(rename = "hotel_uuid")]
    pub hotel_id: HotelId,
    pub available: bool,
}

impl Room {
    pub fn new(id: RoomId, input: NewRoom, now: DateTime<Utc>) -> Self {
        Self {
            id,
            audit: AuditFields::new(now),
            room_type_id: input.room_type_id,
            hotel_id: input.hotel_id,
            available: input.available,
        }
    }
}

impl Entity for Room {
    type Id = RoomId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}

/// Rate creation input. Amount in smallest currency unit (e.g., cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRate {
    pub hotel_id: HotelId,
    pub room_type_id: RoomTypeId,
    pub rate: i64,
    pub date: NaiveDate,
}

impl NewRate {
    pub fn validate(&self) -> DomainResult<()> {
        if self.rate < 0 {
            return Err(DomainError::validation("rate cannot be negative"));
        }
        Ok(())
    }
}

/// Nightly price of a room type on a given date. Duplicate (room type, date)
/// entries are stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(rename = "uuid")]
    pub id: RateId,
    #[serde(flatten)]
    pub audit: AuditFields,
    #[serde(rename = "hotel_uuid")]
    pub hotel_id: HotelId,
    #[serde(rename = "roomtype_uuid")]
    pub room_type_id: RoomTypeId,
    pub rate: i64,
    pub date: NaiveDate,
}

impl Rate {
    pub fn new(id: RateId, input: NewRate, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id,
            audit: AuditFields::new(now),
            hotel_id: input.hotel_id,
            room_type_id: input.room_type_id,
            rate: input.rate,
            date: input.date,
        })
    }
}

impl Entity for Rate {
    type Id = RateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}
