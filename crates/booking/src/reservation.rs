use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{
    Aggregate, AggregateRoot, AuditFields, DomainError, DomainResult, Entity, GuestId, HotelId,
    ReservationId, RoomTypeId,
};

/// Reservation lifecycle. `Reserved` is entered only through placement;
/// `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Reserved,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "RESERVED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "RESERVED" => Ok(ReservationStatus::Reserved),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown reservation status '{other}'"
            ))),
        }
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open stay window. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayPeriod {
    #[serde(rename = "start_date")]
    start: DateTime<Utc>,
    #[serde(rename = "end_date")]
    end: DateTime<Utc>,
}

impl StayPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::validation(
                "start_date must be before end_date",
            ));
        }
        Ok(Self { start, end })
    }

    /// Window starting at `start` and lasting `length`.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> DomainResult<Self> {
        Self::new(start, start + length)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Aggregate root: Reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    #[serde(rename = "uuid")]
    id: ReservationId,
    #[serde(flatten)]
    audit: AuditFields,
    #[serde(rename = "guest_uuid")]
    guest_id: GuestId,
    #[serde(rename = "hotel_uuid")]
    hotel_id: HotelId,
    #[serde(rename = "roomtype_uuid")]
    room_type_id: RoomTypeId,
    #[serde(flatten)]
    period: StayPeriod,
    status: ReservationStatus,
    #[serde(skip)]
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl Reservation {
    /// Create an empty, not-yet-placed instance.
    pub fn empty(id: ReservationId) -> Self {
        let epoch = DateTime::<Utc>::MIN_UTC;
        let nil = uuid::Uuid::nil();
        Self {
            id,
            audit: AuditFields::new(epoch),
            guest_id: GuestId::from_uuid(nil),
            hotel_id: HotelId::from_uuid(nil),
            room_type_id: RoomTypeId::from_uuid(nil),
            period: StayPeriod {
                start: epoch,
                end: epoch,
            },
            status: ReservationStatus::Reserved,
            version: 0,
            created: false,
        }
    }

    /// Place a new reservation (convenience over `empty` + `execute`).
    pub fn place(cmd: PlaceReservation) -> DomainResult<Self> {
        let mut reservation = Self::empty(cmd.reservation_id);
        reservation.execute(&ReservationCommand::Place(cmd))?;
        Ok(reservation)
    }

    /// Rebuild from a persisted row.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ReservationId,
        audit: AuditFields,
        guest_id: GuestId,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
        period: StayPeriod,
        status: ReservationStatus,
    ) -> Self {
        let version = match status {
            ReservationStatus::Reserved => 1,
            ReservationStatus::Cancelled => 2,
        };
        Self {
            id,
            audit,
            guest_id,
            hotel_id,
            room_type_id,
            period,
            status,
            version,
            created: true,
        }
    }

    /// Transition RESERVED → CANCELLED. Fails with `AlreadyCancelled` on a
    /// cancelled reservation, in which case the caller must not release
    /// inventory again.
    pub fn cancel(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<ReservationCancelled> {
        let events = self.execute(&ReservationCommand::Cancel(CancelReservation {
            reservation_id: self.id,
            occurred_at,
        }))?;
        match events.into_iter().next() {
            Some(ReservationEvent::Cancelled(e)) => Ok(e),
            _ => Err(DomainError::invariant("cancel produced no cancellation event")),
        }
    }

    pub fn id_typed(&self) -> ReservationId {
        self.id
    }

    pub fn guest_id(&self) -> GuestId {
        self.guest_id
    }

    pub fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }

    pub fn room_type_id(&self) -> RoomTypeId {
        self.room_type_id
    }

    pub fn period(&self) -> StayPeriod {
        self.period
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn is_reserved(&self) -> bool {
        self.created && self.status == ReservationStatus::Reserved
    }

    pub fn audit_fields(&self) -> &AuditFields {
        &self.audit
    }
}

impl AggregateRoot for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}

/// Command: PlaceReservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceReservation {
    pub reservation_id: ReservationId,
    pub guest_id: GuestId,
    pub hotel_id: HotelId,
    pub room_type_id: RoomTypeId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelReservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReservation {
    pub reservation_id: ReservationId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationCommand {
    Place(PlaceReservation),
    Cancel(CancelReservation),
}

/// Event: ReservationPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPlaced {
    pub reservation_id: ReservationId,
    pub guest_id: GuestId,
    pub hotel_id: HotelId,
    pub room_type_id: RoomTypeId,
    pub period: StayPeriod,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReservationCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCancelled {
    pub reservation_id: ReservationId,
    pub room_type_id: RoomTypeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationEvent {
    Placed(ReservationPlaced),
    Cancelled(ReservationCancelled),
}

impl ReservationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ReservationEvent::Placed(_) => "booking.reservation.placed",
            ReservationEvent::Cancelled(_) => "booking.reservation.cancelled",
        }
    }
}

impl Aggregate for Reservation {
    type Command = ReservationCommand;
    type Event = ReservationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReservationEvent::Placed(e) => {
                self.id = e.reservation_id;
                self.audit = AuditFields::new(e.occurred_at);
                self.guest_id = e.guest_id;
                self.hotel_id = e.hotel_id;
                self.room_type_id = e.room_type_id;
                self.period = e.period;
                self.status = ReservationStatus::Reserved;
                self.created = true;
            }
            ReservationEvent::Cancelled(e) => {
                self.status = ReservationStatus::Cancelled;
                self.audit.touch(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReservationCommand::Place(cmd) => self.handle_place(cmd),
            ReservationCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Reservation {
    fn ensure_reservation_id(&self, reservation_id: ReservationId) -> Result<(), DomainError> {
        if self.id != reservation_id {
            return Err(DomainError::invariant("reservation_id mismatch"));
        }
        Ok(())
    }

    fn handle_place(&self, cmd: &PlaceReservation) -> Result<Vec<ReservationEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("reservation already exists"));
        }
        self.ensure_reservation_id(cmd.reservation_id)?;
        let period = StayPeriod::new(cmd.start_date, cmd.end_date)?;

        Ok(vec![ReservationEvent::Placed(ReservationPlaced {
            reservation_id: cmd.reservation_id,
            guest_id: cmd.guest_id,
            hotel_id: cmd.hotel_id,
            room_type_id: cmd.room_type_id,
            period,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelReservation) -> Result<Vec<ReservationEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found("reservation"));
        }
        self.ensure_reservation_id(cmd.reservation_id)?;
        if self.status == ReservationStatus::Cancelled {
            return Err(DomainError::AlreadyCancelled);
        }

        Ok(vec![ReservationEvent::Cancelled(ReservationCancelled {
            reservation_id: self.id,
            room_type_id: self.room_type_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
