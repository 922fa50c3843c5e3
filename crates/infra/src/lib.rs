//! Infrastructure layer: entity store adapters, guest cache, configuration,
//! the reservation engine and the access facade.

pub mod cache;
pub mod config;
pub mod engine;
pub mod facade;
pub mod store;

pub use cache::{GuestCache, InMemoryGuestCache};
#[cfg(feature = "redis")]
pub use cache::RedisGuestCache;
pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use engine::{CreateReservation, EngineError, EngineResult, OpContext, ReservationEngine};
pub use facade::BookingFacade;
pub use store::{InMemoryStore, PostgresStore, StoreError, StoreResult};
