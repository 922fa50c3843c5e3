//! Store and cache selection.
//!
//! In-memory adapters are the default; `USE_PERSISTENT_STORES=true` switches
//! the entity store to Postgres and, when `REDIS_URL` is set and the `redis`
//! feature is compiled in, the guest cache to Redis.

use std::sync::Arc;

use anyhow::Context;

use innkeep_infra::{
    AppConfig, BookingFacade, GuestCache, InMemoryGuestCache, InMemoryStore, PostgresStore,
};

#[derive(Debug, Clone)]
pub struct AppServices {
    pub facade: BookingFacade,
}

impl AppServices {
    /// Process-local wiring; state is lost on restart.
    pub fn in_memory(config: &AppConfig) -> Self {
        let cache: Arc<dyn GuestCache> = Arc::new(InMemoryGuestCache::new(config.guest_cache_ttl));
        let facade = BookingFacade::new(Arc::new(InMemoryStore::new()), config.request_timeout)
            .with_guest_cache(cache);
        Self { facade }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let Some(db) = &config.database else {
        tracing::info!("using in-memory stores");
        return Ok(AppServices::in_memory(config));
    };

    let store = PostgresStore::connect(&db.url, db.max_connections)
        .await
        .context("failed to connect to postgres")?;
    store.migrate().await.context("failed to run migrations")?;
    tracing::info!(max_connections = db.max_connections, "using postgres store");

    let cache = guest_cache(config).await;
    let facade = BookingFacade::new(Arc::new(store), config.request_timeout).with_guest_cache(cache);
    Ok(AppServices { facade })
}

#[cfg(feature = "redis")]
async fn guest_cache(config: &AppConfig) -> Arc<dyn GuestCache> {
    use innkeep_infra::RedisGuestCache;

    if let Some(url) = &config.redis_url {
        match RedisGuestCache::connect(url, config.guest_cache_ttl).await {
            Ok(cache) => {
                tracing::info!("using redis guest cache");
                return Arc::new(cache);
            }
            Err(e) => tracing::warn!(error = %e, "redis unavailable; falling back to in-memory guest cache"),
        }
    }
    Arc::new(InMemoryGuestCache::new(config.guest_cache_ttl))
}

#[cfg(not(feature = "redis"))]
async fn guest_cache(config: &AppConfig) -> Arc<dyn GuestCache> {
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL set but built without the `redis` feature");
    }
    Arc::new(InMemoryGuestCache::new(config.guest_cache_ttl))
}
