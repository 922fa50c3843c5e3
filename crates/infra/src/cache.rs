//! Read-through guest cache.
//!
//! The cache is never authoritative: a miss or a backend failure falls back to
//! the entity store. Backend failures are logged and swallowed.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use innkeep_booking::Guest;
use innkeep_core::GuestId;

#[async_trait]
pub trait GuestCache: Send + Sync {
    /// Store `guest` under its id with the configured expiry.
    async fn set(&self, guest: &Guest);

    /// A cached copy, or `None` if absent or expired.
    async fn get(&self, id: GuestId) -> Option<Guest>;

    /// Drop a cached entry (after tombstoning).
    async fn remove(&self, id: GuestId);
}

fn cache_key(id: GuestId) -> String {
    format!("guest:{id}")
}

/// Process-local cache with per-entry expiry. Intended for tests/dev.
#[derive(Debug)]
pub struct InMemoryGuestCache {
    ttl: Duration,
    entries: RwLock<HashMap<GuestId, (Guest, Instant)>>,
}

impl InMemoryGuestCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GuestCache for InMemoryGuestCache {
    async fn set(&self, guest: &Guest) {
        let expires_at = Instant::now() + self.ttl;
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(guest.id, (guest.clone(), expires_at));
            }
            Err(_) => tracing::warn!(key = %cache_key(guest.id), "guest cache lock poisoned"),
        }
    }

    async fn get(&self, id: GuestId) -> Option<Guest> {
        let now = Instant::now();
        {
            let entries = self.entries.read().ok()?;
            let (guest, expires_at) = entries.get(&id)?;
            if now < *expires_at {
                return Some(guest.clone());
            }
        }

        // Expired: evict, unless a concurrent `set` refreshed it meanwhile.
        let mut entries = self.entries.write().ok()?;
        if entries.get(&id).is_some_and(|(_, expires_at)| now >= *expires_at) {
            entries.remove(&id);
        }
        None
    }

    async fn remove(&self, id: GuestId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(&id);
        }
    }
}

#[cfg(feature = "redis")]
pub use redis_cache::RedisGuestCache;

#[cfg(feature = "redis")]
mod redis_cache {
    use std::time::Duration;

    use async_trait::async_trait;
    use redis::aio::ConnectionManager;

    use innkeep_booking::Guest;
    use innkeep_core::GuestId;

    use super::{cache_key, GuestCache};

    /// Redis-backed guest cache. Values are JSON with `SET ... EX`.
    #[derive(Clone)]
    pub struct RedisGuestCache {
        conn: ConnectionManager,
        ttl: Duration,
    }

    impl RedisGuestCache {
        pub async fn connect(redis_url: &str, ttl: Duration) -> redis::RedisResult<Self> {
            let client = redis::Client::open(redis_url)?;
            let conn = ConnectionManager::new(client).await?;
            Ok(Self { conn, ttl })
        }
    }

    #[async_trait]
    impl GuestCache for RedisGuestCache {
        async fn set(&self, guest: &Guest) {
            let key = cache_key(guest.id);
            let payload = match serde_json::to_string(guest) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "failed to encode guest for cache");
                    return;
                }
            };

            let mut conn = self.conn.clone();
            let result: redis::RedisResult<()> = redis::cmd("SET")
                .arg(&key)
                .arg(payload)
                .arg("EX")
                .arg(self.ttl.as_secs().max(1))
                .query_async(&mut conn)
                .await;
            if let Err(e) = result {
                tracing::warn!(%key, error = %e, "guest cache write failed");
            }
        }

        async fn get(&self, id: GuestId) -> Option<Guest> {
            let key = cache_key(id);
            let mut conn = self.conn.clone();
            let raw: Option<String> = match redis::cmd("GET").arg(&key).query_async(&mut conn).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "guest cache read failed");
                    return None;
                }
            };

            match serde_json::from_str(&raw?) {
                Ok(guest) => Some(guest),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "discarding undecodable cached guest");
                    None
                }
            }
        }

        async fn remove(&self, id: GuestId) {
            let key = cache_key(id);
            let mut conn = self.conn.clone();
            let result: redis::RedisResult<()> =
                redis::cmd("DEL").arg(&key).query_async(&mut conn).await;
            if let Err(e) = result {
                tracing::warn!(%key, error = %e, "guest cache delete failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use innkeep_booking::NewGuest;

    fn guest() -> Guest {
        Guest::register(
            GuestId::new(),
            NewGuest {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: "grace@example.com".to_string(),
                age: 85,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_cached_guest_until_removed() {
        let cache = InMemoryGuestCache::new(Duration::from_secs(60));
        let guest = guest();

        assert!(cache.get(guest.id).await.is_none());
        cache.set(&guest).await;
        assert_eq!(cache.get(guest.id).await, Some(guest.clone()));

        cache.remove(guest.id).await;
        assert!(cache.get(guest.id).await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = InMemoryGuestCache::new(Duration::ZERO);
        let guest = guest();
        cache.set(&guest).await;
        assert!(cache.get(guest.id).await.is_none());
        assert!(cache.entries.read().unwrap().is_empty());
    }
}
