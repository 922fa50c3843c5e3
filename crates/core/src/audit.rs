//! Audit columns shared by every persisted entity.
//!
//! Entities embed `AuditFields` by value instead of inheriting behavior from a
//! base type. Serialized flat into the owning entity's JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity flag, creation/mutation timestamps and tombstone marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AuditFields {
    /// Fresh audit columns for a record created at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Record a mutation.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Soft-delete: mark inactive and set the tombstone. Idempotent; the first
    /// tombstone timestamp is kept.
    pub fn tombstone(&mut self, now: DateTime<Utc>) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(now);
        }
        self.active = false;
        self.updated_at = now;
    }

    /// Visible to normal reads.
    pub fn is_live(&self) -> bool {
        self.active && self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_record_is_live_with_equal_timestamps() {
        let now = Utc::now();
        let audit = AuditFields::new(now);
        assert!(audit.is_live());
        assert_eq!(audit.created_at, audit.updated_at);
        assert!(audit.deleted_at.is_none());
    }

    #[test]
    fn tombstone_hides_record_and_keeps_first_marker() {
        let now = Utc::now();
        let mut audit = AuditFields::new(now);

        let first = now + Duration::seconds(1);
        audit.tombstone(first);
        assert!(!audit.is_live());
        assert_eq!(audit.deleted_at, Some(first));

        audit.tombstone(first + Duration::seconds(1));
        assert_eq!(audit.deleted_at, Some(first));
    }

    #[test]
    fn touch_only_moves_updated_at() {
        let now = Utc::now();
        let mut audit = AuditFields::new(now);
        let later = now + Duration::minutes(5);
        audit.touch(later);
        assert_eq!(audit.created_at, now);
        assert_eq!(audit.updated_at, later);
    }
}
