//! Entity trait: identity + continuity across state changes.

use crate::audit::AuditFields;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the shared audit columns (activity flag, timestamps, tombstone).
    fn audit(&self) -> &AuditFields;

    /// Whether the entity is visible to normal reads (active and not tombstoned).
    fn is_live(&self) -> bool {
        self.audit().is_live()
    }
}
