//! Change tracking shared between a property bag and its complex values.
//!
//! The bag owns the [`ChangeLog`] behind an `Arc`; every complex value it
//! stores receives an [`OwnerHandle`] holding only a `Weak` reference, so a
//! value can report its own mutation without owning the bag.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// How a property changed since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Assigned where no value was present
    Added,
    /// Replaced or mutated in place
    Modified,
    /// Explicitly cleared
    Deleted,
}

/// Changed properties, keyed by XML element name.
#[derive(Debug, Default, Clone)]
pub struct ChangeLog {
    entries: HashMap<&'static str, ChangeKind>,
}

impl ChangeLog {
    /// Record a change, merging it with an earlier one for the same key.
    pub fn record(&mut self, key: &'static str, change: ChangeKind) {
        let merged = match (self.entries.get(key).copied(), change) {
            (Some(ChangeKind::Added), ChangeKind::Modified) => ChangeKind::Added,
            (Some(ChangeKind::Deleted), ChangeKind::Added) => ChangeKind::Modified,
            (_, change) => change,
        };
        self.entries.insert(key, merged);
    }

    pub fn mark_modified(&mut self, key: &'static str) {
        self.record(key, ChangeKind::Modified);
    }

    /// Forget a key entirely.
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn get(&self, key: &str) -> Option<ChangeKind> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

/// Shared, lockable change log.
pub type SharedChangeLog = Arc<Mutex<ChangeLog>>;

/// Non-owning link from a complex value back to the bag entry holding it.
#[derive(Debug, Clone)]
pub struct OwnerHandle {
    log: Weak<Mutex<ChangeLog>>,
    key: &'static str,
}

impl OwnerHandle {
    pub fn new(log: &SharedChangeLog, key: &'static str) -> Self {
        Self {
            log: Arc::downgrade(log),
            key,
        }
    }

    /// XML name of the owning property.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Mark the owning property modified. A no-op once the bag is gone.
    pub fn notify_changed(&self) {
        if let Some(log) = self.log.upgrade() {
            log.lock().mark_modified(self.key);
        }
    }

    /// True while the owning bag is alive.
    pub fn is_attached(&self) -> bool {
        self.log.strong_count() > 0
    }
}

/// Notify an optional owner.
#[inline]
pub fn notify(owner: &Option<OwnerHandle>) {
    if let Some(owner) = owner {
        owner.notify_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rules() {
        let mut log = ChangeLog::default();
        log.record("Subject", ChangeKind::Added);
        log.mark_modified("Subject");
        assert_eq!(log.get("Subject"), Some(ChangeKind::Added));

        log.record("Body", ChangeKind::Deleted);
        log.record("Body", ChangeKind::Added);
        assert_eq!(log.get("Body"), Some(ChangeKind::Modified));

        log.record("IsRead", ChangeKind::Modified);
        log.record("IsRead", ChangeKind::Deleted);
        assert_eq!(log.get("IsRead"), Some(ChangeKind::Deleted));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_owner_handle_is_weak() {
        let log: SharedChangeLog = Arc::new(Mutex::new(ChangeLog::default()));
        let handle = OwnerHandle::new(&log, "ToRecipients");
        handle.notify_changed();
        assert_eq!(log.lock().get("ToRecipients"), Some(ChangeKind::Modified));

        drop(log);
        assert!(!handle.is_attached());
        handle.notify_changed();
    }
}
