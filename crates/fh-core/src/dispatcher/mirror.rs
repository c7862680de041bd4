//! The in-memory hunt table.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use crate::hunt::{Hunt, HuntId};

/// Iteration key: newest `create_time` first, then by id.
type OrderKey = (Reverse<DateTime<Utc>>, HuntId);

#[derive(Debug, Clone)]
pub(crate) struct MirrorEntry {
    pub(crate) hunt: Hunt,
    /// Commit epoch of the last local write, 0 if loaded from the store.
    pub(crate) committed_at: u64,
}

/// Hunts keyed in iteration order, with an id index.
#[derive(Debug, Default)]
pub(crate) struct Mirror {
    entries: BTreeMap<OrderKey, MirrorEntry>,
    index: HashMap<HuntId, DateTime<Utc>>,
}

impl Mirror {
    /// Builds a mirror from freshly loaded hunts.
    pub(crate) fn from_hunts(hunts: impl IntoIterator<Item = Hunt>) -> Self {
        let mut mirror = Self::default();
        for hunt in hunts {
            mirror.insert(hunt, 0);
        }
        mirror
    }

    pub(crate) fn get(&self, hunt_id: &HuntId) -> Option<&MirrorEntry> {
        let create_time = self.index.get(hunt_id)?;
        self.entries.get(&(Reverse(*create_time), hunt_id.clone()))
    }

    pub(crate) fn contains(&self, hunt_id: &HuntId) -> bool {
        self.index.contains_key(hunt_id)
    }

    /// Inserts or replaces a hunt.
    pub(crate) fn insert(&mut self, hunt: Hunt, committed_at: u64) {
        let hunt_id = hunt.hunt_id().clone();
        let create_time = hunt.create_time();
        if let Some(previous) = self.index.insert(hunt_id.clone(), create_time) {
            if previous != create_time {
                self.entries.remove(&(Reverse(previous), hunt_id.clone()));
            }
        }
        self.entries.insert(
            (Reverse(create_time), hunt_id),
            MirrorEntry { hunt, committed_at },
        );
    }

    /// Entries written locally after `epoch`.
    pub(crate) fn committed_after(&self, epoch: u64) -> impl Iterator<Item = &MirrorEntry> {
        self.entries.values().filter(move |e| e.committed_at > epoch)
    }

    /// Hunts in iteration order.
    pub(crate) fn hunts(&self) -> impl Iterator<Item = &Hunt> {
        self.entries.values().map(|e| &e.hunt)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunt::fixtures::paused_hunt;
    use chrono::Duration;

    #[test]
    fn test_iterates_newest_first_then_by_id() {
        let base = paused_hunt("H.01");
        let t = base.create_time();

        let mut older = paused_hunt("H.01");
        older.create_time = t - Duration::seconds(10);
        let mut newer_b = paused_hunt("H.0b");
        newer_b.create_time = t;
        let mut newer_a = paused_hunt("H.0a");
        newer_a.create_time = t;

        let mirror = Mirror::from_hunts([older, newer_b, newer_a]);
        let ids: Vec<&str> = mirror.hunts().map(|h| h.hunt_id().as_str()).collect();
        assert_eq!(ids, vec!["H.0a", "H.0b", "H.01"]);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut mirror = Mirror::default();
        let mut hunt = paused_hunt("H.01");
        mirror.insert(hunt.clone(), 0);
        hunt.description = "changed".to_string();
        mirror.insert(hunt.clone(), 3);

        assert_eq!(mirror.len(), 1);
        let entry = mirror.get(hunt.hunt_id()).unwrap();
        assert_eq!(entry.hunt.description(), "changed");
        assert_eq!(entry.committed_at, 3);
        assert_eq!(mirror.committed_after(2).count(), 1);
        assert_eq!(mirror.committed_after(3).count(), 0);
    }
}
