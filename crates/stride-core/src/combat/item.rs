//! Overlap bookkeeping for items.
//!
//! An item (a weapon, a pickup) reports which entities currently touch its
//! hit volumes. [`ItemOverlapTracker`] turns raw per-tick overlap sets into
//! enter and leave notifications, publishing `ItemOverlap` only when the set
//! actually changes.

use std::collections::BTreeSet;

use tracing::trace;

use crate::entity::EntityId;
use crate::events::{CoreEvent, EventQueue};

/// Set of entities overlapping one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOverlapTracker {
    item: EntityId,
    owner: Option<EntityId>,
    overlapping: BTreeSet<EntityId>,
}

impl ItemOverlapTracker {
    /// Tracker for `item`, ignoring the item itself and its `owner`.
    #[must_use]
    pub fn new(item: EntityId, owner: Option<EntityId>) -> Self {
        Self {
            item,
            owner,
            overlapping: BTreeSet::new(),
        }
    }

    /// The tracked item.
    #[must_use]
    pub fn item(&self) -> EntityId {
        self.item
    }

    /// Entities currently overlapping.
    #[must_use]
    pub fn overlapping(&self) -> &BTreeSet<EntityId> {
        &self.overlapping
    }

    /// Whether `other` currently overlaps.
    #[must_use]
    pub fn contains(&self, other: EntityId) -> bool {
        self.overlapping.contains(&other)
    }

    fn ignores(&self, other: EntityId) -> bool {
        other == self.item || Some(other) == self.owner
    }

    /// Record that `other` started overlapping. Returns `true` on first entry.
    pub fn begin(&mut self, other: EntityId, events: &mut EventQueue) -> bool {
        if self.ignores(other) || !self.overlapping.insert(other) {
            return false;
        }
        trace!(item = %self.item, %other, "item overlap begin");
        events.push(CoreEvent::ItemOverlap {
            item: self.item,
            other,
            entering: true,
        });
        true
    }

    /// Record that `other` stopped overlapping. Returns `true` if it was
    /// tracked.
    pub fn end(&mut self, other: EntityId, events: &mut EventQueue) -> bool {
        if !self.overlapping.remove(&other) {
            return false;
        }
        trace!(item = %self.item, %other, "item overlap end");
        events.push(CoreEvent::ItemOverlap {
            item: self.item,
            other,
            entering: false,
        });
        true
    }

    /// Replace the overlap set with `current`, publishing leaves then
    /// entries. Returns the entities that entered, in id order.
    pub fn sync<I>(&mut self, current: I, events: &mut EventQueue) -> Vec<EntityId>
    where
        I: IntoIterator<Item = EntityId>,
    {
        let current: BTreeSet<EntityId> = current.into_iter().filter(|other| !self.ignores(*other)).collect();

        let left: Vec<EntityId> = self.overlapping.difference(&current).copied().collect();
        for other in left {
            self.end(other, events);
        }

        current
            .into_iter()
            .filter(|other| self.begin(*other, events))
            .collect()
    }

    /// Forget every overlap, publishing a leave for each.
    pub fn clear(&mut self, events: &mut EventQueue) {
        let all: Vec<EntityId> = self.overlapping.iter().copied().collect();
        for other in all {
            self.end(other, events);
        }
    }
}
