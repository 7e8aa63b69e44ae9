//! Collision channels and query filters.
//!
//! Every collider lives on one or more channels. A query carries a channel
//! mask and only sees colliders sharing at least one channel with it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::world::ColliderId;

bitflags! {
    /// Channel membership of a collider, or the channel mask of a query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionChannels: u16 {
        /// Level geometry that never moves.
        const WORLD_STATIC = 1 << 0;
        /// Movable props and platforms.
        const WORLD_DYNAMIC = 1 << 1;
        /// Character capsules.
        const PAWN = 1 << 2;
        /// Obstacles a character may mantle over.
        const VAULTABLE = 1 << 3;
        /// Weapon hit volumes.
        const WEAPON = 1 << 4;
        /// In-flight projectiles.
        const PROJECTILE = 1 << 5;
    }
}

impl Default for CollisionChannels {
    fn default() -> Self {
        Self::WORLD_STATIC
    }
}

/// Narrows which colliders a query may report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Only colliders on at least one of these channels are considered.
    pub channels: CollisionChannels,
    /// Colliders whose owner tag is listed here are skipped.
    pub ignore_owners: Vec<u64>,
    /// Individual colliders to skip.
    pub ignore_colliders: Vec<ColliderId>,
}

impl QueryFilter {
    /// Filter accepting every collider on `channels`.
    #[must_use]
    pub fn new(channels: CollisionChannels) -> Self {
        Self {
            channels,
            ignore_owners: Vec::new(),
            ignore_colliders: Vec::new(),
        }
    }

    /// Also skip colliders owned by `owner`.
    #[must_use]
    pub fn ignoring_owner(mut self, owner: u64) -> Self {
        if !self.ignore_owners.contains(&owner) {
            self.ignore_owners.push(owner);
        }
        self
    }

    /// Also skip one specific collider.
    #[must_use]
    pub fn ignoring_collider(mut self, collider: ColliderId) -> Self {
        if !self.ignore_colliders.contains(&collider) {
            self.ignore_colliders.push(collider);
        }
        self
    }

    /// Whether a collider with the given id, channels and owner passes.
    #[must_use]
    pub fn accepts(&self, id: ColliderId, channels: CollisionChannels, owner: Option<u64>) -> bool {
        if !self.channels.intersects(channels) {
            return false;
        }
        if self.ignore_colliders.contains(&id) {
            return false;
        }
        match owner {
            Some(owner) => !self.ignore_owners.contains(&owner),
            None => true,
        }
    }
}
