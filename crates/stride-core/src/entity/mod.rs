//! Entity identity and classification.
//!
//! - [`EntityId`]: unique identifier shared by characters, weapons and projectiles
//! - [`EntityKind`]: what an entity is, which decides its death behavior
//! - [`EntityCategories`]: bitflag classes used by weapon ignore lists
//! - [`Character`]: the per-character aggregate owning every controller
//!
//! # Example
//!
//! ```
//! use stride_core::entity::{EntityCategories, EntityId, EntityKind};
//!
//! let id = EntityId::new(42);
//! assert_eq!(id.as_u64(), 42);
//! assert_eq!(EntityKind::Enemy.category(), EntityCategories::ENEMY);
//! ```

pub mod character;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use character::{Character, CharacterInput};

/// Unique identifier for an entity.
///
/// Entity IDs are ordered by their numeric value, which gives every
/// per-tick loop over entities a deterministic order.
///
/// # Example
///
/// ```
/// use stride_core::entity::EntityId;
///
/// let a = EntityId::new(1);
/// let b = EntityId::new(2);
/// assert!(a < b);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// What an entity is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player-controlled character
    Player,
    /// AI-controlled character
    Enemy,
    /// Equipped melee weapon
    Weapon,
    /// In-flight projectile
    Projectile,
    /// Anything else placed in the level
    Prop,
}

impl EntityKind {
    /// The ignore-list category this kind belongs to.
    #[must_use]
    pub fn category(self) -> EntityCategories {
        match self {
            Self::Player => EntityCategories::PLAYER,
            Self::Enemy => EntityCategories::ENEMY,
            Self::Weapon => EntityCategories::WEAPON,
            Self::Projectile => EntityCategories::PROJECTILE,
            Self::Prop => EntityCategories::PROP,
        }
    }

    /// Whether this kind is a character with resources and controllers.
    #[must_use]
    pub fn is_character(self) -> bool {
        matches!(self, Self::Player | Self::Enemy)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
            Self::Weapon => write!(f, "Weapon"),
            Self::Projectile => write!(f, "Projectile"),
            Self::Prop => write!(f, "Prop"),
        }
    }
}

bitflags! {
    /// Entity classes, used to ignore whole groups of targets at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EntityCategories: u32 {
        /// Player characters.
        const PLAYER = 1 << 0;
        /// Enemy characters.
        const ENEMY = 1 << 1;
        /// Weapons.
        const WEAPON = 1 << 2;
        /// Projectiles.
        const PROJECTILE = 1 << 3;
        /// Level props.
        const PROP = 1 << 4;
    }
}

/// Whether a character is still in play. `Dead` is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifeState {
    /// Taking input and damage
    #[default]
    Alive,
    /// Health reached zero
    Dead,
}
