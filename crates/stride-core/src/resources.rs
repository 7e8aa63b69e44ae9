//! Clamped per-entity resources.
//!
//! A [`ResourceStore`] holds health, power and heal charges for one entity.
//! Values only move through [`ResourceStore::apply_delta`], which clamps to
//! `[0, max]` and reports whether anything actually changed. The store makes
//! no game decisions; death detection lives in the damage pipeline.
//!
//! # Example
//!
//! ```
//! use stride_core::config::ResourceConfig;
//! use stride_core::resources::{ResourceKind, ResourceStore};
//!
//! let mut store = ResourceStore::new(&ResourceConfig::default());
//! let hit = store.apply_delta(ResourceKind::Health, -40.0);
//! assert_eq!((hit.old, hit.new, hit.changed), (100.0, 60.0, true));
//!
//! let overkill = store.apply_delta(ResourceKind::Health, -70.0);
//! assert_eq!((overkill.old, overkill.new), (60.0, 0.0));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::ResourceConfig;
use crate::entity::EntityId;
use crate::events::{CoreEvent, EventQueue};

/// Which resource a delta targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Hit points
    Health,
    /// Secondary resource spent on power casts
    Power,
    /// Whole-number heal charges
    Charges,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Health => write!(f, "Health"),
            Self::Power => write!(f, "Power"),
            Self::Charges => write!(f, "Charges"),
        }
    }
}

/// Result of one delta application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaOutcome {
    /// Value before
    pub old: f32,
    /// Value after clamping
    pub new: f32,
    /// `false` when clamping left the value where it was
    pub changed: bool,
}

/// A single value clamped to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    current: f32,
    max: f32,
    integral: bool,
}

impl Pool {
    /// A pool filled to `max`.
    #[must_use]
    pub fn full(max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        Self {
            current: max,
            max,
            integral: false,
        }
    }

    /// A pool of whole numbers filled to `max`.
    #[must_use]
    pub fn full_integral(max: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let max = max as f32;
        Self {
            current: max,
            max,
            integral: true,
        }
    }

    /// Current value.
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// `current / max`, zero for an empty bound.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Whether the value is at its bound.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Whether the value is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    /// Add `delta`, clamp, and report.
    ///
    /// Integral pools truncate the delta toward zero. A NaN delta is ignored.
    pub fn apply_delta(&mut self, delta: f32) -> DeltaOutcome {
        let old = self.current;
        let delta = if self.integral { delta.trunc() } else { delta };
        let new = (old + delta).clamp(0.0, self.max);
        let new = if new.is_nan() { old } else { new };
        self.current = new;
        DeltaOutcome {
            old,
            new,
            changed: new != old,
        }
    }
}

/// Health, power and heal charges for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStore {
    health: Pool,
    power: Pool,
    charges: Pool,
}

impl ResourceStore {
    /// Activate a store: every resource starts at its maximum.
    #[must_use]
    pub fn new(config: &ResourceConfig) -> Self {
        Self {
            health: Pool::full(config.max_health.max(1.0)),
            power: Pool::full(config.max_power),
            charges: Pool::full_integral(config.max_charges),
        }
    }

    fn pool(&self, kind: ResourceKind) -> &Pool {
        match kind {
            ResourceKind::Health => &self.health,
            ResourceKind::Power => &self.power,
            ResourceKind::Charges => &self.charges,
        }
    }

    fn pool_mut(&mut self, kind: ResourceKind) -> &mut Pool {
        match kind {
            ResourceKind::Health => &mut self.health,
            ResourceKind::Power => &mut self.power,
            ResourceKind::Charges => &mut self.charges,
        }
    }

    /// Apply a signed delta to one resource.
    pub fn apply_delta(&mut self, kind: ResourceKind, delta: f32) -> DeltaOutcome {
        self.pool_mut(kind).apply_delta(delta)
    }

    /// Apply a delta on behalf of `entity` and publish the change, if any.
    pub fn apply_delta_reported(
        &mut self,
        entity: EntityId,
        kind: ResourceKind,
        delta: f32,
        events: &mut EventQueue,
    ) -> DeltaOutcome {
        let outcome = self.apply_delta(kind, delta);
        if outcome.changed {
            debug!(%entity, %kind, old = outcome.old, new = outcome.new, delta, "resource changed");
            events.push(CoreEvent::ResourceChanged {
                entity,
                kind,
                old: outcome.old,
                new: outcome.new,
            });
        }
        outcome
    }

    /// Current value of `kind`.
    #[must_use]
    pub fn current(&self, kind: ResourceKind) -> f32 {
        self.pool(kind).current()
    }

    /// Maximum of `kind`.
    #[must_use]
    pub fn max(&self, kind: ResourceKind) -> f32 {
        self.pool(kind).max()
    }

    /// Fill fraction of `kind`, for health bars.
    #[must_use]
    pub fn fraction(&self, kind: ResourceKind) -> f32 {
        self.pool(kind).fraction()
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health.current()
    }

    /// Current power.
    #[must_use]
    pub fn power(&self) -> f32 {
        self.power.current()
    }

    /// Remaining heal charges.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn charges(&self) -> u32 {
        self.charges.current() as u32
    }

    /// Whether health is at its maximum.
    #[must_use]
    pub fn is_health_full(&self) -> bool {
        self.health.is_full()
    }
}
