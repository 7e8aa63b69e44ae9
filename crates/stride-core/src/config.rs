//! Character configuration.
//!
//! Every tunable lives in a plain struct passed at construction. All structs
//! deserialize with `#[serde(default)]`, so a JSON document only needs the
//! fields it overrides. World units are centimetres and seconds, Z is up.
//!
//! # Example
//!
//! ```
//! use stride_core::config::CharacterConfig;
//!
//! let config = CharacterConfig::from_json(r#"{ "dash": { "cooldown": 2.0 } }"#).unwrap();
//! assert_eq!(config.dash.cooldown, 2.0);
//! assert_eq!(config.resources.max_health, 100.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityCategories, EntityId};
use crate::services::ClipId;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the target struct
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its legal range
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

fn ensure(condition: bool, field: &'static str, reason: impl Into<String>) -> ConfigResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: reason.into(),
        })
    }
}

fn finite_non_negative(value: f32, field: &'static str) -> ConfigResult<()> {
    ensure(value.is_finite() && value >= 0.0, field, format!("must be finite and >= 0, got {value}"))
}

fn finite_positive(value: f32, field: &'static str) -> ConfigResult<()> {
    ensure(value.is_finite() && value > 0.0, field, format!("must be finite and > 0, got {value}"))
}

// =============================================================================
// Character
// =============================================================================

/// Complete configuration of one character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Locomotion and capsule
    pub movement: MovementConfig,
    /// Resource maxima
    pub resources: ResourceConfig,
    /// Dash ability
    pub dash: DashConfig,
    /// Slide ability
    pub slide: SlideConfig,
    /// Ledge mantle
    pub mantle: MantleConfig,
    /// Melee attacks
    pub combat: CombatConfig,
    /// Power cast
    pub power: PowerConfig,
}

impl CharacterConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.movement.validate()?;
        self.resources.validate()?;
        self.dash.validate()?;
        self.slide.validate()?;
        self.mantle.validate()?;
        self.combat.validate()?;
        self.power.validate()
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Locomotion limits and collision capsule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Top walking speed
    pub max_walk_speed: f32,
    /// Input acceleration
    pub max_acceleration: f32,
    /// Deceleration with no input
    pub braking_deceleration: f32,
    /// Ground friction coefficient
    pub ground_friction: f32,
    /// Downward acceleration
    pub gravity: f32,
    /// Fraction of acceleration available while airborne
    pub air_control: f32,
    /// Capsule radius
    pub capsule_radius: f32,
    /// Capsule half height, hemispheres included
    pub capsule_half_height: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_walk_speed: 1000.0,
            max_acceleration: 2048.0,
            braking_deceleration: 2000.0,
            ground_friction: 8.0,
            gravity: 980.0,
            air_control: 0.35,
            capsule_radius: 42.0,
            capsule_half_height: 96.0,
        }
    }
}

impl MovementConfig {
    fn validate(&self) -> ConfigResult<()> {
        finite_positive(self.max_walk_speed, "movement.max_walk_speed")?;
        finite_non_negative(self.max_acceleration, "movement.max_acceleration")?;
        finite_non_negative(self.braking_deceleration, "movement.braking_deceleration")?;
        finite_non_negative(self.ground_friction, "movement.ground_friction")?;
        finite_non_negative(self.gravity, "movement.gravity")?;
        finite_non_negative(self.air_control, "movement.air_control")?;
        finite_positive(self.capsule_radius, "movement.capsule_radius")?;
        ensure(
            self.capsule_half_height >= self.capsule_radius,
            "movement.capsule_half_height",
            "must be at least the capsule radius",
        )
    }
}

/// Resource maxima. Current values start at these on activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Maximum health, at least 1
    pub max_health: f32,
    /// Maximum power
    pub max_power: f32,
    /// Maximum heal charges
    pub max_charges: u32,
    /// Health restored per heal charge
    pub heal_per_charge: f32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_power: 100.0,
            max_charges: 3,
            heal_per_charge: 50.0,
        }
    }
}

impl ResourceConfig {
    fn validate(&self) -> ConfigResult<()> {
        ensure(
            self.max_health.is_finite() && self.max_health >= 1.0,
            "resources.max_health",
            "must be finite and >= 1",
        )?;
        finite_non_negative(self.max_power, "resources.max_power")?;
        finite_non_negative(self.heal_per_charge, "resources.heal_per_charge")
    }
}

/// Dash impulse and the speed boost that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Launch speed along facing
    pub impulse: f32,
    /// Time before the next dash
    pub cooldown: f32,
    /// Walk speed multiplier during the boost
    pub speed_multiplier: f32,
    /// Boost duration
    pub boost_duration: f32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            impulse: 4000.0,
            cooldown: 1.0,
            speed_multiplier: 1.3,
            boost_duration: 1.0,
        }
    }
}

impl DashConfig {
    fn validate(&self) -> ConfigResult<()> {
        finite_non_negative(self.impulse, "dash.impulse")?;
        finite_non_negative(self.cooldown, "dash.cooldown")?;
        finite_positive(self.speed_multiplier, "dash.speed_multiplier")?;
        finite_non_negative(self.boost_duration, "dash.boost_duration")
    }
}

/// Ground slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    /// Velocity added along the slide direction
    pub impulse: f32,
    /// Capsule half-height multiplier while sliding
    pub capsule_scale: f32,
    /// Slide ends below this horizontal speed
    pub min_speed: f32,
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            impulse: 1200.0,
            capsule_scale: 0.5,
            min_speed: 150.0,
        }
    }
}

impl SlideConfig {
    fn validate(&self) -> ConfigResult<()> {
        finite_non_negative(self.impulse, "slide.impulse")?;
        ensure(
            self.capsule_scale > 0.0 && self.capsule_scale <= 1.0,
            "slide.capsule_scale",
            "must be in (0, 1]",
        )?;
        finite_non_negative(self.min_speed, "slide.min_speed")
    }
}

/// Ledge detection and mantle motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MantleConfig {
    /// Forward probe length
    pub trace_distance: f32,
    /// Lowest ledge above the feet
    pub min_height: f32,
    /// Highest ledge above the feet
    pub max_height: f32,
    /// Interpolation speed for slow entries
    pub normal_lerp_speed: f32,
    /// Interpolation speed for fast entries
    pub fast_lerp_speed: f32,
    /// Delay before the probe may run again after a mantle
    pub recheck_cooldown: f32,
    /// Minimum cosine between look and move direction
    pub activation_cosine: f32,
    /// Entry speed above which the fast variant is used
    pub fast_speed_threshold: f32,
    /// Minimum forward input magnitude
    pub forward_input_threshold: f32,
    /// Distance at which a target point counts as reached
    pub tolerance: f32,
    /// Exit speed multiplier on entry speed
    pub exit_boost: f32,
    /// Lowest exit speed
    pub min_exit_speed: f32,
    /// How far past the wall face the ledge probe starts
    pub ledge_inset: f32,
    /// How far past the wall face the landing point sits
    pub landing_offset: f32,
    /// Gap kept between the landed capsule and the ledge surface
    pub landing_clearance: f32,
    /// Clip for slow entries
    pub normal_clip: Option<ClipId>,
    /// Clip for fast entries
    pub fast_clip: Option<ClipId>,
}

impl Default for MantleConfig {
    fn default() -> Self {
        Self {
            trace_distance: 200.0,
            min_height: 50.0,
            max_height: 200.0,
            normal_lerp_speed: 4.0,
            fast_lerp_speed: 12.0,
            recheck_cooldown: 0.5,
            activation_cosine: 0.8,
            fast_speed_threshold: 600.0,
            forward_input_threshold: 0.1,
            tolerance: 5.0,
            exit_boost: 1.0,
            min_exit_speed: 400.0,
            ledge_inset: 10.0,
            landing_offset: 60.0,
            landing_clearance: 2.0,
            normal_clip: None,
            fast_clip: None,
        }
    }
}

impl MantleConfig {
    fn validate(&self) -> ConfigResult<()> {
        finite_positive(self.trace_distance, "mantle.trace_distance")?;
        finite_non_negative(self.min_height, "mantle.min_height")?;
        ensure(
            self.max_height.is_finite() && self.max_height > self.min_height,
            "mantle.max_height",
            "must be greater than mantle.min_height",
        )?;
        finite_positive(self.normal_lerp_speed, "mantle.normal_lerp_speed")?;
        finite_positive(self.fast_lerp_speed, "mantle.fast_lerp_speed")?;
        finite_non_negative(self.recheck_cooldown, "mantle.recheck_cooldown")?;
        ensure(
            (-1.0..=1.0).contains(&self.activation_cosine),
            "mantle.activation_cosine",
            "must be in [-1, 1]",
        )?;
        finite_positive(self.tolerance, "mantle.tolerance")?;
        finite_non_negative(self.exit_boost, "mantle.exit_boost")?;
        finite_non_negative(self.min_exit_speed, "mantle.min_exit_speed")?;
        finite_non_negative(self.landing_clearance, "mantle.landing_clearance")
    }
}

/// Direct melee sweep used when no weapon is equipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeSweepConfig {
    /// Sweep length from the capsule front
    pub range: f32,
    /// Sweep sphere radius
    pub radius: f32,
    /// Damage per target hit
    pub damage: f32,
}

impl Default for MeleeSweepConfig {
    fn default() -> Self {
        Self {
            range: 100.0,
            radius: 50.0,
            damage: 20.0,
        }
    }
}

/// Combo sequencing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// One clip per combo step
    pub clips: Vec<ClipId>,
    /// How long after a clip completes the next step may be input
    pub window: f32,
    /// Wrap to step zero after the last step instead of repeating it
    pub wrap: bool,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            clips: Vec::new(),
            window: 0.6,
            wrap: true,
        }
    }
}

/// Melee attack timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Clip for single attacks when no combo is configured
    pub attack_clip: Option<ClipId>,
    /// Optional combo chain
    pub combo: Option<ComboConfig>,
    /// Cooldown as a fraction of the attack clip duration
    pub cancel_fraction: f32,
    /// Cooldown used when no clip duration is known
    pub fallback_cooldown: f32,
    /// Direct sweep for weaponless attacks
    pub sweep: MeleeSweepConfig,
    /// Seconds an enemy corpse stays before despawning
    pub corpse_lifespan: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_clip: None,
            combo: None,
            cancel_fraction: 0.85,
            fallback_cooldown: 0.5,
            sweep: MeleeSweepConfig::default(),
            corpse_lifespan: 5.0,
        }
    }
}

impl CombatConfig {
    fn validate(&self) -> ConfigResult<()> {
        ensure(
            self.cancel_fraction > 0.0 && self.cancel_fraction <= 1.0,
            "combat.cancel_fraction",
            "must be in (0, 1]",
        )?;
        finite_non_negative(self.fallback_cooldown, "combat.fallback_cooldown")?;
        finite_non_negative(self.sweep.range, "combat.sweep.range")?;
        finite_non_negative(self.sweep.radius, "combat.sweep.radius")?;
        finite_non_negative(self.sweep.damage, "combat.sweep.damage")?;
        finite_non_negative(self.corpse_lifespan, "combat.corpse_lifespan")?;
        if let Some(combo) = &self.combo {
            ensure(!combo.clips.is_empty(), "combat.combo.clips", "must name at least one clip")?;
            finite_positive(combo.window, "combat.combo.window")?;
        }
        Ok(())
    }
}

/// Projectile launched by a power cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Launch speed
    pub speed: f32,
    /// Damage carried by the projectile
    pub damage: f32,
    /// Spawn distance in front of the capsule centre
    pub spawn_offset: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 2000.0,
            damage: 30.0,
            spawn_offset: 60.0,
        }
    }
}

/// Power cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Power deducted per cast
    pub cost: f32,
    /// Cast clip; its duration becomes the cooldown
    pub cast_clip: Option<ClipId>,
    /// Cooldown used when no clip is configured
    pub fallback_cooldown: f32,
    /// Projectile to spawn, if any
    pub projectile: Option<ProjectileConfig>,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            cost: 25.0,
            cast_clip: None,
            fallback_cooldown: 1.0,
            projectile: None,
        }
    }
}

impl PowerConfig {
    fn validate(&self) -> ConfigResult<()> {
        finite_non_negative(self.cost, "power.cost")?;
        finite_non_negative(self.fallback_cooldown, "power.fallback_cooldown")?;
        if let Some(projectile) = &self.projectile {
            finite_non_negative(projectile.speed, "power.projectile.speed")?;
            finite_non_negative(projectile.damage, "power.projectile.damage")?;
        }
        Ok(())
    }
}

// =============================================================================
// Weapon
// =============================================================================

/// An equippable melee weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Damage per registered hit
    pub damage: f32,
    /// Never hit the wielder
    pub ignore_wielder: bool,
    /// Target classes never hit
    pub ignore_categories: EntityCategories,
    /// Specific targets never hit
    pub ignore_entities: Vec<EntityId>,
    /// Blade tip distance from the capsule centre
    pub reach: f32,
    /// Blade thickness
    pub blade_radius: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            damage: 25.0,
            ignore_wielder: true,
            ignore_categories: EntityCategories::empty(),
            ignore_entities: Vec::new(),
            reach: 120.0,
            blade_radius: 15.0,
        }
    }
}

impl WeaponConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        finite_non_negative(self.damage, "weapon.damage")?;
        finite_positive(self.reach, "weapon.reach")?;
        finite_positive(self.blade_radius, "weapon.blade_radius")
    }
}
