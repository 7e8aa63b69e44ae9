//! Melee attacks, combos, power casts and damage.
//!
//! # Architecture
//!
//! ```text
//! try_attack ──▶ play swing clip ──▶ weapon Aggressive ──▶ blade overlaps ──▶ WeaponHitRegistrar
//!      │                                                                            │
//!      └── no weapon: direct melee sweep ──────────────────────────────▶ DamageRequest
//!                                                                                   │
//!                                                                          DamagePipeline
//! ```
//!
//! [`CombatController`] owns three independent timers: the attack cooldown,
//! the combo window and the power-cast cooldown. The attack cooldown is a
//! fraction of the swing clip, so the next input is accepted slightly before
//! the clip ends. When the swing clip finishes the weapon goes passive and,
//! with a combo configured, the combo window opens; an attack inside the
//! window advances to the next combo step.
//!
//! Every entry point is a no-op returning `false` or `None` on an unmet
//! precondition.

mod damage;
mod death;
mod item;
mod weapon;

pub use damage::{DamagePipeline, DamageRequest};
pub use death::{DeathStrategy, EnemyDeath, PlayerDeath};
pub use item::ItemOverlapTracker;
pub use weapon::{AggressionState, IgnoreList, Weapon, WeaponHitRegistrar};

use std::collections::BTreeSet;

use glam::Vec3;
use sweep::{CollisionChannels, CollisionWorld, QueryFilter, Shape};
use tracing::{debug, info, trace, warn};

use crate::config::{CharacterConfig, CombatConfig, PowerConfig};
use crate::entity::EntityId;
use crate::events::{CoreEvent, EventQueue};
use crate::motion::MovementState;
use crate::resources::{ResourceKind, ResourceStore};
use crate::scheduler::Scheduler;
use crate::services::{AnimationService, ClipId, ProjectileSpawn, SpawnService};

/// Collaborators an attack or cast talks to.
pub struct CombatContext<'a> {
    /// World queried by direct melee sweeps
    pub world: &'a dyn CollisionWorld,
    /// Clip playback
    pub animation: &'a mut dyn AnimationService,
    /// Projectile creation
    pub spawner: &'a mut dyn SpawnService,
    /// Outbound events
    pub events: &'a mut EventQueue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CombatTimer {
    Attack,
    ComboWindow,
    PowerCast,
}

#[derive(Debug, Clone, Copy)]
struct Swing {
    clip: Option<ClipId>,
}

/// Attack and cast sequencing for one character.
#[derive(Debug, Clone)]
pub struct CombatController {
    config: CombatConfig,
    power: PowerConfig,
    timers: Scheduler<CombatTimer>,
    combo_step: usize,
    swing: Option<Swing>,
}

impl CombatController {
    /// Idle controller with no cooldown armed.
    #[must_use]
    pub fn new(config: &CharacterConfig) -> Self {
        Self {
            config: config.combat.clone(),
            power: config.power.clone(),
            timers: Scheduler::new(),
            combo_step: 0,
            swing: None,
        }
    }

    /// Whether a swing is in progress.
    #[must_use]
    pub fn is_attacking(&self) -> bool {
        self.swing.is_some()
    }

    /// Combo step of the latest attack.
    #[must_use]
    pub fn combo_step(&self) -> usize {
        self.combo_step
    }

    /// Whether a follow-up attack would advance the combo.
    #[must_use]
    pub fn combo_window_open(&self) -> bool {
        self.timers.is_active(CombatTimer::ComboWindow)
    }

    /// Whether the attack cooldown is armed.
    #[must_use]
    pub fn attack_on_cooldown(&self) -> bool {
        self.timers.is_active(CombatTimer::Attack)
    }

    /// Seconds left on the attack cooldown.
    #[must_use]
    pub fn attack_cooldown_remaining(&self) -> Option<f32> {
        self.timers.remaining(CombatTimer::Attack)
    }

    /// Whether the power-cast cooldown is armed.
    #[must_use]
    pub fn power_on_cooldown(&self) -> bool {
        self.timers.is_active(CombatTimer::PowerCast)
    }

    fn next_combo_step(&self) -> usize {
        let Some(combo) = &self.config.combo else {
            return 0;
        };
        if !self.combo_window_open() && self.swing.is_none() {
            return 0;
        }
        let next = self.combo_step + 1;
        if next < combo.clips.len() {
            next
        } else if combo.wrap {
            0
        } else {
            combo.clips.len().saturating_sub(1)
        }
    }

    fn clip_for(&self, step: usize) -> Option<ClipId> {
        match &self.config.combo {
            Some(combo) => combo.clips.get(step).copied(),
            None => self.config.attack_clip,
        }
    }

    /// Start an attack.
    ///
    /// Refused while the attack cooldown is armed or `mid_traversal` holds.
    /// With a `weapon` the swing opens its aggression window and hits come
    /// from blade overlaps; without one a direct melee sweep runs now and its
    /// damage requests are returned for the caller to apply.
    pub fn try_attack(
        &mut self,
        entity: EntityId,
        movement: &MovementState,
        mid_traversal: bool,
        mut weapon: Option<&mut Weapon>,
        ctx: &mut CombatContext<'_>,
    ) -> Option<Vec<DamageRequest>> {
        if self.attack_on_cooldown() || mid_traversal {
            return None;
        }

        let step = self.next_combo_step();
        if let Some(weapon) = weapon.as_deref_mut() {
            weapon.end_swing(ctx.events);
        }

        let clip = self.clip_for(step);
        let duration = match clip {
            Some(clip) => {
                let duration = ctx.animation.play(entity, clip);
                if duration.is_none() {
                    warn!(%entity, ?clip, "attack clip unknown to animation service; using fallback cooldown");
                }
                duration
            }
            None => {
                warn!(%entity, "no attack clip configured; using fallback cooldown");
                None
            }
        };
        let cooldown = duration.map_or(self.config.fallback_cooldown, |d| d * self.config.cancel_fraction);

        self.combo_step = step;
        self.timers.cancel(CombatTimer::ComboWindow);
        self.timers.start(CombatTimer::Attack, cooldown);
        self.swing = Some(Swing {
            clip: duration.and(clip),
        });

        let requests = match weapon {
            Some(weapon) => {
                weapon.begin_swing();
                Vec::new()
            }
            None => self.melee_sweep(entity, movement, ctx.world),
        };

        info!(%entity, combo_step = step, cooldown, direct_hits = requests.len(), "attack");
        ctx.events.push(CoreEvent::AttackStarted {
            entity,
            combo_step: step,
        });
        Some(requests)
    }

    /// Direct sweep from the front of the capsule along facing.
    ///
    /// Anything already inside the sweep sphere at its start counts as hit.
    /// Each entity is hit at most once.
    #[must_use]
    pub fn melee_sweep(
        &self,
        entity: EntityId,
        movement: &MovementState,
        world: &dyn CollisionWorld,
    ) -> Vec<DamageRequest> {
        let sweep = &self.config.sweep;
        let forward = movement.forward();
        let start = movement.position + forward * movement.capsule.radius;
        let filter = QueryFilter::new(CollisionChannels::PAWN).ignoring_owner(entity.as_u64());

        let touching = world
            .overlap(&Shape::sphere(start, sweep.radius), &filter)
            .into_iter()
            .filter_map(|overlap| overlap.owner);
        let swept = world
            .sphere_cast_all(start, forward, sweep.range, sweep.radius, &filter)
            .into_iter()
            .filter_map(|hit| hit.owner);

        let targets: BTreeSet<u64> = touching.chain(swept).collect();
        debug!(%entity, targets = targets.len(), "melee sweep");
        targets
            .into_iter()
            .map(|target| {
                DamageRequest::new(EntityId::new(target), sweep.damage)
                    .with_instigator(entity)
                    .with_causer(entity)
            })
            .collect()
    }

    /// Count down cooldowns. A clipless swing ends with its cooldown; an
    /// expired combo window resets the combo.
    pub fn advance_timers(
        &mut self,
        entity: EntityId,
        dt: f32,
        mut weapon: Option<&mut Weapon>,
        events: &mut EventQueue,
    ) {
        for timer in self.timers.advance(dt) {
            match timer {
                CombatTimer::Attack => {
                    if self.swing.is_some_and(|swing| swing.clip.is_none()) {
                        self.finish_swing(entity, weapon.as_deref_mut(), events);
                    }
                }
                CombatTimer::ComboWindow => {
                    self.combo_step = 0;
                    debug!(%entity, "combo window closed");
                    events.push(CoreEvent::ComboReset { entity });
                }
                CombatTimer::PowerCast => trace!(%entity, "power cooldown elapsed"),
            }
        }
    }

    /// Finish the swing once its clip stops playing.
    pub fn update(
        &mut self,
        entity: EntityId,
        animation: &dyn AnimationService,
        weapon: Option<&mut Weapon>,
        events: &mut EventQueue,
    ) {
        let Some(Swing { clip: Some(clip) }) = self.swing else {
            return;
        };
        if !animation.is_playing(entity, clip) {
            self.finish_swing(entity, weapon, events);
        }
    }

    fn finish_swing(&mut self, entity: EntityId, weapon: Option<&mut Weapon>, events: &mut EventQueue) {
        self.swing = None;
        if let Some(weapon) = weapon {
            weapon.end_swing(events);
        }
        if let Some(combo) = &self.config.combo {
            self.timers.start(CombatTimer::ComboWindow, combo.window);
            debug!(%entity, step = self.combo_step, window = combo.window, "combo window open");
        }
    }

    /// Drop any swing in progress without opening a combo window.
    pub fn interrupt(&mut self, weapon: Option<&mut Weapon>, events: &mut EventQueue) {
        self.swing = None;
        self.combo_step = 0;
        self.timers.cancel(CombatTimer::ComboWindow);
        if let Some(weapon) = weapon {
            weapon.end_swing(events);
        }
    }

    /// Spend power on a cast, optionally launching a projectile along `look`.
    ///
    /// Refused while on cooldown, mid-traversal, or with less power than the
    /// cost; nothing changes in that case.
    pub fn try_cast_power(
        &mut self,
        entity: EntityId,
        movement: &MovementState,
        look: Vec3,
        mid_traversal: bool,
        resources: &mut ResourceStore,
        ctx: &mut CombatContext<'_>,
    ) -> bool {
        let cost = self.power.cost;
        if self.power_on_cooldown() || mid_traversal || resources.power() < cost {
            return false;
        }

        let duration = match self.power.cast_clip {
            Some(clip) => {
                let duration = ctx.animation.play(entity, clip);
                if duration.is_none() {
                    warn!(%entity, ?clip, "cast clip unknown to animation service; using fallback cooldown");
                }
                duration
            }
            None => {
                warn!(%entity, "no cast clip configured; using fallback cooldown");
                None
            }
        };

        resources.apply_delta_reported(entity, ResourceKind::Power, -cost, ctx.events);

        let projectile = match &self.power.projectile {
            Some(projectile) => {
                let direction = look.try_normalize().unwrap_or_else(|| movement.forward());
                let spawn = ProjectileSpawn {
                    owner: entity,
                    origin: movement.position + direction * projectile.spawn_offset,
                    direction,
                    speed: projectile.speed,
                    damage: projectile.damage,
                };
                ctx.spawner.spawn_projectile(spawn)
            }
            None => {
                warn!(%entity, "no projectile configured for power cast");
                None
            }
        };

        let cooldown = duration.unwrap_or(self.power.fallback_cooldown);
        self.timers.start(CombatTimer::PowerCast, cooldown);

        info!(%entity, cost, cooldown, "power cast");
        ctx.events.push(CoreEvent::PowerCast { entity, cost });
        if let Some(projectile) = projectile {
            ctx.events.push(CoreEvent::ProjectileSpawned { owner: entity, projectile });
        }
        true
    }
}
