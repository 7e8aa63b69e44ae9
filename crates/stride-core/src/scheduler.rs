//! One-shot timers keyed by handle.
//!
//! Each controller owns a `Scheduler` over its own handle enum, so cooldowns
//! of different controllers never share state. Starting a timer on a handle
//! that is already armed replaces the old deadline; timers never stack.
//!
//! # Example
//!
//! ```
//! use stride_core::scheduler::Scheduler;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
//! enum Timer { Cooldown, Boost }
//!
//! let mut timers = Scheduler::new();
//! timers.start(Timer::Boost, 1.0);
//! timers.start(Timer::Cooldown, 0.5);
//!
//! assert_eq!(timers.advance(0.75), vec![Timer::Cooldown]);
//! assert!(timers.is_active(Timer::Boost));
//! ```

use std::collections::BTreeMap;

/// Handle-keyed countdown table.
#[derive(Debug, Clone)]
pub struct Scheduler<K: Ord + Copy> {
    timers: BTreeMap<K, f32>,
}

impl<K: Ord + Copy> Scheduler<K> {
    /// Empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timers: BTreeMap::new(),
        }
    }

    /// Arm `key` to fire after `duration` seconds, replacing any armed timer.
    pub fn start(&mut self, key: K, duration: f32) {
        self.timers.insert(key, duration.max(0.0));
    }

    /// Disarm `key`. Returns whether it was armed.
    pub fn cancel(&mut self, key: K) -> bool {
        self.timers.remove(&key).is_some()
    }

    /// Whether `key` is armed.
    #[must_use]
    pub fn is_active(&self, key: K) -> bool {
        self.timers.contains_key(&key)
    }

    /// Seconds left on `key`.
    #[must_use]
    pub fn remaining(&self, key: K) -> Option<f32> {
        self.timers.get(&key).copied()
    }

    /// Number of armed timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timer is armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Disarm everything.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Count every timer down by `dt` and return those that fired, earliest
    /// deadline first. Fired timers are disarmed.
    pub fn advance(&mut self, dt: f32) -> Vec<K> {
        let dt = dt.max(0.0);
        let mut fired: Vec<(f32, K)> = Vec::new();
        for (key, remaining) in &mut self.timers {
            *remaining -= dt;
            if *remaining <= 0.0 {
                fired.push((*remaining, *key));
            }
        }
        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, key) in &fired {
            self.timers.remove(key);
        }
        fired.into_iter().map(|(_, key)| key).collect()
    }
}

impl<K: Ord + Copy> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}
