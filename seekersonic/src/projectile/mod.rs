//! The guided projectile and the collaborators it talks to.
//!
//! A [`GuidedProjectile`] is ticked once per simulation step by the host with a
//! [`TickContext`] that lends it the audio context, the host's notification and
//! combat hooks, and a random source. It never owns any of them.

mod flight;
mod guided;
mod host;
mod persist;
mod state;
mod target;
mod weapon;

#[cfg(test)]
pub(crate) mod testing;

pub use flight::FlightState;
pub use guided::{GuidedProjectile, Launcher};
pub use host::{Controller, Notification, RandomSource, WeaponHost, WeaponId};
pub use state::ProjectileState;
pub use target::{Target, TargetClass, TargetId};
pub use weapon::{Weapon, WeaponKind};

use crate::manager::AudioDeviceManager;
use std::time::Duration;

/// Simulation timestamp in milliseconds.
pub type SimTime = i64;

/// Everything a weapon borrows from its host for one call.
pub struct TickContext<'a> {
    /// Current simulation time
    pub now: SimTime,
    /// Simulated time since the previous tick
    pub dt: Duration,
    pub audio: &'a AudioDeviceManager,
    pub host: &'a mut dyn WeaponHost,
    pub rng: &'a mut dyn RandomSource,
}

impl<'a> TickContext<'a> {
    pub fn new(
        now: SimTime,
        dt: Duration,
        audio: &'a AudioDeviceManager,
        host: &'a mut dyn WeaponHost,
        rng: &'a mut dyn RandomSource,
    ) -> Self {
        Self {
            now,
            dt,
            audio,
            host,
            rng,
        }
    }
}
