use super::flight::FlightState;
use super::host::{Controller, Notification, WeaponId};
use super::state::ProjectileState;
use super::target::{Target, TargetClass, TargetId};
use super::{SimTime, TickContext};
use crate::buffer::SoundSlot;
use crate::config::{GuidedMissileCues, GuidedMissileTuning};
use crate::error::Result;
use crate::manager::AudioDeviceManager;
use crate::math::Vec3;
use std::rc::{Rc, Weak};

/// Where and by whom a projectile is launched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launcher {
    pub position: Vec3,
    pub controller: Controller,
    /// Missiles fired from the air fly at the carrier speed
    pub flying: bool,
}

/// A cruise missile that homes on one target.
///
/// After [`fire`](Self::fire) the missile sits out the arming delay, then every
/// tick re-places its looping flight cue, converges on the target's altitude,
/// turns toward it and flies. It ends by impact (hit reported, impact cue played
/// at the target) or by losing the lock (target gone or invalid, distance ceiling
/// passed, finish requested). Either way it keeps ticking until its impact and
/// explosion cues fall silent, then tells the host it can be disposed.
pub struct GuidedProjectile {
    id: WeaponId,
    controller: Controller,
    tuning: GuidedMissileTuning,
    cues: GuidedMissileCues,
    flight: FlightState,
    target: Option<Weak<dyn Target>>,
    launch_time: SimTime,
    speed: f32,
    state: ProjectileState,
    /// Cleared only once flight is over and no impact or explosion cue is audible
    performing: bool,
    finish_requested: bool,
    launch_cue: SoundSlot,
    flight_cue: SoundSlot,
    lock_confirm_cue: SoundSlot,
    impact_cue: SoundSlot,
    explosion_cue: SoundSlot,
}

impl std::fmt::Debug for GuidedProjectile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuidedProjectile")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("flight", &self.flight)
            .field("launch_time", &self.launch_time)
            .field("performing", &self.performing)
            .finish_non_exhaustive()
    }
}

impl GuidedProjectile {
    /// Build a missile with the stock tuning and cue names.
    pub fn new(id: WeaponId, launcher: Launcher, audio: &AudioDeviceManager) -> Result<Self> {
        Self::with_tuning(
            id,
            launcher,
            GuidedMissileTuning::default(),
            GuidedMissileCues::default(),
            audio,
        )
    }

    /// Build a missile and load its launch and flight cues on the primary device.
    ///
    /// # Errors
    ///
    /// Any cue load failure, `ResourceNotFound` in particular. Nothing is left
    /// loaded when construction fails.
    pub fn with_tuning(
        id: WeaponId,
        launcher: Launcher,
        tuning: GuidedMissileTuning,
        cues: GuidedMissileCues,
        audio: &AudioDeviceManager,
    ) -> Result<Self> {
        let launch_cue = SoundSlot::from(audio.load(&audio.sound_path(&cues.launch)?)?);
        let flight_cue = SoundSlot::from(audio.load(&audio.sound_path(&cues.flight)?)?);
        let speed = if launcher.flying {
            tuning.carrier_speed
        } else {
            tuning.cruise_speed
        };

        Ok(Self {
            id,
            controller: launcher.controller,
            tuning,
            cues,
            flight: FlightState::at(launcher.position),
            target: None,
            launch_time: 0,
            speed,
            state: ProjectileState::Idle,
            performing: false,
            finish_requested: false,
            launch_cue,
            flight_cue,
            lock_confirm_cue: SoundSlot::empty(),
            impact_cue: SoundSlot::empty(),
            explosion_cue: SoundSlot::empty(),
        })
    }

    pub fn id(&self) -> WeaponId {
        self.id
    }

    pub fn controller(&self) -> Controller {
        self.controller
    }

    pub fn state(&self) -> ProjectileState {
        self.state
    }

    pub fn flight(&self) -> &FlightState {
        &self.flight
    }

    pub fn position(&self) -> Vec3 {
        self.flight.position
    }

    pub fn direction(&self) -> f32 {
        self.flight.direction
    }

    pub fn total_distance(&self) -> f32 {
        self.flight.total_distance
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn launch_time(&self) -> SimTime {
        self.launch_time
    }

    pub fn is_finished(&self) -> bool {
        self.flight.finished
    }

    pub fn is_performing(&self) -> bool {
        self.performing
    }

    /// The disposal notification has been sent.
    pub fn is_disposed(&self) -> bool {
        self.state == ProjectileState::Finished
    }

    pub fn flight_cue(&self) -> &SoundSlot {
        &self.flight_cue
    }

    pub fn impact_cue(&self) -> &SoundSlot {
        &self.impact_cue
    }

    pub fn explosion_cue(&self) -> &SoundSlot {
        &self.explosion_cue
    }

    fn live_target(&self) -> Option<Rc<dyn Target>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    /// Replace the tracked target. Validity is checked on the next tracking tick.
    pub fn lock_on(&mut self, target: Weak<dyn Target>) {
        self.target = Some(target);
    }

    /// Ask the missile to give up. It goes through the lost-lock sequence on its
    /// next armed tick.
    pub fn request_finish(&mut self) {
        self.finish_requested = true;
    }

    /// Hand over an explosion cue that must finish before the missile is disposed.
    pub fn attach_explosion_cue(&mut self, audio: &AudioDeviceManager, cue: SoundSlot) {
        audio.unload(&mut self.explosion_cue);
        self.explosion_cue = cue;
    }

    /// Launch toward the locked target.
    ///
    /// Turns toward the target, matches its altitude, records the launch time and
    /// plays the launch cue. An AI launch warns an aircraft target. A player
    /// launch starts the host's launch effect and plays the lock-confirmation cue.
    /// Firing again after launch does nothing.
    pub fn fire(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        if self.state != ProjectileState::Idle {
            log::debug!("{} already fired ({}), ignoring", self.id, self.state);
            return Ok(());
        }

        let target = self.live_target();
        if let Some(target) = &target {
            let position = target.position();
            self.flight.face(position.truncate());
            self.flight.position.z = position.z;
        }
        self.launch_time = ctx.now;
        self.state = ProjectileState::Launched;
        log::info!(
            "{} launched at {:?} bearing {:.1} (speed {})",
            self.id,
            self.flight.position,
            self.flight.direction,
            self.speed
        );

        if let Some(launch) = self.launch_cue.get() {
            ctx.audio.play_sound(launch, true, false)?;
        }

        match self.controller {
            Controller::Ai => {
                if let Some(target) = target.filter(|t| t.is_aircraft()) {
                    ctx.host.notify_of(target.id(), Notification::MissileLaunch, true);
                }
            }
            Controller::Player => {
                ctx.host.start_launch_effect();
                let confirm = ctx.audio.load(&ctx.audio.sound_path(&self.cues.lock_confirm)?)?;
                ctx.audio.play_sound(&confirm, true, false)?;
                ctx.audio.unload(&mut self.lock_confirm_cue);
                self.lock_confirm_cue = confirm.into();
            }
        }
        Ok(())
    }

    /// One simulation step.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        if matches!(self.state, ProjectileState::Idle | ProjectileState::Finished) {
            return Ok(());
        }

        if self.flight.finished {
            if self.performing {
                self.performing = self.cue_still_audible();
            } else {
                ctx.host.weapon_disposed(self.id);
                self.state = ProjectileState::Finished;
                log::info!("{} finished and released", self.id);
            }
            return Ok(());
        }

        self.performing = true;
        if ctx.now.abs_diff(self.launch_time) < self.tuning.arming_delay.as_millis() as u64 {
            return Ok(());
        }

        let Some(target) = self.live_target() else {
            self.lose_lock("target no longer exists");
            return Ok(());
        };
        if self.state == ProjectileState::Launched {
            self.state = ProjectileState::Tracking;
            log::debug!("{} armed, tracking {}", self.id, target.id());
        }

        if let Some(flight_cue) = self.flight_cue.get() {
            ctx.audio
                .play_sound_3d(flight_cue, false, true, self.flight.position)?;
        }

        let target_position = target.position();
        self.flight.converge_altitude(
            target_position.z,
            self.tuning.vertical_step,
            self.tuning.vertical_band,
        );
        self.flight.face(target_position.truncate());
        self.flight.advance(self.speed, ctx.dt);
        log::debug!(
            "{} at {:?} bearing {:.1}, {:.2} flown",
            self.id,
            self.flight.position,
            self.flight.direction,
            self.flight.total_distance
        );

        // A target in range is hit even if its lock just went invalid
        if self.in_firing_range(target_position) {
            let damage = match target.class() {
                TargetClass::HighDurability => self.tuning.high_durability_damage,
                TargetClass::Standard => self.tuning.default_damage,
            };
            return self.impact(ctx, target.id(), target_position, damage);
        }

        if self.flight.total_distance > self.tuning.max_travel_distance {
            self.lose_lock("distance ceiling passed");
        } else if !target.is_valid_lock() {
            self.lose_lock("lock invalidated");
        } else if self.finish_requested {
            self.lose_lock("finish requested");
        }
        Ok(())
    }

    /// Force an impact decided elsewhere, skipping the proximity test.
    pub fn server_side_hit(
        &mut self,
        ctx: &mut TickContext<'_>,
        target: &dyn Target,
        damage: i32,
    ) -> Result<()> {
        self.performing = true;
        self.impact(ctx, target.id(), target.position(), damage)
    }

    /// Release every cue. Safe to call more than once.
    pub fn free(&mut self, audio: &AudioDeviceManager) {
        for slot in [
            &mut self.launch_cue,
            &mut self.flight_cue,
            &mut self.lock_confirm_cue,
            &mut self.impact_cue,
            &mut self.explosion_cue,
        ] {
            audio.unload(slot);
        }
    }

    fn in_firing_range(&self, target: Vec3) -> bool {
        self.flight.horizontal_distance_to(target) <= self.tuning.strike_radius
            && self.flight.in_vertical_range(target.z, self.tuning.vertical_band)
    }

    fn cue_still_audible(&self) -> bool {
        self.impact_cue.is_playing() || self.explosion_cue.is_playing()
    }

    fn stop_flight_cue(&self) {
        if let Some(flight_cue) = self.flight_cue.get() {
            flight_cue.stop();
        }
    }

    /// The hit is reported before the impact cue is loaded, so a missing cue
    /// cannot swallow it.
    fn impact(
        &mut self,
        ctx: &mut TickContext<'_>,
        target: TargetId,
        at: Vec3,
        damage: i32,
    ) -> Result<()> {
        self.stop_flight_cue();
        ctx.host.fire_hit_event(target, damage);
        self.flight.finished = true;
        self.state = ProjectileState::Impacted;
        log::info!("{} hit {} for {}", self.id, target, damage);

        let variant = ctx.rng.random_inclusive(1, self.tuning.impact_variants);
        let path = ctx.audio.sound_path(&self.cues.impact(variant))?;
        let cue = ctx.audio.load(&path)?;
        ctx.audio.play_sound_3d(&cue, true, false, at)?;
        ctx.audio.unload(&mut self.impact_cue);
        self.impact_cue = cue.into();
        Ok(())
    }

    fn lose_lock(&mut self, reason: &str) {
        self.stop_flight_cue();
        self.flight.finished = true;
        self.state = ProjectileState::LostLock;
        self.performing = self.cue_still_audible();
        log::info!(
            "{} lost lock: {} after {:.2}",
            self.id,
            reason,
            self.flight.total_distance
        );
    }

    pub(super) fn flight_mut(&mut self) -> &mut FlightState {
        &mut self.flight
    }

    pub(super) fn set_launch_time(&mut self, launch_time: SimTime) {
        self.launch_time = launch_time;
    }

    pub(super) fn set_state(&mut self, state: ProjectileState) {
        self.state = state;
    }
}
