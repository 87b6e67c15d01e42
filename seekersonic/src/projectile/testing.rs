//! Fixtures shared by the projectile tests.

use super::{
    Controller, GuidedProjectile, Launcher, Notification, Target, TargetClass, TargetId,
    TickContext, WeaponHost, WeaponId,
};
use crate::audio_data::{InMemoryLoader, SeekerSonicAudioData};
use crate::config::{AudioDesc, GuidedMissileTuning};
use crate::device::DeviceKind;
use crate::manager::AudioDeviceManager;
use crate::math::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

pub const RATE: u32 = 8000;

pub fn tone(seconds: f32) -> SeekerSonicAudioData {
    let frames = (seconds * RATE as f32) as usize;
    let samples = (0..frames).map(|i| if i % 2 == 0 { 0.25 } else { -0.25 }).collect();
    SeekerSonicAudioData::from_samples(samples, RATE, 1).unwrap()
}

pub fn loader() -> InMemoryLoader {
    InMemoryLoader::new()
        .with_asset("s/cr1.wav", tone(0.5))
        .with_asset("s/cr2.wav", tone(0.25))
        .with_asset("s/fox3.wav", tone(0.25))
        .with_asset("s/m3-1.wav", tone(0.5))
        .with_asset("s/m3-2.wav", tone(0.5))
        .with_asset("s/boom.wav", tone(1.0))
}

pub fn audio() -> AudioDeviceManager {
    audio_with(loader())
}

/// Route `log` output through the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn audio_with(loader: InMemoryLoader) -> AudioDeviceManager {
    init_logging();
    let mut audio = AudioDeviceManager::new(AudioDesc::headless(RATE, 2), Box::new(loader));
    audio.initialize("").unwrap();
    audio
}

/// Render every device until nothing is playing (or a bound is hit).
pub fn drain(audio: &AudioDeviceManager) {
    for _ in 0..100 {
        if audio.device(DeviceKind::Primary).unwrap().playing_count() == 0 {
            return;
        }
        audio.render_all(RATE as usize / 10).unwrap();
    }
}

pub struct TestTarget {
    pub id: TargetId,
    pub position: Cell<Vec3>,
    pub valid: Cell<bool>,
    pub class: TargetClass,
    pub aircraft: bool,
}

impl TestTarget {
    pub fn new(id: u64, position: Vec3) -> Rc<Self> {
        Self::with_class(id, position, TargetClass::Standard)
    }

    pub fn with_class(id: u64, position: Vec3, class: TargetClass) -> Rc<Self> {
        Rc::new(Self {
            id: TargetId(id),
            position: Cell::new(position),
            valid: Cell::new(true),
            class,
            aircraft: true,
        })
    }

    pub fn ground(id: u64, position: Vec3) -> Rc<Self> {
        Rc::new(Self {
            id: TargetId(id),
            position: Cell::new(position),
            valid: Cell::new(true),
            class: TargetClass::Standard,
            aircraft: false,
        })
    }
}

impl Target for TestTarget {
    fn id(&self) -> TargetId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.position.get()
    }

    fn is_valid_lock(&self) -> bool {
        self.valid.get()
    }

    fn class(&self) -> TargetClass {
        self.class
    }

    fn is_aircraft(&self) -> bool {
        self.aircraft
    }
}

pub fn weak(target: &Rc<TestTarget>) -> Weak<dyn Target> {
    let strong: Rc<dyn Target> = target.clone();
    Rc::downgrade(&strong)
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    pub notifications: Vec<(TargetId, Notification, bool)>,
    pub hits: Vec<(TargetId, i32)>,
    pub disposed: Vec<WeaponId>,
    pub launch_effects: usize,
}

impl WeaponHost for RecordingHost {
    fn notify_of(&mut self, target: TargetId, notification: Notification, flag: bool) {
        self.notifications.push((target, notification, flag));
    }

    fn fire_hit_event(&mut self, target: TargetId, amount: i32) {
        self.hits.push((target, amount));
    }

    fn weapon_disposed(&mut self, weapon: WeaponId) {
        self.disposed.push(weapon);
    }

    fn start_launch_effect(&mut self) {
        self.launch_effects += 1;
    }
}

/// Host state for driving a projectile through ticks.
pub struct Rig {
    pub audio: AudioDeviceManager,
    pub host: RecordingHost,
    pub rng: StdRng,
    pub now: i64,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_audio(audio())
    }

    pub fn with_audio(audio: AudioDeviceManager) -> Self {
        Self {
            audio,
            host: RecordingHost::default(),
            rng: StdRng::seed_from_u64(11),
            now: 1_000,
        }
    }

    pub fn missile(&self, controller: Controller, position: Vec3) -> GuidedProjectile {
        self.missile_with(controller, position, GuidedMissileTuning::default())
    }

    pub fn missile_with(
        &self,
        controller: Controller,
        position: Vec3,
        tuning: GuidedMissileTuning,
    ) -> GuidedProjectile {
        let launcher = Launcher {
            position,
            controller,
            flying: false,
        };
        GuidedProjectile::with_tuning(WeaponId(1), launcher, tuning, Default::default(), &self.audio)
            .unwrap()
    }

    /// Context at the current time without advancing it.
    pub fn ctx(&mut self, dt: Duration) -> TickContext<'_> {
        TickContext::new(self.now, dt, &self.audio, &mut self.host, &mut self.rng)
    }

    pub fn fire(&mut self, missile: &mut GuidedProjectile) {
        let mut ctx = self.ctx(Duration::ZERO);
        missile.fire(&mut ctx).unwrap();
    }

    /// Advance simulated time by `dt` and tick once.
    pub fn tick(&mut self, missile: &mut GuidedProjectile, dt: Duration) {
        self.now += dt.as_millis() as i64;
        let mut ctx = self.ctx(dt);
        missile.tick(&mut ctx).unwrap();
    }
}
