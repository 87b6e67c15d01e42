use anyhow::{Context, Result};
use seekersonic::audio_data::{DefaultAudioLoader, InMemoryLoader};
use seekersonic::{
    AudioDataLoader, AudioDesc, AudioDeviceManager, AudioEvent, Controller, DeviceKind,
    GuidedProjectile, Launcher, Notification, ProjectileState, SeekerSonicAudioData, Target,
    TargetClass, TargetId, TickContext, Vec3, WeaponHost, WeaponId,
};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

const HEADLESS_RATE: u32 = 22_050;
const TICK: Duration = Duration::from_millis(500);
const MAX_TICKS: usize = 400;

pub enum Mode {
    Headless,
    Hardware { root: String },
}

/// An aircraft flying a straight line at constant velocity.
struct Jet {
    id: TargetId,
    position: Cell<Vec3>,
    velocity: Vec3,
}

impl Jet {
    fn step(&self, dt: Duration) {
        self.position
            .set(self.position.get() + self.velocity * dt.as_secs_f32());
    }
}

impl Target for Jet {
    fn id(&self) -> TargetId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.position.get()
    }

    fn is_valid_lock(&self) -> bool {
        true
    }

    fn class(&self) -> TargetClass {
        TargetClass::Standard
    }
}

#[derive(Default)]
struct DemoHost {
    disposed: Option<WeaponId>,
    damage_dealt: i32,
}

impl WeaponHost for DemoHost {
    fn notify_of(&mut self, target: TargetId, notification: Notification, flag: bool) {
        log::info!("{} warned: {:?} ({})", target, notification, flag);
    }

    fn fire_hit_event(&mut self, target: TargetId, amount: i32) {
        log::info!("{} takes {} damage", target, amount);
        self.damage_dealt = self.damage_dealt.saturating_add(amount);
    }

    fn weapon_disposed(&mut self, weapon: WeaponId) {
        log::info!("{} can be removed", weapon);
        self.disposed = Some(weapon);
    }

    fn start_launch_effect(&mut self) {
        log::info!("Launch rumble");
    }
}

/// A decaying tone standing in for a recorded cue.
fn synth(seconds: f32, frequency: f32) -> Result<SeekerSonicAudioData> {
    let frames = (seconds * HEADLESS_RATE as f32) as usize;
    let samples = (0..frames)
        .map(|i| {
            let t = i as f32 / HEADLESS_RATE as f32;
            let envelope = 1.0 - i as f32 / frames as f32;
            (t * frequency * std::f32::consts::TAU).sin() * 0.4 * envelope
        })
        .collect();
    Ok(SeekerSonicAudioData::from_samples(samples, HEADLESS_RATE, 1)?)
}

fn synthesized_cues() -> Result<InMemoryLoader> {
    Ok(InMemoryLoader::new()
        .with_asset("s/cr1.wav", synth(1.5, 110.0)?)
        .with_asset("s/cr2.wav", synth(0.75, 220.0)?)
        .with_asset("s/fox3.wav", synth(0.5, 880.0)?)
        .with_asset("s/m3-1.wav", synth(2.0, 55.0)?)
        .with_asset("s/m3-2.wav", synth(2.5, 65.0)?))
}

pub fn run_engagement(mode: Mode) -> Result<()> {
    let (desc, loader, root): (AudioDesc, Box<dyn AudioDataLoader>, String) = match mode {
        Mode::Headless => (
            AudioDesc::headless(HEADLESS_RATE, 2),
            Box::new(synthesized_cues()?),
            String::new(),
        ),
        Mode::Hardware { root } => (AudioDesc::default(), Box::new(DefaultAudioLoader), root),
    };
    let headless = matches!(desc.output, seekersonic::OutputMode::Headless { .. });

    let mut audio = AudioDeviceManager::new(desc, loader);
    audio
        .initialize(&root)
        .context("Failed to open the playback devices")?;
    log::info!(
        "Audio up, speaker layout {:?}",
        audio.speaker_configuration()?
    );

    audio.play_and_wait(&audio.sound_path("fox3.wav")?, Some(Duration::from_secs(5)))?;

    let jet = Rc::new(Jet {
        id: TargetId(7),
        position: Cell::new(Vec3::new(-2.0, 6.0, 40.0)),
        velocity: Vec3::new(0.05, 0.0, 0.0),
    });
    let strong: Rc<dyn Target> = jet.clone();
    let target: Weak<dyn Target> = Rc::downgrade(&strong);

    let launcher = Launcher {
        position: Vec3::ZERO,
        controller: Controller::Player,
        flying: false,
    };
    let mut missile = GuidedProjectile::new(WeaponId(1), launcher, &audio)?;
    missile.lock_on(target);

    // The listener stands at the launcher and hears the missile fly off.
    audio.set_listener_position(Vec3::ZERO)?;

    let mut host = DemoHost::default();
    let mut rng = rand::thread_rng();
    let mut now: i64 = 0;
    let frames_per_tick = (audio.device(DeviceKind::Primary)?.sample_rate() as f32
        * TICK.as_secs_f32()) as usize;

    {
        let mut ctx = TickContext::new(now, Duration::ZERO, &audio, &mut host, &mut rng);
        missile.fire(&mut ctx)?;
    }

    let mut last_state = missile.state();
    for tick in 0..MAX_TICKS {
        now += TICK.as_millis() as i64;
        jet.step(TICK);

        let mut ctx = TickContext::new(now, TICK, &audio, &mut host, &mut rng);
        if let Err(err) = missile.tick(&mut ctx) {
            log::warn!("Tick {} failed: {}", tick, err);
        }

        if missile.state() != last_state {
            log::info!("{} -> {}", last_state, missile.state());
            last_state = missile.state();
        }

        if headless {
            audio.render_all(frames_per_tick)?;
        } else {
            std::thread::sleep(TICK);
        }
        for event in audio.poll_events() {
            match event {
                AudioEvent::StreamError { device, error } => {
                    log::error!("{} device: {}", device, error)
                }
                other => log::debug!("{:?}", other),
            }
        }

        if host.disposed.is_some() {
            break;
        }
    }

    if missile.state() != ProjectileState::Finished {
        log::warn!("Engagement did not finish within {} ticks", MAX_TICKS);
    }
    log::info!(
        "Flew {:.2} units, dealt {} damage",
        missile.total_distance(),
        host.damage_dealt
    );

    missile.free(&audio);
    audio.teardown();
    Ok(())
}
