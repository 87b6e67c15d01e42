//! # SeekerSonic
//!
//! Guided-projectile simulation with positional audio cues mixed for the
//! speaker layout actually attached to the machine.
//!
//! The audio layer opens three playback devices (primary, music, always-loud),
//! loads cues into [`AudioBuffer`]s, and places 3-D cues by computing a per-speaker
//! gain matrix and a Doppler pitch ratio from the listener and emitter geometry.
//! The projectile layer drives a homing missile through launch, arming delay,
//! tracking, impact or lost lock, and disposal, speaking through those cues.
//!
//! ## Quick Start
//!
//! ```no_run
//! use seekersonic::*;
//! use seekersonic::audio_data::DefaultAudioLoader;
//!
//! let mut audio = AudioDeviceManager::new(AudioDesc::default(), Box::new(DefaultAudioLoader));
//! audio.initialize("assets")?;
//!
//! let boom = audio.load(&audio.sound_path("boom.wav")?)?;
//! audio.set_listener_position(Vec3::ZERO)?;
//! audio.play_sound_3d(&boom, true, false, Vec3::new(5.0, 20.0, 0.0))?;
//!
//! for event in audio.poll_events() {
//!     if let AudioEvent::VoiceCompleted { voice_id, .. } = event {
//!         println!("{} finished", voice_id);
//!     }
//! }
//! # Ok::<(), SeekerSonicError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`AudioDeviceManager`]**: Owns the devices and the spatial engine, loads and plays cues
//! - **[`AudioBuffer`]** / **[`SoundSlot`]**: One loaded cue bound to a device, and an optional holder for one
//! - **[`MusicChain`]**: Tracks played in order on the music device, the last one looped
//! - **[`SpatialAudioEngine`]**: Listener state and gain matrix / Doppler computation
//! - **[`SpeakerConfiguration`]**: The supported speaker topologies
//! - **[`GuidedProjectile`]**: The homing missile state machine
//! - **[`WeaponHost`]** / **[`Target`]**: What the game supplies to a weapon
//!
//! ## Threading
//!
//! The manager and everything in the projectile layer live on the simulation
//! thread. Each hardware device mixes its voices from the cpal callback through a
//! shared voice table. A headless device has no callback and is advanced with
//! [`AudioDeviceManager::render`], which keeps tests and offline runs
//! deterministic.

pub mod audio_data;
pub mod buffer;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod manager;
pub mod math;
pub mod mixer;
pub mod music;
pub mod playback;
pub mod projectile;
pub mod spatial;
pub mod speaker;

pub use audio_data::{AudioDataLoader, SeekerSonicAudioData};
pub use buffer::{AudioBuffer, SoundSlot};
pub use config::{AudioDesc, GuidedMissileCues, GuidedMissileTuning, OutputMode};
pub use device::{DeviceKind, PlaybackDevice};
pub use error::{Result, SeekerSonicError};
pub use events::AudioEvent;
pub use manager::{AudioDeviceManager, VolumeChannel};
pub use math::{Orientation, Vec2, Vec3};
pub use music::MusicChain;
pub use playback::{LoopMode, PlayState, VoiceId};
pub use projectile::{
    Controller, FlightState, GuidedProjectile, Launcher, Notification, ProjectileState,
    RandomSource, SimTime, Target, TargetClass, TargetId, TickContext, Weapon, WeaponHost,
    WeaponId, WeaponKind,
};
pub use spatial::{Emitter, GainMatrix, Listener, Placement, SpatialAudioEngine};
pub use speaker::{Speaker, SpeakerConfiguration};
