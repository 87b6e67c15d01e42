//! The process-scoped audio context: three playback devices, the listener and
//! the asset source, with an explicit initialize/teardown lifecycle.

use crate::audio_data::AudioDataLoader;
use crate::buffer::{AudioBuffer, LifecycleLock, SoundSlot, hold_lifecycle};
use crate::config::AudioDesc;
use crate::device::{DeviceKind, PlaybackDevice};
use crate::error::{Result, SeekerSonicError};
use crate::events::AudioEvent;
use crate::math::Vec3;
use crate::music::MusicChain;
use crate::spatial::{Emitter, Listener, SpatialAudioEngine};
use crate::speaker::SpeakerConfiguration;
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Host-facing volume controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChannel {
    /// The music device
    Music,
    /// The primary device. The always-loud device is not affected.
    Effects,
}

struct Devices {
    primary: PlaybackDevice,
    music: PlaybackDevice,
    always_loud: PlaybackDevice,
    spatial: SpatialAudioEngine,
    root: PathBuf,
}

impl Devices {
    fn get(&self, kind: DeviceKind) -> &PlaybackDevice {
        match kind {
            DeviceKind::Primary => &self.primary,
            DeviceKind::Music => &self.music,
            DeviceKind::AlwaysLoud => &self.always_loud,
        }
    }
}

enum Lifecycle {
    Uninitialized,
    Running(Devices),
    TornDown,
}

/// Owner of the audio devices and the listener.
///
/// Created uninitialized. [`initialize`](Self::initialize) opens the devices once,
/// [`teardown`](Self::teardown) closes them once. Every other operation errors
/// with [`SeekerSonicError::DeviceState`] outside that window, except the
/// idempotent [`unload`](Self::unload) and the event queue.
///
/// Hardware devices own cpal streams, which are not `Send`. Hosts keep the
/// manager on one thread and pass it by reference to whatever needs audio.
pub struct AudioDeviceManager {
    desc: AudioDesc,
    loader: Box<dyn AudioDataLoader>,
    /// Serializes buffer loads and disposals. Shared with every loaded buffer.
    lifecycle_lock: LifecycleLock,
    state: Lifecycle,
    event_sender: Sender<AudioEvent>,
    event_receiver: Receiver<AudioEvent>,
}

impl AudioDeviceManager {
    pub fn new(desc: AudioDesc, loader: Box<dyn AudioDataLoader>) -> Self {
        let (event_sender, event_receiver) = crossbeam_channel::unbounded();
        Self {
            desc,
            loader,
            lifecycle_lock: Arc::new(Mutex::new(())),
            state: Lifecycle::Uninitialized,
            event_sender,
            event_receiver,
        }
    }

    pub fn desc(&self) -> &AudioDesc {
        &self.desc
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, Lifecycle::Running(_))
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(self.state, Lifecycle::TornDown)
    }

    /// Open the primary, music and always-loud devices and derive the speaker
    /// configuration from the primary device's channel layout.
    ///
    /// `root` is the directory the sound path conventions are resolved against.
    ///
    /// # Errors
    ///
    /// `DeviceState` when called a second time, `Configuration` for an invalid
    /// descriptor, `AudioDevice` when a hardware device cannot be opened.
    pub fn initialize(&mut self, root: impl AsRef<Path>) -> Result<()> {
        match self.state {
            Lifecycle::Uninitialized => {}
            Lifecycle::Running(_) => {
                return Err(SeekerSonicError::DeviceState(
                    "Audio devices are already initialized".into(),
                ));
            }
            Lifecycle::TornDown => {
                return Err(SeekerSonicError::DeviceState(
                    "Audio devices were torn down and cannot be reinitialized".into(),
                ));
            }
        }
        self.desc.validate()?;

        let primary = PlaybackDevice::open(DeviceKind::Primary, &self.desc, self.event_sender.clone())?;
        let music = PlaybackDevice::open(DeviceKind::Music, &self.desc, self.event_sender.clone())?;
        let always_loud =
            PlaybackDevice::open(DeviceKind::AlwaysLoud, &self.desc, self.event_sender.clone())?;

        let spatial = SpatialAudioEngine::for_channels(primary.channels(), &self.desc);
        log::info!(
            "Audio initialized: speaker configuration {:?} over {} channels, root '{}'",
            spatial.speaker_configuration(),
            primary.channels(),
            root.as_ref().display()
        );

        self.state = Lifecycle::Running(Devices {
            primary,
            music,
            always_loud,
            spatial,
            root: root.as_ref().to_path_buf(),
        });
        Ok(())
    }

    fn running(&self) -> Result<&Devices> {
        match &self.state {
            Lifecycle::Running(devices) => Ok(devices),
            Lifecycle::Uninitialized => Err(SeekerSonicError::DeviceState(
                "Audio devices are not initialized".into(),
            )),
            Lifecycle::TornDown => Err(SeekerSonicError::DeviceState(
                "Audio devices were torn down".into(),
            )),
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        hold_lifecycle(&self.lifecycle_lock)
    }

    pub fn device(&self, kind: DeviceKind) -> Result<&PlaybackDevice> {
        Ok(self.running()?.get(kind))
    }

    pub fn spatial(&self) -> Result<&SpatialAudioEngine> {
        Ok(&self.running()?.spatial)
    }

    /// `None` when the primary device's layout is unrecognized.
    pub fn speaker_configuration(&self) -> Result<Option<SpeakerConfiguration>> {
        Ok(self.running()?.spatial.speaker_configuration())
    }

    /// `<root>/s/<name>`
    pub fn sound_path(&self, name: &str) -> Result<String> {
        let devices = self.running()?;
        Ok(path_string(devices.root.join(&self.desc.sound_dir).join(name)))
    }

    /// `<root>/s/n/<name>`
    pub fn narrative_path(&self, name: &str) -> Result<String> {
        let devices = self.running()?;
        Ok(path_string(
            devices
                .root
                .join(&self.desc.sound_dir)
                .join(&self.desc.narrative_dir)
                .join(name),
        ))
    }

    /// `<root>/s/n/ns/<name>`
    pub fn numbers_path(&self, name: &str) -> Result<String> {
        let devices = self.running()?;
        Ok(path_string(
            devices
                .root
                .join(&self.desc.sound_dir)
                .join(&self.desc.narrative_dir)
                .join(&self.desc.numbers_dir)
                .join(name),
        ))
    }

    /// Load `path` onto the chosen device.
    pub fn load_on_device(&self, path: &str, device: DeviceKind) -> Result<AudioBuffer> {
        let _guard = self.lock_lifecycle();
        let devices = self.running()?;
        AudioBuffer::load(path, devices.get(device), self.loader.as_ref())
            .map(|buffer| buffer.guarded_by(self.lifecycle_lock.clone()))
            .inspect_err(|e| {
                log::warn!("Failed to load '{}' on {} device: {}", path, device, e);
            })
    }

    /// Load `path` onto the primary device.
    pub fn load(&self, path: &str) -> Result<AudioBuffer> {
        self.load_on_device(path, DeviceKind::Primary)
    }

    pub fn load_always_loud(&self, path: &str) -> Result<AudioBuffer> {
        self.load_on_device(path, DeviceKind::AlwaysLoud)
    }

    /// Load a chain of tracks onto the music device at a starting `volume`.
    ///
    /// The tracks play once each in order and the last one loops. Nothing
    /// plays until [`MusicChain::play`]. Feed [`poll_events`](Self::poll_events)
    /// to [`MusicChain::update`] to move through the chain.
    ///
    /// # Errors
    ///
    /// `Configuration` for an empty path list, otherwise the first load error.
    /// Tracks loaded before a failure are released.
    pub fn load_music_chain(&self, volume: f32, paths: &[&str]) -> Result<MusicChain> {
        let devices = self.running()?;
        if paths.is_empty() {
            return Err(SeekerSonicError::Configuration(
                "A music chain needs at least one track".into(),
            ));
        }
        let tracks = paths
            .iter()
            .map(|path| self.load_on_device(path, DeviceKind::Music))
            .collect::<Result<Vec<_>>>()?;
        log::info!("Loaded music chain of {} track(s) at volume {}", tracks.len(), volume);
        Ok(MusicChain::new(tracks, volume, devices.music.channels() as usize))
    }

    /// Stop, dispose and empty `slot`. A no-op for an empty slot, and valid in
    /// any lifecycle state. The disposal itself takes the lifecycle lock.
    pub fn unload(&self, slot: &mut SoundSlot) {
        slot.unload();
    }

    pub fn listener(&self) -> Result<Listener> {
        Ok(self.running()?.spatial.listener())
    }

    pub fn set_listener_position(&self, position: Vec3) -> Result<()> {
        self.running()?.spatial.set_listener_position(position);
        Ok(())
    }

    /// `front` and `top` must be unit length and orthogonal.
    pub fn set_listener_orientation(&self, front: Vec3, top: Vec3) -> Result<()> {
        self.running()?.spatial.set_listener_orientation(front, top);
        Ok(())
    }

    pub fn set_listener_velocity(&self, velocity: Vec3) -> Result<()> {
        self.running()?.spatial.set_listener_velocity(velocity);
        Ok(())
    }

    /// Back to the origin, facing +z with +y up.
    pub fn reset_listener(&self) -> Result<()> {
        self.running()?.spatial.reset_listener();
        Ok(())
    }

    /// Set a device-level gain in `[0, 1]`.
    pub fn set_master_volume(&self, channel: VolumeChannel, level: f32) -> Result<()> {
        let devices = self.running()?;
        let device = match channel {
            VolumeChannel::Music => &devices.music,
            VolumeChannel::Effects => &devices.primary,
        };
        device.set_master_volume(level);
        log::debug!("{:?} volume set to {}", channel, device.master_volume());
        Ok(())
    }

    /// Non-positional playback.
    pub fn play_sound(&self, buffer: &AudioBuffer, reset: bool, looping: bool) -> Result<()> {
        self.running()?;
        buffer.play(reset, looping)
    }

    /// Play `buffer` as a point source at `position` relative to the listener.
    pub fn play_sound_3d(
        &self,
        buffer: &AudioBuffer,
        reset: bool,
        looping: bool,
        position: Vec3,
    ) -> Result<()> {
        let devices = self.running()?;
        let placement = devices.spatial.place(&Emitter::point(position));
        buffer.play(reset, looping)?;
        buffer.apply_spatial_parameters(&placement.matrix, placement.doppler_factor);
        Ok(())
    }

    /// Place a moving point source. Same as [`play_sound_3d`](Self::play_sound_3d)
    /// but the emitter's velocity feeds the Doppler factor.
    pub fn play_emitter(
        &self,
        buffer: &AudioBuffer,
        reset: bool,
        looping: bool,
        emitter: &Emitter,
    ) -> Result<()> {
        let devices = self.running()?;
        let placement = devices.spatial.place(emitter);
        buffer.play(reset, looping)?;
        buffer.apply_spatial_parameters(&placement.matrix, placement.doppler_factor);
        Ok(())
    }

    /// Stereo pan in `[-1, 1]`, -1 fully left.
    pub fn set_pan(&self, buffer: &AudioBuffer, pan: f32) -> Result<()> {
        let devices = self.running()?;
        buffer.set_output_matrix(&devices.spatial.pan_stereo(pan));
        Ok(())
    }

    /// Load `path` on the primary device, play it once and block until it stops.
    ///
    /// Playback state is polled every `wait_poll_interval`. A hardware device
    /// sleeps between polls. A headless device is rendered for one poll interval
    /// instead, so the wait advances simulated time. The buffer is disposed
    /// whatever the outcome.
    ///
    /// # Errors
    ///
    /// `PlaybackTimeout` when the cue is still playing after `timeout` (the
    /// descriptor's `wait_timeout` when `None`), plus any load error.
    pub fn play_and_wait(&self, path: &str, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(self.desc.wait_timeout);
        let poll = self.desc.wait_poll_interval;
        let buffer = self.load(path)?;
        let mut slot = SoundSlot::from(buffer);

        let outcome = self.wait_until_stopped(&slot, poll, timeout);
        if let Err(SeekerSonicError::PlaybackTimeout { .. }) = &outcome {
            log::warn!("'{}' still playing after {:?}, giving up", path, timeout);
        }
        self.unload(&mut slot);
        outcome
    }

    fn wait_until_stopped(&self, slot: &SoundSlot, poll: Duration, timeout: Duration) -> Result<()> {
        let Some(buffer) = slot.get() else {
            return Ok(());
        };
        buffer.play(true, false)?;

        let primary = self.device(DeviceKind::Primary)?;
        let poll_frames = (poll.as_secs_f64() * primary.sample_rate() as f64).ceil() as usize;
        let mut waited = Duration::ZERO;
        while buffer.is_playing() {
            if waited >= timeout {
                buffer.stop();
                return Err(SeekerSonicError::PlaybackTimeout {
                    path: buffer.path().to_string(),
                    waited,
                });
            }
            if primary.is_hardware() {
                std::thread::sleep(poll);
            } else {
                primary.render(poll_frames);
            }
            waited += poll;
        }
        Ok(())
    }

    /// Advance a headless device by `frames` and return the mixed block.
    /// Hardware devices render themselves and return an empty block.
    pub fn render(&self, device: DeviceKind, frames: usize) -> Result<Vec<f32>> {
        Ok(self.running()?.get(device).render(frames))
    }

    /// Advance every headless device by `frames`, discarding the output.
    pub fn render_all(&self, frames: usize) -> Result<()> {
        let devices = self.running()?;
        for kind in DeviceKind::ALL {
            devices.get(kind).render(frames);
        }
        Ok(())
    }

    /// Drain the voice completion, loop and stream error events of all devices.
    pub fn poll_events(&self) -> Vec<AudioEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Voices currently playing across all devices. Zero outside the
    /// initialized window.
    pub fn active_sound_count(&self) -> usize {
        match &self.state {
            Lifecycle::Running(devices) => DeviceKind::ALL
                .iter()
                .map(|kind| devices.get(*kind).playing_count())
                .sum(),
            _ => 0,
        }
    }

    /// Stop every voice, then close the music, primary and always-loud devices
    /// in that order. Later operations fail with `DeviceState`. A second call
    /// is a no-op.
    pub fn teardown(&mut self) {
        let state = std::mem::replace(&mut self.state, Lifecycle::TornDown);
        let Lifecycle::Running(mut devices) = state else {
            log::debug!("Teardown on audio devices that are not running");
            return;
        };

        for kind in DeviceKind::ALL {
            devices.get(kind).stop_all();
        }
        devices.music.close();
        devices.primary.close();
        devices.always_loud.close();
        log::info!("Audio devices torn down");
    }
}

impl Drop for AudioDeviceManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::{InMemoryLoader, SeekerSonicAudioData};

    const RATE: u32 = 8000;

    fn tone(seconds: f32) -> SeekerSonicAudioData {
        let frames = (seconds * RATE as f32) as usize;
        SeekerSonicAudioData::from_samples(vec![0.5; frames], RATE, 1).unwrap()
    }

    fn manager() -> AudioDeviceManager {
        crate::projectile::testing::init_logging();
        let loader = InMemoryLoader::new()
            .with_asset("s/short.wav", tone(0.25))
            .with_asset("s/long.wav", tone(5.0));
        let mut manager = AudioDeviceManager::new(AudioDesc::headless(RATE, 2), Box::new(loader));
        manager.initialize("").unwrap();
        manager
    }

    #[test]
    fn test_operations_before_initialize_fail() {
        let manager = AudioDeviceManager::new(AudioDesc::headless(RATE, 2), Box::new(InMemoryLoader::new()));
        assert!(manager.load("s/short.wav").unwrap_err().is_device_state());
        assert!(manager.listener().unwrap_err().is_device_state());
        assert_eq!(manager.active_sound_count(), 0);
    }

    #[test]
    fn test_second_initialize_is_rejected() {
        let mut manager = manager();
        assert!(manager.initialize("").unwrap_err().is_device_state());
    }

    #[test]
    fn test_teardown_is_final_and_idempotent() {
        let mut manager = manager();
        let buffer = manager.load("s/short.wav").unwrap();
        manager.play_sound(&buffer, true, true).unwrap();
        assert_eq!(manager.active_sound_count(), 1);

        manager.teardown();
        manager.teardown();
        assert!(manager.is_torn_down());
        assert!(!buffer.is_playing());
        assert!(manager.play_sound(&buffer, true, false).unwrap_err().is_device_state());
        assert!(manager.initialize("").unwrap_err().is_device_state());
    }

    #[test]
    fn test_speaker_configuration_from_primary_channels() {
        let manager = manager();
        assert_eq!(
            manager.speaker_configuration().unwrap(),
            Some(SpeakerConfiguration::Stereo)
        );

        let mut odd = AudioDeviceManager::new(AudioDesc::headless(RATE, 7), Box::new(InMemoryLoader::new()));
        odd.initialize("").unwrap();
        assert_eq!(odd.speaker_configuration().unwrap(), None);
    }

    #[test]
    fn test_path_conventions() {
        let loader = Box::new(InMemoryLoader::new());
        let mut manager = AudioDeviceManager::new(AudioDesc::headless(RATE, 2), loader);
        manager.initialize("game").unwrap();
        let expected = |parts: &[&str]| path_string(parts.iter().collect::<PathBuf>());
        assert_eq!(manager.sound_path("cr1.wav").unwrap(), expected(&["game", "s", "cr1.wav"]));
        assert_eq!(
            manager.narrative_path("intro.wav").unwrap(),
            expected(&["game", "s", "n", "intro.wav"])
        );
        assert_eq!(
            manager.numbers_path("7.wav").unwrap(),
            expected(&["game", "s", "n", "ns", "7.wav"])
        );
    }

    #[test]
    fn test_play_sound_3d_places_by_listener() {
        let manager = manager();
        let buffer = manager.load("s/long.wav").unwrap();
        manager
            .play_sound_3d(&buffer, true, false, Vec3::new(10.0, 0.0, 0.0))
            .unwrap();
        let block = manager.render(DeviceKind::Primary, 4).unwrap();
        assert!(block[1] > block[0], "{:?}", block);

        manager.set_listener_orientation(Vec3::NEG_Z, Vec3::Y).unwrap();
        manager
            .play_sound_3d(&buffer, false, false, Vec3::new(10.0, 0.0, 0.0))
            .unwrap();
        let block = manager.render(DeviceKind::Primary, 4).unwrap();
        assert!(block[0] > block[1], "{:?}", block);

        manager.reset_listener().unwrap();
        assert_eq!(manager.listener().unwrap(), Listener::default());
    }

    #[test]
    fn test_set_pan_and_volume() {
        let manager = manager();
        let buffer = manager.load("s/long.wav").unwrap();
        manager.play_sound(&buffer, true, false).unwrap();
        manager.set_pan(&buffer, 1.0).unwrap();
        manager.set_master_volume(VolumeChannel::Effects, 0.5).unwrap();
        let block = manager.render(DeviceKind::Primary, 2).unwrap();
        assert_eq!(block[0], 0.0);
        assert!((block[1] - 0.25).abs() < 1e-6);

        manager.set_master_volume(VolumeChannel::Music, 7.0).unwrap();
        assert_eq!(manager.device(DeviceKind::Music).unwrap().master_volume(), 1.0);
        assert_eq!(manager.device(DeviceKind::AlwaysLoud).unwrap().master_volume(), 1.0);
    }

    #[test]
    fn test_play_and_wait_completes_and_disposes() {
        let manager = manager();
        manager.play_and_wait("s/short.wav", None).unwrap();
        assert_eq!(manager.device(DeviceKind::Primary).unwrap().voice_count(), 0);
        assert!(manager.poll_events().iter().any(|e| matches!(e, AudioEvent::VoiceCompleted { .. })));
    }

    #[test]
    fn test_play_and_wait_times_out_and_disposes() {
        let manager = manager();
        let err = manager
            .play_and_wait("s/long.wav", Some(Duration::from_millis(300)))
            .unwrap_err();
        assert!(matches!(err, SeekerSonicError::PlaybackTimeout { .. }));
        assert_eq!(manager.device(DeviceKind::Primary).unwrap().voice_count(), 0);
    }

    #[test]
    fn test_play_and_wait_missing_asset() {
        let manager = manager();
        let err = manager.play_and_wait("s/missing.wav", None).unwrap_err();
        assert!(matches!(err, SeekerSonicError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_load_always_loud_ignores_effects_volume() {
        let manager = manager();
        manager.set_master_volume(VolumeChannel::Effects, 0.0).unwrap();
        let buffer = manager.load_always_loud("s/long.wav").unwrap();
        assert_eq!(buffer.device(), DeviceKind::AlwaysLoud);
        manager.play_sound(&buffer, true, false).unwrap();
        let block = manager.render(DeviceKind::AlwaysLoud, 1).unwrap();
        assert_eq!(block[0], 0.5);
    }

    #[test]
    fn test_unload_through_manager() {
        let manager = manager();
        let mut slot = SoundSlot::from(manager.load("s/short.wav").unwrap());
        manager.unload(&mut slot);
        manager.unload(&mut slot);
        assert!(slot.is_empty());
        assert_eq!(manager.device(DeviceKind::Primary).unwrap().voice_count(), 0);
    }

    #[test]
    fn test_dropped_buffer_waits_for_lifecycle_lock() {
        let manager = manager();
        let buffer = manager.load("s/short.wav").unwrap();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        let guard = manager.lock_lifecycle();
        let dropper = std::thread::spawn(move || {
            drop(buffer);
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(manager.device(DeviceKind::Primary).unwrap().voice_count(), 1);

        drop(guard);
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        dropper.join().unwrap();
        assert_eq!(manager.device(DeviceKind::Primary).unwrap().voice_count(), 0);
    }
}
