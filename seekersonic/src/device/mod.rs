//! Playback devices: a voice table, a master volume and (in hardware mode) an
//! output stream that renders the table.

mod output;

use crate::audio_data::SeekerSonicAudioData;
use crate::config::{AudioDesc, OutputMode};
use crate::error::Result;
use crate::events::AudioEvent;
use crate::mixer::{MixResult, mix_voices};
use crate::playback::{Voice, VoiceId};
use crossbeam_channel::Sender;
use output::HardwareOutput;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Which of the three devices a cue plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Effects and positional cues. Its channel count decides the speaker configuration.
    Primary,
    Music,
    /// Cues that must stay audible regardless of the effects volume
    AlwaysLoud,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [Self::Primary, Self::Music, Self::AlwaysLoud];
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Music => "music",
            Self::AlwaysLoud => "always-loud",
        };
        f.write_str(name)
    }
}

pub(crate) type VoiceTable = Arc<Mutex<HashMap<VoiceId, Voice>>>;

/// Lock a voice table from the host side, recovering from poisoning.
pub(crate) fn lock_table(voices: &Mutex<HashMap<VoiceId, Voice>>) -> MutexGuard<'_, HashMap<VoiceId, Voice>> {
    voices.lock().unwrap_or_else(|e| {
        log::warn!("Voice table was poisoned, recovering");
        e.into_inner()
    })
}

/// Master volume stored as the bit pattern of an `f32`, readable from the audio thread.
#[derive(Debug)]
pub(crate) struct SharedVolume(AtomicU32);

impl SharedVolume {
    fn new(level: f32) -> Self {
        Self(AtomicU32::new(level.to_bits()))
    }

    pub(crate) fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, level: f32) {
        self.0.store(level.to_bits(), Ordering::Relaxed);
    }
}

/// Forward the end-of-data notices of one mix pass to the event queue.
pub(crate) fn publish_mix_events(kind: DeviceKind, result: &MixResult, events: &Sender<AudioEvent>) {
    for voice_id in &result.completed_voices {
        let _ = events.send(AudioEvent::VoiceCompleted {
            device: kind,
            voice_id: *voice_id,
        });
    }
    for voice_id in &result.looped_voices {
        let _ = events.send(AudioEvent::VoiceLooped {
            device: kind,
            voice_id: *voice_id,
        });
    }
}

/// One output device and the voices bound to it.
pub struct PlaybackDevice {
    kind: DeviceKind,
    sample_rate: u32,
    channels: u16,
    max_frequency_ratio: f32,
    voices: VoiceTable,
    volume: Arc<SharedVolume>,
    events: Sender<AudioEvent>,
    /// `None` in headless mode
    output: Option<HardwareOutput>,
}

impl PlaybackDevice {
    /// Open a device of `kind` in the descriptor's output mode.
    ///
    /// Hardware devices take their sample rate and channel count from the
    /// default cpal output device.
    pub fn open(kind: DeviceKind, desc: &AudioDesc, events: Sender<AudioEvent>) -> Result<Self> {
        let voices: VoiceTable = Arc::new(Mutex::new(HashMap::new()));
        let volume = Arc::new(SharedVolume::new(1.0));

        let (sample_rate, channels, output) = match desc.output {
            OutputMode::Headless {
                sample_rate,
                channels,
            } => (sample_rate, channels, None),
            OutputMode::Hardware => {
                let output = HardwareOutput::open(
                    kind,
                    desc.block_size,
                    voices.clone(),
                    volume.clone(),
                    events.clone(),
                )?;
                (output.sample_rate(), output.channels(), Some(output))
            }
        };

        log::info!(
            "Opened {} device: {} Hz, {} channels ({})",
            kind,
            sample_rate,
            channels,
            if output.is_some() { "hardware" } else { "headless" }
        );

        Ok(Self {
            kind,
            sample_rate,
            channels,
            max_frequency_ratio: desc.max_frequency_ratio,
            voices,
            volume,
            events,
            output,
        })
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_hardware(&self) -> bool {
        self.output.is_some()
    }

    fn lock_voices(&self) -> MutexGuard<'_, HashMap<VoiceId, Voice>> {
        lock_table(&self.voices)
    }

    /// Shared handle to the voice table, held by the buffers bound to this device.
    pub(crate) fn voice_table(&self) -> VoiceTable {
        self.voices.clone()
    }

    /// Bind `data` to a new stopped voice. `data` must already be at the device rate.
    pub(crate) fn add_voice(&self, data: Arc<SeekerSonicAudioData>) -> VoiceId {
        let id = VoiceId::next();
        let voice = Voice::new(id, data, self.channels as usize, self.max_frequency_ratio);
        self.lock_voices().insert(id, voice);
        log::debug!("Bound {} to {} device", id, self.kind);
        id
    }

    /// Run `f` on a voice, or return `None` if it no longer exists.
    #[cfg(test)]
    pub(crate) fn with_voice<R>(&self, id: VoiceId, f: impl FnOnce(&mut Voice) -> R) -> Option<R> {
        self.lock_voices().get_mut(&id).map(f)
    }

    #[cfg(test)]
    pub(crate) fn remove_voice(&self, id: VoiceId) -> bool {
        self.lock_voices().remove(&id).is_some()
    }

    pub fn voice_count(&self) -> usize {
        self.lock_voices().len()
    }

    pub fn playing_count(&self) -> usize {
        self.lock_voices().values().filter(|v| v.is_playing()).count()
    }

    pub fn stop_all(&self) {
        for voice in self.lock_voices().values_mut() {
            voice.stop();
        }
    }

    pub fn master_volume(&self) -> f32 {
        self.volume.get()
    }

    /// Set the device gain, clamped to `[0, 1]`.
    pub fn set_master_volume(&self, level: f32) {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        self.volume.set(level);
    }

    /// Render `frames` frames of a headless device and return them interleaved.
    ///
    /// Hardware devices are rendered by their stream callback, so this returns
    /// an empty block for them.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        if self.is_hardware() {
            return Vec::new();
        }
        let mut block = vec![0.0; frames * self.channels as usize];
        let result = mix_voices(
            &mut block,
            self.channels as usize,
            &self.voices,
            self.volume.get(),
        );
        publish_mix_events(self.kind, &result, &self.events);
        block
    }

    /// Stop and drop every voice, then close the output stream.
    pub fn close(&mut self) {
        let mut voices = self.lock_voices();
        let count = voices.len();
        for voice in voices.values_mut() {
            voice.stop();
        }
        voices.clear();
        drop(voices);

        if let Some(output) = self.output.take() {
            output.close();
        }
        log::info!("Closed {} device ({} voices released)", self.kind, count);
    }
}

impl Drop for PlaybackDevice {
    fn drop(&mut self) {
        if self.output.is_some() {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AudioEvent;

    fn headless(kind: DeviceKind) -> (PlaybackDevice, crossbeam_channel::Receiver<AudioEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let device = PlaybackDevice::open(kind, &AudioDesc::headless(8000, 2), tx).unwrap();
        (device, rx)
    }

    fn tone(frames: usize) -> Arc<SeekerSonicAudioData> {
        Arc::new(SeekerSonicAudioData::from_samples(vec![0.5; frames], 8000, 1).unwrap())
    }

    #[test]
    fn test_headless_render_emits_completion() {
        let (device, events) = headless(DeviceKind::Primary);
        let id = device.add_voice(tone(100));
        device.with_voice(id, |v| v.resume());
        assert_eq!(device.playing_count(), 1);

        let block = device.render(200);
        assert_eq!(block.len(), 400);
        assert_eq!(block[0], 0.5);
        assert_eq!(device.playing_count(), 0);
        assert_eq!(
            events.try_recv().unwrap(),
            AudioEvent::VoiceCompleted {
                device: DeviceKind::Primary,
                voice_id: id
            }
        );
    }

    #[test]
    fn test_master_volume_is_clamped_and_applied() {
        let (device, _events) = headless(DeviceKind::Music);
        device.set_master_volume(4.0);
        assert_eq!(device.master_volume(), 1.0);
        device.set_master_volume(0.5);

        let id = device.add_voice(tone(100));
        device.with_voice(id, |v| v.resume());
        let block = device.render(10);
        assert_eq!(block[0], 0.25);
    }

    #[test]
    fn test_close_releases_voices() {
        let (mut device, _events) = headless(DeviceKind::AlwaysLoud);
        let id = device.add_voice(tone(10));
        device.close();
        assert_eq!(device.voice_count(), 0);
        assert!(device.with_voice(id, |v| v.is_playing()).is_none());
        assert!(!device.remove_voice(id));
    }
}
