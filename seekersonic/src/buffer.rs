//! Host-side handles to cues bound to a device.

use crate::audio_data::{AudioDataLoader, AudioFormat, LoadOptions};
use crate::device::{DeviceKind, PlaybackDevice, VoiceTable, lock_table};
use crate::error::{Result, SeekerSonicError};
use crate::playback::{LoopMode, VoiceId};
use crate::spatial::GainMatrix;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lock that serializes buffer loads and disposals of one audio context.
pub(crate) type LifecycleLock = Arc<Mutex<()>>;

pub(crate) fn hold_lifecycle(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

/// A decoded cue bound to one voice of a playback device.
///
/// Disposal removes the voice from the device and is permanent: every later
/// `play` fails with [`SeekerSonicError::DeviceState`] and `is_playing` reports
/// false. Dropping an undisposed buffer disposes it.
pub struct AudioBuffer {
    path: String,
    device: DeviceKind,
    voices: VoiceTable,
    /// `None` once disposed
    voice_id: Option<VoiceId>,
    format: AudioFormat,
    /// Held while disposing, when the buffer came from a manager
    lifecycle: Option<LifecycleLock>,
}

impl std::fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("path", &self.path)
            .field("device", &self.device)
            .field("voice_id", &self.voice_id)
            .field("format", &self.format)
            .finish()
    }
}

impl AudioBuffer {
    /// Decode `path` through `loader` and bind it to a new voice on `device`.
    ///
    /// The audio is resampled to the device rate. The buffer starts stopped.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` when the loader cannot resolve `path`, or the loader's
    /// decode and resampling errors.
    pub fn load(path: &str, device: &PlaybackDevice, loader: &dyn AudioDataLoader) -> Result<Self> {
        let options = LoadOptions::default().target_sample_rate(device.sample_rate());
        let mut data = loader.load(path, &options)?;
        if data.sample_rate() != device.sample_rate() {
            data = Arc::new(data.resample(device.sample_rate())?);
        }

        let format = data.format();
        let voice_id = device.add_voice(data);
        log::debug!(
            "Loaded '{}' on {} device as {} ({} frames)",
            path,
            device.kind(),
            voice_id,
            format.total_frames
        );

        Ok(Self {
            path: path.to_string(),
            device: device.kind(),
            voices: device.voice_table(),
            voice_id: Some(voice_id),
            format,
            lifecycle: None,
        })
    }

    /// Dispose under `lock`, including disposal on drop.
    pub(crate) fn guarded_by(mut self, lock: LifecycleLock) -> Self {
        self.lifecycle = Some(lock);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn voice_id(&self) -> Option<VoiceId> {
        self.voice_id
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_disposed(&self) -> bool {
        self.voice_id.is_none()
    }

    fn missing_voice(&self) -> SeekerSonicError {
        SeekerSonicError::DeviceState(format!(
            "'{}' is not bound to a live voice on the {} device",
            self.path, self.device
        ))
    }

    /// Start or resume playback.
    ///
    /// The cursor rewinds when `reset` is set, or when a one-shot already played
    /// to its end. Otherwise playback resumes where it stopped.
    pub fn play(&self, reset: bool, looping: bool) -> Result<()> {
        let id = self.voice_id.ok_or_else(|| self.missing_voice())?;
        let mut voices = lock_table(&self.voices);
        let voice = voices.get_mut(&id).ok_or_else(|| self.missing_voice())?;

        voice.set_loop_mode(if looping {
            LoopMode::Infinite
        } else {
            LoopMode::Once
        });
        if reset || voice.is_at_end() {
            voice.reset();
        }
        voice.resume();
        Ok(())
    }

    /// Stop playback. Stopping a stopped or disposed buffer is a no-op.
    pub fn stop(&self) {
        let Some(id) = self.voice_id else {
            return;
        };
        if let Some(voice) = lock_table(&self.voices).get_mut(&id) {
            voice.stop();
        }
    }

    /// Set the output matrix and pitch ratio without touching the play state.
    pub fn apply_spatial_parameters(&self, matrix: &GainMatrix, doppler_factor: f32) {
        let Some(id) = self.voice_id else {
            return;
        };
        if let Some(voice) = lock_table(&self.voices).get_mut(&id) {
            voice.set_output_matrix(matrix);
            voice.set_frequency_ratio(doppler_factor);
        }
    }

    /// Replace only the output matrix (stereo pan).
    pub fn set_output_matrix(&self, matrix: &GainMatrix) {
        let Some(id) = self.voice_id else {
            return;
        };
        if let Some(voice) = lock_table(&self.voices).get_mut(&id) {
            voice.set_output_matrix(matrix);
        }
    }

    pub fn is_playing(&self) -> bool {
        let Some(id) = self.voice_id else {
            return false;
        };
        lock_table(&self.voices)
            .get(&id)
            .is_some_and(|voice| voice.is_playing())
    }

    /// Release the voice. Idempotent.
    ///
    /// A buffer loaded through [`AudioDeviceManager`](crate::AudioDeviceManager)
    /// takes the manager's lifecycle lock first, so a drop on any path is
    /// serialized with loads and unloads.
    pub fn dispose(&mut self) {
        if let Some(id) = self.voice_id.take() {
            let _guard = self.lifecycle.as_deref().map(hold_lifecycle);
            lock_table(&self.voices).remove(&id);
            log::debug!("Disposed '{}' ({})", self.path, id);
        }
    }
}

impl Drop for AudioBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Optional owner of one [`AudioBuffer`].
///
/// Unloading stops and disposes the buffer and leaves the slot empty, so holders
/// test `is_loaded` instead of comparing against a disposed handle.
#[derive(Debug, Default)]
pub struct SoundSlot(Option<AudioBuffer>);

impl SoundSlot {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_loaded(&self) -> bool {
        self.0.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self) -> Option<&AudioBuffer> {
        self.0.as_ref()
    }

    /// Audible right now. An empty slot is never playing.
    pub fn is_playing(&self) -> bool {
        self.0.as_ref().is_some_and(AudioBuffer::is_playing)
    }

    /// Stop, dispose and empty. A no-op on an empty slot.
    pub(crate) fn unload(&mut self) {
        if let Some(mut buffer) = self.0.take() {
            buffer.stop();
            buffer.dispose();
        }
    }
}

impl From<AudioBuffer> for SoundSlot {
    fn from(buffer: AudioBuffer) -> Self {
        Self(Some(buffer))
    }
}
