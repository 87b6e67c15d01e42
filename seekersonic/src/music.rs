//! Background music on the music device.

use crate::buffer::AudioBuffer;
use crate::device::DeviceKind;
use crate::error::Result;
use crate::events::AudioEvent;
use crate::spatial::GainMatrix;

/// Tracks played one after another on the music device.
///
/// Every track but the last plays once. The last one loops until the chain is
/// stopped. The chain moves on when the host feeds it the `VoiceCompleted`
/// event of the current track, see [`update`](Self::update).
#[derive(Debug)]
pub struct MusicChain {
    tracks: Vec<AudioBuffer>,
    current: usize,
    volume: f32,
    dest_channels: usize,
}

impl MusicChain {
    /// `tracks` must not be empty.
    pub(crate) fn new(tracks: Vec<AudioBuffer>, volume: f32, dest_channels: usize) -> Self {
        let mut chain = Self {
            tracks,
            current: 0,
            volume: 1.0,
            dest_channels,
        };
        chain.set_volume(volume);
        chain
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index of the track that is playing or next to play.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_track(&self) -> Option<&AudioBuffer> {
        self.tracks.get(self.current)
    }

    fn on_last_track(&self) -> bool {
        self.current + 1 >= self.tracks.len()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Chain gain in `[0, 1]`, applied to every track. Independent of the music
    /// device's master volume.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        for track in &self.tracks {
            let source_channels = track.format().channels as usize;
            let matrix = GainMatrix::passthrough(source_channels, self.dest_channels).scaled(self.volume);
            track.set_output_matrix(&matrix);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current_track().is_some_and(AudioBuffer::is_playing)
    }

    /// Start or resume the current track.
    pub fn play(&self) -> Result<()> {
        match self.current_track() {
            Some(track) => track.play(false, self.on_last_track()),
            None => Ok(()),
        }
    }

    pub fn stop(&self) {
        if let Some(track) = self.current_track() {
            track.stop();
        }
    }

    /// Advance past the current track if `event` reports it completed.
    ///
    /// Returns whether the chain moved on.
    pub fn handle_event(&mut self, event: &AudioEvent) -> Result<bool> {
        let AudioEvent::VoiceCompleted {
            device: DeviceKind::Music,
            voice_id,
        } = event
        else {
            return Ok(false);
        };
        let is_current = self
            .current_track()
            .and_then(AudioBuffer::voice_id)
            .is_some_and(|id| id == *voice_id);
        if !is_current || self.on_last_track() {
            return Ok(false);
        }

        self.current += 1;
        let looping = self.on_last_track();
        if let Some(track) = self.current_track() {
            log::debug!(
                "Music chain on track {} of {}: '{}'{}",
                self.current + 1,
                self.tracks.len(),
                track.path(),
                if looping { " (looping)" } else { "" }
            );
            track.play(true, looping)?;
        }
        Ok(true)
    }

    /// Feed a batch of events from
    /// [`AudioDeviceManager::poll_events`](crate::AudioDeviceManager::poll_events).
    pub fn update(&mut self, events: &[AudioEvent]) -> Result<()> {
        for event in events {
            self.handle_event(event)?;
        }
        Ok(())
    }

    /// Stop and release every track. Idempotent.
    pub fn dispose(&mut self) {
        self.stop();
        for track in &mut self.tracks {
            track.dispose();
        }
    }
}
