//! Voices: one playing (or stopped) cue bound to a playback device.
//!
//! - [`VoiceId`]: never-reused handle of a voice on its device
//! - [`LoopMode`]: play once or loop forever
//! - [`PlayState`]: whether the mixer pulls frames from the voice
//! - [`Voice`]: cursor, routing matrix and pitch of a bound cue
//!
//! Hosts go through [`AudioBuffer`](crate::AudioBuffer) rather than touching voices.

use crate::audio_data::SeekerSonicAudioData;
use crate::spatial::{GainMatrix, MIN_FREQUENCY_RATIO};
use std::sync::Arc;

/// Handle of a voice. Allocated from a process-wide counter, so a disposed id
/// can never alias a later voice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

impl VoiceId {
    pub(crate) fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoiceId({})", self.0)
    }
}

/// Loop mode for voice playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play once and stop. Emits `VoiceCompleted` at the end.
    #[default]
    Once,
    /// Wrap to the start at the end. Emits `VoiceLooped` on each wrap.
    Infinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    /// Not pulled by the mixer. The cursor keeps its position.
    Stopped,
}

/// What happened to a voice during one fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceEnd {
    Completed,
    Looped,
}

/// A cue bound to a device, with its own cursor.
#[derive(Debug)]
pub struct Voice {
    id: VoiceId,
    data: Arc<SeekerSonicAudioData>,
    /// Fractional frame position, advanced by `frequency_ratio` per output frame
    cursor: f64,
    state: PlayState,
    loop_mode: LoopMode,
    matrix: GainMatrix,
    frequency_ratio: f32,
    max_frequency_ratio: f32,
}

impl Voice {
    pub fn new(
        id: VoiceId,
        data: Arc<SeekerSonicAudioData>,
        dest_channels: usize,
        max_frequency_ratio: f32,
    ) -> Self {
        let matrix = GainMatrix::passthrough(data.channels() as usize, dest_channels);
        Self {
            id,
            data,
            cursor: 0.0,
            state: PlayState::Stopped,
            loop_mode: LoopMode::Once,
            matrix,
            frequency_ratio: 1.0,
            max_frequency_ratio,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn data(&self) -> &Arc<SeekerSonicAudioData> {
        &self.data
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// True once a one-shot has consumed all of its frames.
    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.data.total_frames() as f64
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn frequency_ratio(&self) -> f32 {
        self.frequency_ratio
    }

    pub fn matrix(&self) -> &GainMatrix {
        &self.matrix
    }

    pub fn resume(&mut self) {
        log::debug!(
            "Voice {} resuming at frame {:.1} (loop mode: {:?})",
            self.id,
            self.cursor,
            self.loop_mode
        );
        self.state = PlayState::Playing;
    }

    pub fn reset(&mut self) {
        self.cursor = 0.0;
    }

    pub fn set_loop_mode(&mut self, loop_mode: LoopMode) {
        self.loop_mode = loop_mode;
    }

    /// Stop pulling frames. The cursor is kept.
    pub fn stop(&mut self) {
        if self.state == PlayState::Playing {
            log::debug!("Voice {} stopped at frame {:.1}", self.id, self.cursor);
        }
        self.state = PlayState::Stopped;
    }

    /// Replace the routing matrix. A single-channel placement is repeated for
    /// every channel of a multi-channel cue.
    pub fn set_output_matrix(&mut self, matrix: &GainMatrix) {
        self.matrix = matrix.broadcast_to(self.data.channels() as usize);
    }

    /// Set the pitch ratio, clamped to `[1/1024, max]`.
    pub fn set_frequency_ratio(&mut self, ratio: f32) {
        self.frequency_ratio = if ratio.is_finite() {
            ratio.clamp(MIN_FREQUENCY_RATIO, self.max_frequency_ratio)
        } else {
            1.0
        };
    }

    /// Linear interpolation between the frames around `position`.
    #[inline]
    fn interpolate(&self, position: f64, channel: usize) -> f32 {
        let index = position.floor() as usize;
        let frac = (position - index as f64) as f32;
        let a = self.data.sample(index, channel);
        let b = if index + 1 < self.data.total_frames() {
            self.data.sample(index + 1, channel)
        } else if self.loop_mode == LoopMode::Infinite {
            self.data.sample(0, channel)
        } else {
            a
        };
        a + (b - a) * frac
    }

    /// Mix this voice into an interleaved buffer of `channels` channels.
    ///
    /// Returns the number of frames written and, if the end of the data was
    /// reached, whether the voice completed or wrapped. A completed voice is left
    /// `Stopped` with its cursor at the end.
    pub fn fill_buffer(&mut self, buffer: &mut [f32], channels: usize) -> (usize, Option<VoiceEnd>) {
        if self.state != PlayState::Playing || channels == 0 {
            return (0, None);
        }

        let total = self.data.total_frames() as f64;
        if total == 0.0 {
            self.state = PlayState::Stopped;
            return (0, Some(VoiceEnd::Completed));
        }

        let source_channels = self.data.channels() as usize;
        let frame_count = buffer.len() / channels;
        let step = self.frequency_ratio as f64;
        let mut frames_filled = 0;
        let mut end = None;

        for frame_idx in 0..frame_count {
            if self.cursor >= total {
                match self.loop_mode {
                    LoopMode::Once => {
                        self.state = PlayState::Stopped;
                        end = Some(VoiceEnd::Completed);
                        break;
                    }
                    LoopMode::Infinite => {
                        self.cursor = self.cursor.rem_euclid(total);
                        end = Some(VoiceEnd::Looped);
                    }
                }
            }

            let out = &mut buffer[frame_idx * channels..(frame_idx + 1) * channels];
            for src in 0..source_channels {
                let sample = self.interpolate(self.cursor, src);
                for (dst, slot) in out.iter_mut().enumerate() {
                    *slot += sample * self.matrix.level(src, dst);
                }
            }

            self.cursor += step;
            frames_filled += 1;
        }

        // A one-shot that ran out exactly at the block boundary completes now
        // rather than on the next fill.
        if end.is_none() && self.loop_mode == LoopMode::Once && self.cursor >= total {
            self.state = PlayState::Stopped;
            end = Some(VoiceEnd::Completed);
        }

        (frames_filled, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Arc<SeekerSonicAudioData> {
        let samples = (0..frames).map(|i| i as f32 / frames as f32).collect();
        Arc::new(SeekerSonicAudioData::from_samples(samples, 48000, 1).unwrap())
    }

    #[test]
    fn test_voice_ids_are_never_reused() {
        let a = VoiceId::next();
        let b = VoiceId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_stopped_voice_writes_nothing() {
        let mut voice = Voice::new(VoiceId::next(), ramp(8), 2, 5.0);
        let mut buffer = vec![0.0; 8];
        assert_eq!(voice.fill_buffer(&mut buffer, 2), (0, None));
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_once_completes_and_stops() {
        let mut voice = Voice::new(VoiceId::next(), ramp(4), 2, 5.0);
        voice.resume();
        let mut buffer = vec![0.0; 16];
        let (frames, end) = voice.fill_buffer(&mut buffer, 2);
        assert_eq!(frames, 4);
        assert_eq!(end, Some(VoiceEnd::Completed));
        assert!(!voice.is_playing());
        assert!(voice.is_at_end());
        // Mono fans out to both channels
        assert_eq!(buffer[2], buffer[3]);
    }

    #[test]
    fn test_completion_at_block_boundary() {
        let mut voice = Voice::new(VoiceId::next(), ramp(4), 1, 5.0);
        voice.resume();
        let mut buffer = vec![0.0; 4];
        let (frames, end) = voice.fill_buffer(&mut buffer, 1);
        assert_eq!(frames, 4);
        assert_eq!(end, Some(VoiceEnd::Completed));
    }

    #[test]
    fn test_infinite_wraps_and_keeps_playing() {
        let mut voice = Voice::new(VoiceId::next(), ramp(4), 1, 5.0);
        voice.set_loop_mode(LoopMode::Infinite);
        voice.resume();
        let mut buffer = vec![0.0; 10];
        let (frames, end) = voice.fill_buffer(&mut buffer, 1);
        assert_eq!(frames, 10);
        assert_eq!(end, Some(VoiceEnd::Looped));
        assert!(voice.is_playing());
        assert_eq!(buffer[4], buffer[0]);
    }

    #[test]
    fn test_frequency_ratio_advances_cursor_and_clamps() {
        let mut voice = Voice::new(VoiceId::next(), ramp(100), 1, 5.0);
        voice.set_frequency_ratio(2.0);
        voice.resume();
        let mut buffer = vec![0.0; 10];
        voice.fill_buffer(&mut buffer, 1);
        assert!((voice.cursor() - 20.0).abs() < 1e-9);

        voice.set_frequency_ratio(100.0);
        assert_eq!(voice.frequency_ratio(), 5.0);
        voice.set_frequency_ratio(0.0);
        assert_eq!(voice.frequency_ratio(), MIN_FREQUENCY_RATIO);
        voice.set_frequency_ratio(f32::NAN);
        assert_eq!(voice.frequency_ratio(), 1.0);
    }

    #[test]
    fn test_output_matrix_routes_gain() {
        let data = Arc::new(SeekerSonicAudioData::from_samples(vec![1.0; 4], 48000, 1).unwrap());
        let mut voice = Voice::new(VoiceId::next(), data, 2, 5.0);
        voice.set_output_matrix(&GainMatrix::from_row(vec![0.25, 0.75]));
        voice.resume();
        let mut buffer = vec![0.0; 4];
        voice.fill_buffer(&mut buffer, 2);
        assert_eq!(&buffer[..2], &[0.25, 0.75]);
    }
}
