// Mixer module - renders every playing voice of a device into one output block

use crate::playback::{Voice, VoiceEnd, VoiceId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of one mix pass
#[derive(Debug, Default)]
pub struct MixResult {
    pub frames_filled: usize,
    pub completed_voices: Vec<VoiceId>,
    pub looped_voices: Vec<VoiceId>,
    /// The voice table was busy and the block was left silent
    pub contended: bool,
}

/// Mix all playing voices into `buffer` and scale by `master_volume`.
///
/// `buffer` is interleaved with `channels` channels and is overwritten, not
/// accumulated into. The voice table is taken with `try_lock`: the audio
/// callback must never block on the host thread, so contention yields a silent
/// block.
///
/// - `LoopMode::Once`: a voice that reaches its end is reported in
///   `completed_voices` and stays in the table, stopped, until its buffer is disposed
/// - `LoopMode::Infinite`: a voice that wraps is reported in `looped_voices`
pub fn mix_voices(
    buffer: &mut [f32],
    channels: usize,
    voices: &Mutex<HashMap<VoiceId, Voice>>,
    master_volume: f32,
) -> MixResult {
    buffer.fill(0.0);

    let Ok(mut voices) = voices.try_lock() else {
        log::warn!("Failed to acquire voice table lock in mixer");
        return MixResult {
            contended: true,
            ..Default::default()
        };
    };

    let mut result = MixResult::default();
    for (voice_id, voice) in voices.iter_mut() {
        if !voice.is_playing() {
            continue;
        }

        let (frames_filled, end) = voice.fill_buffer(buffer, channels);
        result.frames_filled = result.frames_filled.max(frames_filled);
        match end {
            Some(VoiceEnd::Completed) => {
                log::debug!("Mixer: voice {} completed", voice_id);
                result.completed_voices.push(*voice_id);
            }
            Some(VoiceEnd::Looped) => {
                log::debug!("Mixer: voice {} looped", voice_id);
                result.looped_voices.push(*voice_id);
            }
            None => {}
        }
    }
    drop(voices);

    if master_volume != 1.0 {
        for sample in buffer.iter_mut() {
            *sample *= master_volume;
        }
    }

    result
}
