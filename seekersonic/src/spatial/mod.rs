// Spatial audio module
//
// 3-D placement of point-source cues: listener/emitter geometry, per-speaker
// gain matrices for the active topology, and Doppler pitch scaling.

mod engine;
mod listener;
mod matrix;

pub use engine::{Placement, SpatialAudioEngine, pan_matrix};
pub use listener::{Emitter, Listener};
pub use matrix::GainMatrix;

/// Lowest frequency ratio a voice accepts.
pub const MIN_FREQUENCY_RATIO: f32 = 1.0 / 1024.0;
