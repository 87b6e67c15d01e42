//! Configuration descriptors for the audio layer and the guided missile.

mod audio_desc;
mod tuning;

pub use audio_desc::{AudioDesc, OutputMode};
pub use tuning::{GuidedMissileCues, GuidedMissileTuning};
