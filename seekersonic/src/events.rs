//! Event types for SeekerSonic

use crate::device::DeviceKind;
use crate::playback::VoiceId;

/// Reported by playback devices and drained with
/// [`AudioDeviceManager::poll_events`](crate::AudioDeviceManager::poll_events).
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// A one-shot voice played to its end and stopped
    VoiceCompleted { device: DeviceKind, voice_id: VoiceId },
    /// A looping voice wrapped back to its start
    VoiceLooped { device: DeviceKind, voice_id: VoiceId },
    /// The output stream of a hardware device reported an error
    StreamError { device: DeviceKind, error: String },
}

impl AudioEvent {
    pub fn voice_id(&self) -> Option<VoiceId> {
        match self {
            Self::VoiceCompleted { voice_id, .. } | Self::VoiceLooped { voice_id, .. } => {
                Some(*voice_id)
            }
            Self::StreamError { .. } => None,
        }
    }

    pub fn device(&self) -> DeviceKind {
        match self {
            Self::VoiceCompleted { device, .. }
            | Self::VoiceLooped { device, .. }
            | Self::StreamError { device, .. } => *device,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::StreamError { .. })
    }
}
