//! Error types for SeekerSonic

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeekerSonicError {
    #[error("The sound {path} could not be found")]
    ResourceNotFound { path: String },

    #[error("Device state error: {0}")]
    DeviceState(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("Audio loading error: {0}")]
    AudioLoading(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Playback of {path} did not finish within {waited:?}")]
    PlaybackTimeout { path: String, waited: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeekerSonicError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::ResourceNotFound { path: path.into() }
    }

    /// True for the errors that indicate a programmer error in lifecycle handling.
    pub fn is_device_state(&self) -> bool {
        matches!(self, Self::DeviceState(_))
    }
}

pub type Result<T> = std::result::Result<T, SeekerSonicError>;
