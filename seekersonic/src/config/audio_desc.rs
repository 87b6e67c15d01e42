use crate::error::{Result, SeekerSonicError};
use std::time::Duration;

/// How a playback device produces sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Open the default cpal output device and render from its callback.
    Hardware,
    /// No output stream. The host advances playback with
    /// [`AudioDeviceManager::render`](crate::AudioDeviceManager::render).
    Headless { sample_rate: u32, channels: u16 },
}

impl Default for OutputMode {
    fn default() -> Self {
        Self::Hardware
    }
}

/// Configuration descriptor for the audio device layer
#[derive(Debug, Clone)]
pub struct AudioDesc {
    /// Hardware or headless output for all three devices
    pub output: OutputMode,
    /// Frames rendered per hardware callback request
    pub block_size: usize,
    /// Speed of sound in world units per second, used for Doppler
    pub speed_of_sound: f32,
    /// Upper bound of a voice's frequency ratio (Doppler pitch shift)
    pub max_frequency_ratio: f32,
    /// Poll interval of the blocking play-and-wait helper
    pub wait_poll_interval: Duration,
    /// Default bound on how long play-and-wait may block
    pub wait_timeout: Duration,
    /// Sound effects directory, relative to the root
    pub sound_dir: String,
    /// Narrative directory, relative to the sound directory
    pub narrative_dir: String,
    /// Spoken numbers directory, relative to the narrative directory
    pub numbers_dir: String,
}

impl Default for AudioDesc {
    fn default() -> Self {
        Self {
            output: OutputMode::Hardware,
            block_size: 1024,
            speed_of_sound: 343.5,
            max_frequency_ratio: 5.0,
            wait_poll_interval: Duration::from_millis(100),
            wait_timeout: Duration::from_secs(30),
            sound_dir: "s".to_string(),
            narrative_dir: "n".to_string(),
            numbers_dir: "ns".to_string(),
        }
    }
}

impl AudioDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headless descriptor, used by tests and by hosts without an audio device.
    pub fn headless(sample_rate: u32, channels: u16) -> Self {
        Self::default().output(OutputMode::Headless {
            sample_rate,
            channels,
        })
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn speed_of_sound(mut self, speed: f32) -> Self {
        self.speed_of_sound = speed;
        self
    }

    pub fn wait_poll_interval(mut self, interval: Duration) -> Self {
        self.wait_poll_interval = interval;
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(SeekerSonicError::Configuration(
                "Block size must be greater than 0".into(),
            ));
        }
        if let OutputMode::Headless {
            sample_rate,
            channels,
        } = self.output
        {
            if sample_rate == 0 {
                return Err(SeekerSonicError::Configuration(
                    "Sample rate must be greater than 0".into(),
                ));
            }
            if channels == 0 {
                return Err(SeekerSonicError::Configuration(
                    "Channel count must be greater than 0".into(),
                ));
            }
        }
        if self.speed_of_sound <= 0.0 {
            return Err(SeekerSonicError::Configuration(format!(
                "Speed of sound must be positive, got {}",
                self.speed_of_sound
            )));
        }
        if self.max_frequency_ratio < 1.0 {
            return Err(SeekerSonicError::Configuration(format!(
                "Maximum frequency ratio must be at least 1.0, got {}",
                self.max_frequency_ratio
            )));
        }
        if self.wait_poll_interval.is_zero() {
            return Err(SeekerSonicError::Configuration(
                "Wait poll interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
