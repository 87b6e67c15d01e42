mod default_loader;
mod load_options;
mod loader;
mod resampler;

use crate::error::{Result, SeekerSonicError};
pub use default_loader::DefaultAudioLoader;
pub use load_options::{ConvertToMono, LoadOptions};
pub use loader::{AudioDataLoader, InMemoryLoader};
pub use resampler::AudioResampler;
use std::sync::Arc;
use std::time::Duration;

/// Format descriptor of decoded audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_frames: usize,
    pub duration: Duration,
}

/// Decoded PCM audio with reference-counted sharing.
///
/// Samples are f32 and stored **interleaved** (`[L0, R0, L1, R1, ...]` for stereo),
/// which is the layout decoders produce and the mixer consumes frame by frame.
#[derive(Debug, Clone)]
pub struct SeekerSonicAudioData {
    inner: Arc<AudioDataInner>,
}

#[derive(Debug)]
struct AudioDataInner {
    /// Interleaved samples, `total_frames * channels` long
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
    total_frames: usize,
}

impl SeekerSonicAudioData {
    /// Wrap already decoded interleaved samples.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(SeekerSonicError::AudioFormat(format!(
                "Invalid format: {} Hz, {} channels",
                sample_rate, channels
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(SeekerSonicError::AudioFormat(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        let total_frames = samples.len() / channels as usize;
        let duration = Duration::from_secs_f64(total_frames as f64 / sample_rate as f64);
        Ok(Self {
            inner: Arc::new(AudioDataInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        })
    }

    /// Load audio data from a file path using the symphonia-based loader.
    pub fn from_path(path: &str) -> Result<Arc<Self>> {
        DefaultAudioLoader.load(path, &LoadOptions::default())
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.inner.sample_rate,
            channels: self.inner.channels,
            total_frames: self.inner.total_frames,
            duration: self.inner.duration,
        }
    }

    /// Sample of `channel` at `frame`, or silence past the end.
    #[inline]
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.inner
            .samples
            .get(frame * self.inner.channels as usize + channel)
            .copied()
            .unwrap_or(0.0)
    }

    /// Convert to mono by averaging all channels
    pub fn to_mono(&self) -> Result<Self> {
        if self.inner.channels == 1 {
            return Ok(self.clone());
        }

        let channels = self.inner.channels as usize;
        let mono_samples: Vec<f32> = self
            .inner
            .samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Self::from_samples(mono_samples, self.inner.sample_rate, 1)
    }

    /// Resample to a different sample rate using rubato
    pub fn resample(&self, target_sample_rate: u32) -> Result<Self> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampler = AudioResampler::new(
            self.inner.sample_rate,
            target_sample_rate,
            self.inner.channels,
            Some(1024),
        )?;

        let resampled = resampler.resample_interleaved(&self.inner.samples)?;
        Self::from_samples(resampled, target_sample_rate, self.inner.channels)
    }

    /// Apply the post-decode steps of `options` (mono downmix, then resampling).
    pub(crate) fn conform(self, options: &LoadOptions) -> Result<Self> {
        let data = match options.convert_to_mono {
            ConvertToMono::Original => self,
            ConvertToMono::ForceMono => self.to_mono()?,
        };
        match options.target_sample_rate {
            Some(rate) => data.resample(rate),
            None => Ok(data),
        }
    }
}
