use super::{DeviceKind, SharedVolume, VoiceTable, publish_mix_events};
use crate::error::{Result, SeekerSonicError};
use crate::events::AudioEvent;
use crate::mixer::mix_voices;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::Sender;
use std::sync::Arc;

/// cpal output stream that renders a device's voice table.
///
/// `cpal::Stream` is not `Send`, so a hardware device stays on the thread that
/// opened it.
pub(super) struct HardwareOutput {
    stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl HardwareOutput {
    pub(super) fn open(
        kind: DeviceKind,
        block_size: usize,
        voices: VoiceTable,
        volume: Arc<SharedVolume>,
        events: Sender<AudioEvent>,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            SeekerSonicError::AudioDevice("No default output device available".into())
        })?;

        let default_config = device.default_output_config().map_err(|e| {
            SeekerSonicError::AudioDevice(format!("Failed to get default config: {}", e))
        })?;

        let sample_rate = default_config.sample_rate().0;
        let channels = default_config.channels();

        // Ask for the configured block size only when the device advertises it
        let buffer_size = match default_config.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max }
                if (*min as usize..=*max as usize).contains(&block_size) =>
            {
                cpal::BufferSize::Fixed(block_size as u32)
            }
            _ => cpal::BufferSize::Default,
        };

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size,
        };

        log::info!(
            "Building {} output stream on '{}' ({:?})",
            kind,
            device.name().unwrap_or_else(|_| "unknown".into()),
            default_config.sample_format()
        );

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config, kind, block_size, voices, volume, events)?
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config, kind, block_size, voices, volume, events)?
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config, kind, block_size, voices, volume, events)?
            }
            other => {
                return Err(SeekerSonicError::AudioFormat(format!(
                    "Unsupported sample format {:?}",
                    other
                )));
            }
        };

        stream.play().map_err(|e| {
            SeekerSonicError::AudioDevice(format!("Failed to start stream: {}", e))
        })?;

        Ok(Self {
            stream,
            sample_rate,
            channels,
        })
    }

    pub(super) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub(super) fn channels(&self) -> u16 {
        self.channels
    }

    /// Pause and drop the stream.
    pub(super) fn close(self) {
        if let Err(e) = self.stream.pause() {
            log::debug!("Pausing stream before close failed: {}", e);
        }
        drop(self.stream);
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        kind: DeviceKind,
        block_size: usize,
        voices: VoiceTable,
        volume: Arc<SharedVolume>,
        events: Sender<AudioEvent>,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        let error_events = events.clone();
        let mut scratch = vec![0.0f32; block_size * channels];

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if scratch.len() != data.len() {
                        scratch.resize(data.len(), 0.0);
                    }

                    let result = mix_voices(&mut scratch, channels, &voices, volume.get());

                    for (out, sample) in data.iter_mut().zip(scratch.iter()) {
                        *out = T::from_sample(*sample);
                    }

                    publish_mix_events(kind, &result, &events);
                },
                move |err| {
                    log::error!("Audio stream error on {} device: {}", kind, err);
                    let _ = error_events.send(AudioEvent::StreamError {
                        device: kind,
                        error: err.to_string(),
                    });
                },
                None,
            )
            .map_err(|e| SeekerSonicError::AudioDevice(format!("Failed to build stream: {}", e)))
    }
}
