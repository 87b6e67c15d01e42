use crate::{
    audio_data::{AudioDataLoader, LoadOptions, SeekerSonicAudioData},
    error::{Result, SeekerSonicError},
};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use symphonia::{
    core::{
        audio::SampleBuffer,
        codecs::DecoderOptions,
        errors::Error,
        formats::{FormatOptions, FormatReader},
        io::MediaSourceStream,
        meta::MetadataOptions,
        probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Loads cues from disk with the symphonia decoders (WAV, OGG, FLAC, MP3, ...).
///
/// A path that does not exist is reported as `ResourceNotFound` before any
/// decoding is attempted.
pub struct DefaultAudioLoader;

fn loading_error(path: &str, what: &str, err: impl std::fmt::Debug) -> SeekerSonicError {
    SeekerSonicError::AudioLoading(format!("{} '{}': {:?}", what, path, err))
}

/// Probe the container, guessing from the file extension.
fn open_reader(path: &str) -> Result<Box<dyn FormatReader>> {
    let file_path = Path::new(path);
    let source = MediaSourceStream::new(Box::new(File::open(file_path)?), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .map(|probed| probed.format)
        .map_err(|e| loading_error(path, "Cannot probe", e))
}

/// Decode every packet of the default track into interleaved f32.
fn decode_default_track(path: &str, reader: &mut dyn FormatReader) -> Result<(Vec<f32>, u32, u16)> {
    let track = reader
        .default_track()
        .ok_or_else(|| SeekerSonicError::AudioLoading(format!("No audio track in '{}'", path)))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| SeekerSonicError::AudioLoading(format!("Unknown sample rate in '{}'", path)))?;
    let channels = params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| SeekerSonicError::AudioLoading(format!("Unknown channel layout in '{}'", path)))?;

    let mut decoder = get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| loading_error(path, "No decoder for", e))?;

    let mut samples = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            // symphonia signals end of stream with an io error
            Err(Error::IoError(_)) => break,
            Err(e) => return Err(loading_error(path, "Cannot read packet from", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let block = match decoder.decode(&packet) {
            Ok(block) => block,
            Err(Error::IoError(_)) => break,
            Err(Error::DecodeError(e)) => {
                log::debug!("Skipping corrupt packet in '{}': {}", path, e);
                continue;
            }
            Err(e) => return Err(loading_error(path, "Cannot decode", e)),
        };

        let mut buffer = SampleBuffer::<f32>::new(block.capacity() as u64, *block.spec());
        buffer.copy_interleaved_ref(block);
        samples.extend_from_slice(buffer.samples());
    }

    Ok((samples, sample_rate, channels))
}

impl AudioDataLoader for DefaultAudioLoader {
    fn load(&self, path: &str, options: &LoadOptions) -> Result<Arc<SeekerSonicAudioData>> {
        if !Path::new(path).is_file() {
            return Err(SeekerSonicError::not_found(path));
        }

        let mut reader = open_reader(path)?;
        let (samples, sample_rate, channels) = decode_default_track(path, reader.as_mut())?;
        log::debug!(
            "Decoded '{}' at {} Hz, {} channel(s), {} frames",
            path,
            sample_rate,
            channels,
            samples.len() / channels.max(1) as usize
        );

        let data = SeekerSonicAudioData::from_samples(samples, sample_rate, channels)?;
        Ok(Arc::new(data.conform(options)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_resource_not_found() {
        let err = DefaultAudioLoader
            .load("definitely/not/here.wav", &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SeekerSonicError::ResourceNotFound { .. }));
    }
}
