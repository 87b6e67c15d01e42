use super::MIN_FREQUENCY_RATIO;
use super::listener::{Emitter, Listener};
use super::matrix::GainMatrix;
use crate::config::AudioDesc;
use crate::math::{Orientation, Vec3};
use crate::speaker::SpeakerConfiguration;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Emitter and listener closer than this are treated as coincident.
const COINCIDENT_DISTANCE: f32 = 1e-6;

/// Result of a 3-D placement calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// One source channel by the device's destination channels
    pub matrix: GainMatrix,
    /// Pitch scaling, 1.0 means no shift
    pub doppler_factor: f32,
    /// Emitter to listener distance
    pub distance: f32,
}

/// Listener state and the speaker-aware gain/Doppler math of the primary device.
///
/// The listener is read on every placement and written rarely, so it sits behind
/// an `RwLock`.
pub struct SpatialAudioEngine {
    speaker_config: Option<SpeakerConfiguration>,
    dest_channels: usize,
    speed_of_sound: f32,
    max_frequency_ratio: f32,
    listener: RwLock<Listener>,
}

impl SpatialAudioEngine {
    pub fn new(
        speaker_config: Option<SpeakerConfiguration>,
        dest_channels: usize,
        speed_of_sound: f32,
        max_frequency_ratio: f32,
    ) -> Self {
        if speaker_config.is_none() {
            log::warn!(
                "No known speaker configuration for {} output channels, positional cues will be silent",
                dest_channels
            );
        }
        Self {
            speaker_config,
            dest_channels,
            speed_of_sound,
            max_frequency_ratio,
            listener: RwLock::new(Listener::default()),
        }
    }

    /// Engine for a device with `channels` outputs, using the descriptor's constants.
    pub fn for_channels(channels: u16, desc: &AudioDesc) -> Self {
        Self::new(
            SpeakerConfiguration::from_channel_count(channels),
            channels as usize,
            desc.speed_of_sound,
            desc.max_frequency_ratio,
        )
    }

    pub fn speaker_configuration(&self) -> Option<SpeakerConfiguration> {
        self.speaker_config
    }

    pub fn dest_channels(&self) -> usize {
        self.dest_channels
    }

    fn read_listener(&self) -> RwLockReadGuard<'_, Listener> {
        self.listener.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_listener(&self) -> RwLockWriteGuard<'_, Listener> {
        self.listener.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of the current listener.
    pub fn listener(&self) -> Listener {
        *self.read_listener()
    }

    pub fn set_listener_position(&self, position: Vec3) {
        self.write_listener().position = position;
    }

    pub fn set_listener_orientation(&self, front: Vec3, top: Vec3) {
        self.write_listener().orientation = Orientation::new(front, top);
    }

    pub fn set_listener_velocity(&self, velocity: Vec3) {
        self.write_listener().velocity = velocity;
    }

    /// Recreate the listener at the origin with the default orientation.
    pub fn reset_listener(&self) {
        *self.write_listener() = Listener::default();
    }

    /// Place `emitter` relative to the current listener.
    pub fn place(&self, emitter: &Emitter) -> Placement {
        let listener = self.listener();
        self.calculate_placement(&listener, emitter)
    }

    /// Per-channel gains and Doppler factor of `emitter` as heard by `listener`.
    ///
    /// Gains blend from 1.0 on every speaker (emitter at the listener or straight
    /// above/below it) toward a cardioid around each speaker's azimuth as the
    /// emitter's direction becomes horizontal. Distance only matters when the
    /// emitter opts into distance scaling. An unrecognized speaker configuration
    /// yields an all-zero matrix.
    pub fn calculate_placement(&self, listener: &Listener, emitter: &Emitter) -> Placement {
        let offset = emitter.position - listener.position;
        let distance = offset.length();

        let Some(config) = self.speaker_config else {
            return Placement {
                matrix: GainMatrix::silent(1, self.dest_channels),
                doppler_factor: 1.0,
                distance,
            };
        };

        if distance <= COINCIDENT_DISTANCE {
            return Placement {
                matrix: GainMatrix::from_row(vec![1.0; config.channel_count()]),
                doppler_factor: 1.0,
                distance,
            };
        }

        let direction = offset / distance;
        let x = direction.dot(listener.orientation.right());
        let z = direction.dot(listener.orientation.front);
        let horizontal = (x * x + z * z).sqrt().min(1.0);
        let azimuth = x.atan2(z);

        let attenuation = if emitter.distance_scaling {
            (emitter.curve_distance_scaler / distance).min(1.0)
        } else {
            1.0
        };

        let gains = if config == SpeakerConfiguration::Mono {
            vec![attenuation]
        } else {
            config
                .speakers()
                .iter()
                .map(|speaker| {
                    let directional = speaker
                        .azimuth()
                        .map(|a| 0.5 * (1.0 + (azimuth - a).cos()))
                        .unwrap_or(0.0);
                    ((1.0 - horizontal) + horizontal * directional) * attenuation
                })
                .collect()
        };

        Placement {
            matrix: GainMatrix::from_row(gains),
            doppler_factor: self.doppler_factor(listener, emitter, direction),
            distance,
        }
    }

    /// `(c + listener speed toward emitter) / (c - emitter speed toward listener)`
    fn doppler_factor(&self, listener: &Listener, emitter: &Emitter, direction: Vec3) -> f32 {
        let c = self.speed_of_sound;
        let limit = c * 0.99;
        let listener_toward = listener.velocity.dot(direction).clamp(-limit, limit);
        let emitter_toward = emitter.velocity.dot(-direction).clamp(-limit, limit);
        let factor = (c + listener_toward) / (c - emitter_toward);
        factor.clamp(MIN_FREQUENCY_RATIO, self.max_frequency_ratio)
    }

    /// Stereo pan gains for the active configuration. See [`pan_matrix`].
    pub fn pan_stereo(&self, pan: f32) -> GainMatrix {
        pan_matrix(self.speaker_config, self.dest_channels, pan)
    }
}

/// Linear stereo pan, `left = 0.5 - pan/2` and `right = 0.5 + pan/2`.
///
/// `pan` is clamped to `[-1, 1]`. The left gain goes to every left speaker of the
/// configuration (front, back and side) and the right gain to the right ones.
/// Mono gets full level on its single channel. With no configuration the matrix
/// is all zero over `dest_channels`.
pub fn pan_matrix(
    config: Option<SpeakerConfiguration>,
    dest_channels: usize,
    pan: f32,
) -> GainMatrix {
    let Some(config) = config else {
        log::warn!("Unrecognized speaker configuration, pan leaves the output silent");
        return GainMatrix::silent(1, dest_channels);
    };

    let pan = pan.clamp(-1.0, 1.0);
    let mut gains = vec![0.0; config.channel_count()];
    if config == SpeakerConfiguration::Mono {
        gains[0] = 1.0;
        return GainMatrix::from_row(gains);
    }

    let left = 0.5 - pan / 2.0;
    let right = 0.5 + pan / 2.0;
    let (left_channels, right_channels) = config.pan_channels();
    for i in left_channels {
        gains[i] = left;
    }
    for i in right_channels {
        gains[i] = right;
    }
    GainMatrix::from_row(gains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stereo_engine() -> SpatialAudioEngine {
        SpatialAudioEngine::new(Some(SpeakerConfiguration::Stereo), 2, 343.5, 5.0)
    }

    #[test]
    fn test_coincident_emitter_is_full_gain_no_shift() {
        let engine = SpatialAudioEngine::new(
            Some(SpeakerConfiguration::FivePointOne),
            6,
            343.5,
            5.0,
        );
        let listener = Listener::at(Vec3::new(3.0, 4.0, 5.0));
        let emitter = Emitter::point(Vec3::new(3.0, 4.0, 5.0)).with_velocity(Vec3::X * 100.0);
        let placement = engine.calculate_placement(&listener, &emitter);
        assert_eq!(placement.matrix.row(), vec![1.0; 6]);
        assert_eq!(placement.doppler_factor, 1.0);
    }

    #[test]
    fn test_emitter_on_right_favours_right_channel() {
        let engine = stereo_engine();
        let placement = engine.place(&Emitter::point(Vec3::new(10.0, 0.0, 0.0)));
        let row = placement.matrix.row();
        assert!(row[1] > row[0], "{:?}", row);
        assert!((placement.distance - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_emitter_overhead_is_centered_full_gain() {
        let engine = stereo_engine();
        let placement = engine.place(&Emitter::point(Vec3::new(0.0, 50.0, 0.0)));
        for gain in placement.matrix.row() {
            assert!((gain - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_distance_gain_is_flat_by_default() {
        let engine = stereo_engine();
        let near = engine.place(&Emitter::point(Vec3::new(0.0, 0.0, 1.0)));
        let far = engine.place(&Emitter::point(Vec3::new(0.0, 0.0, 10_000.0)));
        assert_eq!(near.matrix, far.matrix);
    }

    #[test]
    fn test_distance_scaling_attenuates_when_enabled() {
        let engine = stereo_engine();
        let emitter = Emitter::point(Vec3::new(0.0, 0.0, 40.0)).with_distance_scaling(10.0);
        let placement = engine.place(&emitter);
        let flat = engine.place(&Emitter::point(Vec3::new(0.0, 0.0, 40.0)));
        for (scaled, unscaled) in placement.matrix.row().iter().zip(flat.matrix.row()) {
            assert!((scaled - unscaled * 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_listener_orientation_changes_side() {
        let engine = stereo_engine();
        // Facing -Z flips the right axis to -X
        engine.set_listener_orientation(Vec3::NEG_Z, Vec3::Y);
        let row = engine.place(&Emitter::point(Vec3::new(10.0, 0.0, 0.0))).matrix.row();
        assert!(row[0] > row[1]);
        engine.reset_listener();
        assert_eq!(engine.listener(), Listener::default());
    }

    #[test]
    fn test_doppler_rises_when_approaching() {
        let engine = stereo_engine();
        let approaching = Emitter::point(Vec3::new(0.0, 0.0, 100.0)).with_velocity(Vec3::new(0.0, 0.0, -50.0));
        let receding = Emitter::point(Vec3::new(0.0, 0.0, 100.0)).with_velocity(Vec3::new(0.0, 0.0, 50.0));
        assert!(engine.place(&approaching).doppler_factor > 1.0);
        assert!(engine.place(&receding).doppler_factor < 1.0);
        assert_eq!(engine.place(&Emitter::point(Vec3::Z)).doppler_factor, 1.0);
    }

    #[test]
    fn test_doppler_is_clamped_to_voice_range() {
        let engine = stereo_engine();
        engine.set_listener_velocity(Vec3::new(0.0, 0.0, 10_000.0));
        let emitter = Emitter::point(Vec3::new(0.0, 0.0, 100.0)).with_velocity(Vec3::new(0.0, 0.0, -10_000.0));
        assert!(engine.place(&emitter).doppler_factor <= 5.0);
    }

    #[test]
    fn test_unrecognized_configuration_is_silent() {
        let engine = SpatialAudioEngine::new(None, 7, 343.5, 5.0);
        let placement = engine.place(&Emitter::point(Vec3::new(1.0, 0.0, 0.0)));
        assert!(placement.matrix.is_silent());
        assert_eq!(placement.matrix.dest_channels(), 7);
        assert!(engine.pan_stereo(0.3).is_silent());
    }

    #[test]
    fn test_pan_stereo_extremes() {
        let engine = stereo_engine();
        assert_eq!(engine.pan_stereo(0.0).row(), vec![0.5, 0.5]);
        assert_eq!(engine.pan_stereo(1.0).row(), vec![0.0, 1.0]);
        assert_eq!(engine.pan_stereo(-1.0).row(), vec![1.0, 0.0]);
        assert_eq!(engine.pan_stereo(3.0).row(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_pan_duplicates_over_surround_pairs() {
        let row = pan_matrix(Some(SpeakerConfiguration::SevenPointOneSurround), 8, 0.5).row();
        assert_eq!(row, vec![0.25, 0.75, 0.0, 0.0, 0.25, 0.75, 0.25, 0.75]);
        let mono = pan_matrix(Some(SpeakerConfiguration::Mono), 1, -0.7).row();
        assert_eq!(mono, vec![1.0]);
    }

    proptest! {
        #[test]
        fn pan_is_mirror_symmetric(pan in -1.0f32..=1.0f32) {
            for config in SpeakerConfiguration::ALL {
                let forward = pan_matrix(Some(config), config.channel_count(), pan).row();
                let mirrored = pan_matrix(Some(config), config.channel_count(), -pan).row();
                let (left, right) = config.pan_channels();
                for (l, r) in left.iter().zip(right.iter()) {
                    prop_assert!((forward[*l] - mirrored[*r]).abs() < 1e-6);
                    prop_assert!((forward[*r] - mirrored[*l]).abs() < 1e-6);
                }
            }
        }

        #[test]
        fn pan_gains_sum_to_one_per_pair(pan in -1.0f32..=1.0f32) {
            let row = pan_matrix(Some(SpeakerConfiguration::Stereo), 2, pan).row();
            prop_assert!((row[0] + row[1] - 1.0).abs() < 1e-6);
            if pan >= 0.0 {
                prop_assert!(row[1] >= row[0]);
            }
        }

        #[test]
        fn placement_gains_stay_in_unit_range(
            x in -100.0f32..100.0, y in -100.0f32..100.0, z in -100.0f32..100.0,
        ) {
            let engine = SpatialAudioEngine::new(Some(SpeakerConfiguration::SevenPointOneSurround), 8, 343.5, 5.0);
            let placement = engine.place(&Emitter::point(Vec3::new(x, y, z)));
            for gain in placement.matrix.row() {
                prop_assert!((0.0..=1.0 + 1e-5).contains(&gain));
            }
        }
    }
}
