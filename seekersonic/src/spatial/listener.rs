use crate::math::{Orientation, Vec3};

/// The "ears" of the 3-D audio world.
///
/// One listener exists per [`SpatialAudioEngine`](super::SpatialAudioEngine). Its
/// orientation vectors must be unit length and orthogonal; this is not checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    pub position: Vec3,
    pub orientation: Orientation,
    pub velocity: Vec3,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Orientation::DEFAULT,
            velocity: Vec3::ZERO,
        }
    }
}

impl Listener {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn front(&self) -> Vec3 {
        self.orientation.front
    }

    pub fn top(&self) -> Vec3 {
        self.orientation.top
    }
}

/// Transient sound source built for a single placement calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Orientation,
    /// Always 1 for point sources
    pub channel_count: u16,
    /// When false, gain does not fall off with distance
    pub distance_scaling: bool,
    /// Distance up to which gain stays at 1.0 when distance scaling is on
    pub curve_distance_scaler: f32,
}

impl Emitter {
    /// Point source at `position` with flat distance gain.
    pub fn point(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            orientation: Orientation::DEFAULT,
            channel_count: 1,
            distance_scaling: false,
            curve_distance_scaler: 1.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Enable `min(1, scaler / distance)` falloff.
    pub fn with_distance_scaling(mut self, curve_distance_scaler: f32) -> Self {
        self.distance_scaling = true;
        self.curve_distance_scaler = curve_distance_scaler;
        self
    }
}
