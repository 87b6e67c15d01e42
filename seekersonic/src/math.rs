//! Math types for SeekerSonic

pub use glam::{Vec2, Vec3};

/// Front/top orientation pair of a listener or emitter.
///
/// Both vectors are expected to be unit length and mutually orthogonal. This is
/// a caller contract and is not validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub front: Vec3,
    pub top: Vec3,
}

impl Orientation {
    pub const DEFAULT: Self = Self {
        front: Vec3::Z,
        top: Vec3::Y,
    };

    pub fn new(front: Vec3, top: Vec3) -> Self {
        Self { front, top }
    }

    /// Right-hand axis, `top × front`. For the default orientation this is +X.
    pub fn right(&self) -> Vec3 {
        self.top.cross(self.front)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Compass bearing in degrees from `from` to `to` on the horizontal plane.
///
/// 0 points along +y and angles grow clockwise, so +x is 90. The result lies in `[0, 360)`.
/// Coincident points have a bearing of 0.
pub fn bearing_degrees(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    if delta.length_squared() == 0.0 {
        return 0.0;
    }
    delta.x.atan2(delta.y).to_degrees().rem_euclid(360.0)
}

/// Unit heading on the horizontal plane for a compass bearing.
pub fn heading(bearing: f32) -> Vec2 {
    let radians = bearing.to_radians();
    Vec2::new(radians.sin(), radians.cos())
}
