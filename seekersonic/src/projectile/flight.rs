use crate::math::{Vec2, Vec3, bearing_degrees, heading};
use std::time::Duration;

/// Position and motion of a weapon in flight: the part every weapon kind shares
/// and the part the save checkpoint stores.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlightState {
    pub position: Vec3,
    /// Compass bearing in degrees, 0 along +y, clockwise
    pub direction: f32,
    /// Cumulative distance flown
    pub total_distance: f32,
    pub finished: bool,
}

impl FlightState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn horizontal(&self) -> Vec2 {
        self.position.truncate()
    }

    /// Turn toward a point on the horizontal plane.
    pub fn face(&mut self, target: Vec2) {
        self.direction = bearing_degrees(self.horizontal(), target);
    }

    /// Move along the current bearing. `speed` is in distance units per hour.
    /// Returns the distance covered.
    pub fn advance(&mut self, speed: f32, dt: Duration) -> f32 {
        let step = speed / 3600.0 * dt.as_secs_f32();
        let delta = heading(self.direction) * step;
        self.position.x += delta.x;
        self.position.y += delta.y;
        self.total_distance += step;
        step
    }

    pub fn horizontal_distance_to(&self, point: Vec3) -> f32 {
        self.horizontal().distance(point.truncate())
    }

    pub fn in_vertical_range(&self, target_z: f32, band: f32) -> bool {
        (self.position.z - target_z).abs() <= band
    }

    /// Step altitude toward `target_z`, snapping once within `band`.
    ///
    /// A step never overshoots, so `|z - target_z|` shrinks every call until it is
    /// exactly zero.
    pub fn converge_altitude(&mut self, target_z: f32, step: f32, band: f32) {
        if self.in_vertical_range(target_z, band) {
            self.position.z = target_z;
            return;
        }
        let gap = target_z - self.position.z;
        if gap.abs() <= step {
            self.position.z = target_z;
        } else {
            self.position.z += gap.signum() * step;
        }
        if self.in_vertical_range(target_z, band) {
            self.position.z = target_z;
        }
    }
}
