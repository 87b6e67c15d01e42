use std::time::Duration;

/// Gameplay tuning for the guided missile.
#[derive(Debug, Clone)]
pub struct GuidedMissileTuning {
    /// Time the missile spends "in the tube" after launch before it starts tracking.
    pub arming_delay: Duration,

    /// Altitude correction applied per tick while converging on the target.
    pub vertical_step: f32,

    /// Altitude band inside which the missile snaps to the target's altitude.
    pub vertical_band: f32,

    /// Cumulative distance after which the missile gives up.
    pub max_travel_distance: f32,

    /// Horizontal radius of the proximity fuse.
    pub strike_radius: f32,

    /// Speed in distance units per hour when fired from a ground launcher.
    pub cruise_speed: f32,

    /// Speed in distance units per hour when fired from a flying launcher.
    pub carrier_speed: f32,

    /// Damage reported against high-durability targets.
    pub high_durability_damage: i32,

    /// Damage reported against every other target.
    pub default_damage: i32,

    /// Number of impact cue variants, picked uniformly from `1..=impact_variants`.
    pub impact_variants: i32,
}

impl Default for GuidedMissileTuning {
    fn default() -> Self {
        Self {
            arming_delay: Duration::from_secs(2),
            vertical_step: 10.0,
            vertical_band: 10.0,
            max_travel_distance: 30.0,
            strike_radius: 0.25,
            cruise_speed: 900.0,
            carrier_speed: 1800.0,
            high_durability_damage: 1500,
            default_damage: 100_000,
            impact_variants: 2,
        }
    }
}

/// Asset names of the guided missile's cues, resolved against the sound directory.
#[derive(Debug, Clone)]
pub struct GuidedMissileCues {
    pub launch: String,
    pub flight: String,
    pub lock_confirm: String,
    /// Impact cues are `<impact_prefix><n>.wav`
    pub impact_prefix: String,
}

impl Default for GuidedMissileCues {
    fn default() -> Self {
        Self {
            launch: "cr1.wav".to_string(),
            flight: "cr2.wav".to_string(),
            lock_confirm: "fox3.wav".to_string(),
            impact_prefix: "m3-".to_string(),
        }
    }
}

impl GuidedMissileCues {
    pub fn impact(&self, variant: i32) -> String {
        format!("{}{}.wav", self.impact_prefix, variant)
    }
}
