use crate::math::Vec3;

/// Identity of a lockable entity, used when reporting to the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TargetId({})", self.0)
    }
}

/// Damage classification of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetClass {
    #[default]
    Standard,
    /// Boss-class targets. A guided hit is capped so one missile cannot destroy them.
    HighDurability,
}

/// An entity a projectile can lock on to.
///
/// Projectiles hold targets weakly. A target that has been dropped by its owner
/// counts as a lost lock.
pub trait Target {
    fn id(&self) -> TargetId;

    fn position(&self) -> Vec3;

    /// Polled every tracking tick. False ends the engagement.
    fn is_valid_lock(&self) -> bool;

    fn class(&self) -> TargetClass {
        TargetClass::Standard
    }

    /// Only aircraft receive incoming-missile warnings.
    fn is_aircraft(&self) -> bool {
        true
    }
}
