use super::target::TargetId;

/// Identity of a weapon instance, reported back on disposal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WeaponId(pub u64);

impl std::fmt::Display for WeaponId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WeaponId({})", self.0)
    }
}

/// Who pulled the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Player,
    Ai,
}

/// Messages delivered to a target through the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    MissileLaunch,
}

/// The host simulation's side of a weapon: entity messaging, combat resolution
/// and the owner's disposal hook.
pub trait WeaponHost {
    fn notify_of(&mut self, target: TargetId, notification: Notification, flag: bool);

    /// Report a resolved hit to the combat system.
    fn fire_hit_event(&mut self, target: TargetId, amount: i32);

    /// The weapon is done and may be dropped. Sent exactly once.
    fn weapon_disposed(&mut self, weapon: WeaponId);

    /// Player launch feedback (force feedback, screen shake). Optional.
    fn start_launch_effect(&mut self) {}
}

/// Uniform integer source.
pub trait RandomSource {
    /// A value in `lo..=hi`. Returns `lo` when the range is empty.
    fn random_inclusive(&mut self, lo: i32, hi: i32) -> i32;
}

impl<R: rand::Rng + ?Sized> RandomSource for R {
    fn random_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.gen_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_inclusive_covers_both_ends() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 2];
        for _ in 0..200 {
            let v = rng.random_inclusive(1, 2);
            assert!((1..=2).contains(&v));
            seen[(v - 1) as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_empty_range_returns_low() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(rng.random_inclusive(3, 3), 3);
        assert_eq!(rng.random_inclusive(5, 1), 5);
    }
}
