/// Engagement phase of a guided projectile.
///
/// `Idle → Launched → Tracking → {Impacted | LostLock} → Finished`. A projectile
/// in `Impacted` or `LostLock` has stopped flying but may still have a cue
/// playing. `Finished` means the disposal notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileState {
    /// Built but not fired
    Idle,
    /// Fired and still inside the arming delay
    Launched,
    Tracking,
    Impacted,
    LostLock,
    Finished,
}

impl std::fmt::Display for ProjectileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Launched => "launched",
            Self::Tracking => "tracking",
            Self::Impacted => "impacted",
            Self::LostLock => "lost lock",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}
