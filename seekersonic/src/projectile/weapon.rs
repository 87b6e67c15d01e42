use super::TickContext;
use super::guided::GuidedProjectile;
use super::host::WeaponId;
use super::state::ProjectileState;
use super::target::Target;
use crate::error::Result;
use crate::manager::AudioDeviceManager;
use std::io::{Read, Write};
use std::rc::Weak;

/// What every weapon kind offers its host.
pub trait Weapon {
    fn fire(&mut self, ctx: &mut TickContext<'_>) -> Result<()>;

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()>;

    fn lock_on(&mut self, target: Weak<dyn Target>);

    fn save(&self, writer: &mut dyn Write) -> Result<()>;

    fn load(&mut self, reader: &mut dyn Read) -> Result<()>;

    /// Release audio. Idempotent.
    fn free(&mut self, audio: &AudioDeviceManager);
}

impl Weapon for GuidedProjectile {
    fn fire(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        GuidedProjectile::fire(self, ctx)
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        GuidedProjectile::tick(self, ctx)
    }

    fn lock_on(&mut self, target: Weak<dyn Target>) {
        GuidedProjectile::lock_on(self, target)
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        self.serialize(writer)
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        self.deserialize(reader)
    }

    fn free(&mut self, audio: &AudioDeviceManager) {
        GuidedProjectile::free(self, audio)
    }
}

/// The closed set of weapon kinds a host can hold.
#[derive(Debug)]
pub enum WeaponKind {
    GuidedMissile(GuidedProjectile),
}

impl WeaponKind {
    pub fn id(&self) -> WeaponId {
        match self {
            Self::GuidedMissile(missile) => missile.id(),
        }
    }

    pub fn state(&self) -> ProjectileState {
        match self {
            Self::GuidedMissile(missile) => missile.state(),
        }
    }

    /// The host has been told it may drop this weapon.
    pub fn is_disposed(&self) -> bool {
        match self {
            Self::GuidedMissile(missile) => missile.is_disposed(),
        }
    }
}

impl From<GuidedProjectile> for WeaponKind {
    fn from(missile: GuidedProjectile) -> Self {
        Self::GuidedMissile(missile)
    }
}

impl Weapon for WeaponKind {
    fn fire(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        match self {
            Self::GuidedMissile(missile) => missile.fire(ctx),
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        match self {
            Self::GuidedMissile(missile) => missile.tick(ctx),
        }
    }

    fn lock_on(&mut self, target: Weak<dyn Target>) {
        match self {
            Self::GuidedMissile(missile) => missile.lock_on(target),
        }
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        match self {
            Self::GuidedMissile(missile) => missile.serialize(writer),
        }
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        match self {
            Self::GuidedMissile(missile) => missile.deserialize(reader),
        }
    }

    fn free(&mut self, audio: &AudioDeviceManager) {
        match self {
            Self::GuidedMissile(missile) => missile.free(audio),
        }
    }
}
