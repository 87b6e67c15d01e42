//! Save checkpoint of a weapon in flight.
//!
//! Layout, little endian:
//!
//! ```text
//! base:   x f32 | y f32 | z f32 | direction f32 | total_distance f32 | finished u8
//! guided: launch_time i64
//! ```

use super::flight::FlightState;
use super::guided::GuidedProjectile;
use super::state::ProjectileState;
use crate::error::Result;
use crate::math::Vec3;
use std::io::{self, Read, Write};

fn read_f32(reader: &mut dyn Read) -> io::Result<f32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(f32::from_le_bytes(bytes))
}

fn read_i64(reader: &mut dyn Read) -> io::Result<i64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(i64::from_le_bytes(bytes))
}

/// Write the shared flight checkpoint.
pub fn write_checkpoint(writer: &mut dyn Write, flight: &FlightState) -> io::Result<()> {
    for value in [
        flight.position.x,
        flight.position.y,
        flight.position.z,
        flight.direction,
        flight.total_distance,
    ] {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.write_all(&[flight.finished as u8])
}

/// Read the shared flight checkpoint.
pub fn read_checkpoint(reader: &mut dyn Read) -> io::Result<FlightState> {
    let x = read_f32(reader)?;
    let y = read_f32(reader)?;
    let z = read_f32(reader)?;
    let direction = read_f32(reader)?;
    let total_distance = read_f32(reader)?;

    let mut finished = [0u8; 1];
    reader.read_exact(&mut finished)?;
    let finished = match finished[0] {
        0 => false,
        1 => true,
        other => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid finished flag {}", other),
            ));
        }
    };

    Ok(FlightState {
        position: Vec3::new(x, y, z),
        direction,
        total_distance,
        finished,
    })
}

impl GuidedProjectile {
    /// Write the flight checkpoint followed by the launch timestamp.
    pub fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        write_checkpoint(writer, self.flight())?;
        writer.write_all(&self.launch_time().to_le_bytes())?;
        Ok(())
    }

    /// Restore from [`serialize`](Self::serialize) output.
    ///
    /// The launch timestamp is only read once the flight checkpoint has been
    /// read successfully. Nothing is modified on failure. A restored missile is
    /// in flight (`Launched`, re-arming against its launch time) or, if the
    /// checkpoint was finished, waiting in `LostLock` for its disposal tick.
    pub fn deserialize(&mut self, reader: &mut dyn Read) -> Result<()> {
        let flight = read_checkpoint(reader)?;
        let launch_time = read_i64(reader)?;

        *self.flight_mut() = flight;
        self.set_launch_time(launch_time);
        self.set_state(if flight.finished {
            ProjectileState::LostLock
        } else {
            ProjectileState::Launched
        });
        log::debug!("{} restored at {:?}, launched at {}", self.id(), flight.position, launch_time);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeekerSonicError;
    use crate::projectile::Controller;
    use crate::projectile::testing::Rig;
    use proptest::prelude::*;

    #[test]
    fn test_checkpoint_layout() {
        let flight = FlightState {
            position: Vec3::new(1.0, 2.0, 3.0),
            direction: 90.0,
            total_distance: 4.5,
            finished: true,
        };
        let mut bytes = Vec::new();
        write_checkpoint(&mut bytes, &flight).unwrap();
        assert_eq!(bytes.len(), 21);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(bytes[20], 1);
        assert_eq!(read_checkpoint(&mut bytes.as_slice()).unwrap(), flight);
    }

    #[test]
    fn test_truncated_base_short_circuits() {
        let rig = Rig::new();
        let mut missile = rig.missile(Controller::Ai, Vec3::ZERO);
        let before = *missile.flight();

        let bytes = [0u8; 10];
        let mut reader: &[u8] = &bytes;
        let err = missile.deserialize(&mut reader).unwrap_err();
        assert!(matches!(err, SeekerSonicError::Io(_)));
        assert_eq!(*missile.flight(), before);
        assert_eq!(missile.state(), ProjectileState::Idle);
    }

    #[test]
    fn test_bad_finished_flag_is_rejected() {
        let mut bytes = vec![0u8; 20];
        bytes.push(7);
        bytes.extend_from_slice(&5i64.to_le_bytes());
        let err = read_checkpoint(&mut bytes.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_timestamp_follows_base() {
        let rig = Rig::new();
        let missile = rig.missile(Controller::Ai, Vec3::new(1.0, 2.0, 3.0));
        let mut bytes = Vec::new();
        missile.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 29);
        assert_eq!(&bytes[21..], &missile.launch_time().to_le_bytes());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn launch_time_round_trips(
            launch_time in any::<i64>(),
            x in -1.0e6f32..1.0e6,
            y in -1.0e6f32..1.0e6,
            finished in any::<bool>(),
        ) {
            let rig = Rig::new();
            let mut original = rig.missile(Controller::Ai, Vec3::new(x, y, 0.0));
            original.set_launch_time(launch_time);
            original.flight_mut().finished = finished;

            let mut bytes = Vec::new();
            original.serialize(&mut bytes).unwrap();

            let mut restored = rig.missile(Controller::Ai, Vec3::ZERO);
            restored.deserialize(&mut bytes.as_slice()).unwrap();
            prop_assert_eq!(restored.launch_time(), launch_time);
            prop_assert_eq!(restored.flight(), original.flight());
            prop_assert_eq!(restored.is_finished(), finished);
        }
    }
}
