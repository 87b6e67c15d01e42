//! Speaker topologies and their channel layouts.
//!
//! Every supported topology is listed once in [`SpeakerConfiguration::ALL`] with its
//! speakers in output channel order. Channel masks use the standard speaker bit
//! values, so a device's mask (or, with cpal, its channel count) maps to exactly one
//! configuration or is reported as unrecognized.

/// A physical speaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    FrontLeft,
    FrontRight,
    FrontCenter,
    LowFrequency,
    BackLeft,
    BackRight,
    FrontLeftOfCenter,
    FrontRightOfCenter,
    BackCenter,
    SideLeft,
    SideRight,
}

impl Speaker {
    /// Channel mask bit of this speaker.
    pub const fn mask(self) -> u32 {
        match self {
            Self::FrontLeft => 0x1,
            Self::FrontRight => 0x2,
            Self::FrontCenter => 0x4,
            Self::LowFrequency => 0x8,
            Self::BackLeft => 0x10,
            Self::BackRight => 0x20,
            Self::FrontLeftOfCenter => 0x40,
            Self::FrontRightOfCenter => 0x80,
            Self::BackCenter => 0x100,
            Self::SideLeft => 0x200,
            Self::SideRight => 0x400,
        }
    }

    /// Azimuth in radians, 0 straight ahead and positive to the right.
    /// `None` for the non-directional LFE channel.
    pub fn azimuth(self) -> Option<f32> {
        let degrees: f32 = match self {
            Self::FrontLeft => -30.0,
            Self::FrontRight => 30.0,
            Self::FrontCenter => 0.0,
            Self::LowFrequency => return None,
            Self::BackLeft => -135.0,
            Self::BackRight => 135.0,
            Self::FrontLeftOfCenter => -15.0,
            Self::FrontRightOfCenter => 15.0,
            Self::BackCenter => 180.0,
            Self::SideLeft => -90.0,
            Self::SideRight => 90.0,
        };
        Some(degrees.to_radians())
    }

    /// Left-hand member of a stereo pan pair.
    pub fn pans_left(self) -> bool {
        matches!(self, Self::FrontLeft | Self::BackLeft | Self::SideLeft)
    }

    /// Right-hand member of a stereo pan pair.
    pub fn pans_right(self) -> bool {
        matches!(self, Self::FrontRight | Self::BackRight | Self::SideRight)
    }
}

use Speaker::*;

/// Output channel topology of a playback device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeakerConfiguration {
    Mono,
    Stereo,
    TwoPointOne,
    /// Front left/right/center plus back center
    Surround,
    Quad,
    FourPointOne,
    FivePointOne,
    /// 5.1 with front left/right of center
    SevenPointOne,
    /// 5.1 using side instead of back speakers
    FivePointOneSurround,
    SevenPointOneSurround,
}

impl SpeakerConfiguration {
    pub const ALL: [SpeakerConfiguration; 10] = [
        Self::Mono,
        Self::Stereo,
        Self::TwoPointOne,
        Self::Surround,
        Self::Quad,
        Self::FourPointOne,
        Self::FivePointOne,
        Self::SevenPointOne,
        Self::FivePointOneSurround,
        Self::SevenPointOneSurround,
    ];

    /// Speakers in output channel order.
    pub fn speakers(self) -> &'static [Speaker] {
        match self {
            Self::Mono => &[FrontCenter],
            Self::Stereo => &[FrontLeft, FrontRight],
            Self::TwoPointOne => &[FrontLeft, FrontRight, LowFrequency],
            Self::Surround => &[FrontLeft, FrontRight, FrontCenter, BackCenter],
            Self::Quad => &[FrontLeft, FrontRight, BackLeft, BackRight],
            Self::FourPointOne => &[FrontLeft, FrontRight, LowFrequency, BackLeft, BackRight],
            Self::FivePointOne => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                BackLeft,
                BackRight,
            ],
            Self::SevenPointOne => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                BackLeft,
                BackRight,
                FrontLeftOfCenter,
                FrontRightOfCenter,
            ],
            Self::FivePointOneSurround => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                SideLeft,
                SideRight,
            ],
            Self::SevenPointOneSurround => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                BackLeft,
                BackRight,
                SideLeft,
                SideRight,
            ],
        }
    }

    pub fn channel_count(self) -> usize {
        self.speakers().len()
    }

    pub fn channel_mask(self) -> u32 {
        self.speakers().iter().fold(0, |mask, s| mask | s.mask())
    }

    /// Configuration whose speaker set is exactly `mask`.
    pub fn from_channel_mask(mask: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.channel_mask() == mask)
    }

    /// Configuration a device with `channels` interleaved outputs is assumed to drive.
    ///
    /// Output APIs that only report a channel count (cpal) use the conventional
    /// layout for that count. Counts without one (7, or more than 8) are unrecognized.
    pub fn from_channel_count(channels: u16) -> Option<Self> {
        match channels {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            3 => Some(Self::TwoPointOne),
            4 => Some(Self::Quad),
            5 => Some(Self::FourPointOne),
            6 => Some(Self::FivePointOne),
            8 => Some(Self::SevenPointOneSurround),
            _ => None,
        }
    }

    /// Output channel indices that carry the left and right halves of a pan.
    pub fn pan_channels(self) -> (Vec<usize>, Vec<usize>) {
        let speakers = self.speakers();
        let left = (0..speakers.len()).filter(|&i| speakers[i].pans_left()).collect();
        let right = (0..speakers.len()).filter(|&i| speakers[i].pans_right()).collect();
        (left, right)
    }
}
