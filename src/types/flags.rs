//! Frame annotation flags

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Bitset of error and display annotations attached to a [`Frame`](super::Frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameFlags(pub u8);

impl FrameFlags {
    pub const PARITY_ERROR: FrameFlags = FrameFlags(0x01);
    pub const INVALID_COMMAND: FrameFlags = FrameFlags(0x02);
    pub const INCOMPLETE_PACKET: FrameFlags = FrameFlags(0x04);
    pub const INVALID_MASTER_ID: FrameFlags = FrameFlags(0x08);
    pub const DISPLAY_AS_WARNING: FrameFlags = FrameFlags(0x40);
    pub const DISPLAY_AS_ERROR: FrameFlags = FrameFlags(0x80);

    pub const fn empty() -> Self {
        FrameFlags(0)
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `flag` is set.
    pub const fn contains(&self, flag: FrameFlags) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Get the raw value.
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl BitOr for FrameFlags {
    type Output = FrameFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        FrameFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FrameFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Flags on the header of a packet that resumed after an unexpected start condition.
pub const RESYNC_START: FrameFlags = FrameFlags(
    FrameFlags::DISPLAY_AS_ERROR.0
        | FrameFlags::DISPLAY_AS_WARNING.0
        | FrameFlags::INCOMPLETE_PACKET.0,
);

/// Flags on a Parity frame whose sampled bit disagrees with the computed parity.
pub const PARITY_MISMATCH: FrameFlags = FrameFlags(
    FrameFlags::DISPLAY_AS_ERROR.0 | FrameFlags::DISPLAY_AS_WARNING.0 | FrameFlags::PARITY_ERROR.0,
);

/// Flags on the Command frame of a reserved command.
pub const RESERVED_COMMAND: FrameFlags = FrameFlags(
    FrameFlags::DISPLAY_AS_ERROR.0
        | FrameFlags::DISPLAY_AS_WARNING.0
        | FrameFlags::INVALID_COMMAND.0,
);

/// Flags on the ErrorCase frame that closes an aborted packet.
pub const ABORTED_PACKET: FrameFlags =
    FrameFlags(FrameFlags::DISPLAY_AS_ERROR.0 | FrameFlags::INCOMPLETE_PACKET.0);
