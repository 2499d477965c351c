//! Decoded frames and display markers

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FrameFlags, Line};

/// Kind of protocol field a [`Frame`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FrameKind {
    StartCondition,
    /// Slave address, or master id for master-class commands
    SlaveAddress,
    Command,
    ExtByteCount,
    ExtLongByteCount,
    Address,
    AddressHigh,
    AddressLow,
    /// 7-bit immediate data of a Write0 command
    ShortData,
    Data,
    MasterHandoffAck,
    InterruptSummary,
    InterruptSlot,
    Parity,
    BusPark,
    ErrorCase,
}

impl FrameKind {
    pub const fn name(self) -> &'static str {
        match self {
            FrameKind::StartCondition => "SSC",
            FrameKind::SlaveAddress => "SA",
            FrameKind::Command => "Command",
            FrameKind::ExtByteCount => "ByteCount",
            FrameKind::ExtLongByteCount => "LongByteCount",
            FrameKind::Address => "Address",
            FrameKind::AddressHigh => "AddressHi",
            FrameKind::AddressLow => "AddressLo",
            FrameKind::ShortData => "ShortData",
            FrameKind::Data => "Data",
            FrameKind::MasterHandoffAck => "MasterHandoffAck",
            FrameKind::InterruptSummary => "ISI",
            FrameKind::InterruptSlot => "IntSlot",
            FrameKind::Parity => "Parity",
            FrameKind::BusPark => "BusPark",
            FrameKind::ErrorCase => "ErrorCase",
        }
    }

    /// Byte-wide payload fields, each followed by a data parity bit.
    pub const fn is_payload_byte(self) -> bool {
        matches!(
            self,
            FrameKind::Address
                | FrameKind::AddressHigh
                | FrameKind::AddressLow
                | FrameKind::Data
                | FrameKind::MasterHandoffAck
        )
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded protocol field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub kind: FrameKind,
    /// Field value
    pub value: u64,
    /// Kind-specific extra: command byte, slot index, or data-parity marker
    pub aux: u64,
    /// First sample of the field, inclusive
    pub start: u64,
    /// Last sample of the field, inclusive
    pub end: u64,
    pub flags: FrameFlags,
}

impl Frame {
    pub fn has_flag(&self, flag: FrameFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// Glyph placed on a line to annotate a decoded bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarkerKind {
    #[default]
    Dot,
    Start,
    Stop,
    One,
    Zero,
    ErrorDot,
    DownArrow,
}

/// Position-anchored annotation emitted alongside frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub sample: u64,
    pub kind: MarkerKind,
    pub line: Line,
}
