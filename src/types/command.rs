//! Command byte classification
//!
//! The command byte alone determines the command type and, for the extended
//! commands, the encoded payload length. Classification is total: every value
//! 0x00..=0xFF maps to exactly one [`CommandType`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FrameKind;

/// Highest master id a master-class command may address.
pub const MAX_MASTER_ID: u8 = 0x3;

/// RFFE command type, derived from the 8-bit command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandType {
    /// Extended register write, 0x00..=0x0F
    ExtWrite = 0,
    /// 0x10..=0x1B
    Reserved = 1,
    /// 0x1C
    MasterRead = 2,
    /// 0x1D
    MasterWrite = 3,
    /// 0x1E
    MasterHandoff = 4,
    /// 0x1F
    Interrupt = 5,
    /// Extended register read, 0x20..=0x2F
    ExtRead = 6,
    /// Extended long register write, 0x30..=0x37
    ExtLongWrite = 7,
    /// Extended long register read, 0x38..=0x3F
    ExtLongRead = 8,
    /// Register write, 0x40..=0x5F
    NormalWrite = 9,
    /// Register read, 0x60..=0x7F
    NormalRead = 10,
    /// Register 0 write, 0x80..=0xFF
    Write0 = 11,
}

/// A field packed into the low bits of the command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineField {
    /// Frame kind reported for the field
    pub kind: FrameKind,
    /// Width in bits, counted from bit 0 of the command byte
    pub width: u32,
}

impl InlineField {
    pub const fn mask(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }
}

impl CommandType {
    pub const ALL: [CommandType; 12] = [
        CommandType::ExtWrite,
        CommandType::Reserved,
        CommandType::MasterRead,
        CommandType::MasterWrite,
        CommandType::MasterHandoff,
        CommandType::Interrupt,
        CommandType::ExtRead,
        CommandType::ExtLongWrite,
        CommandType::ExtLongRead,
        CommandType::NormalWrite,
        CommandType::NormalRead,
        CommandType::Write0,
    ];

    /// Classify a command byte.
    pub const fn classify(command: u8) -> Self {
        match command {
            0x00..=0x0F => CommandType::ExtWrite,
            0x10..=0x1B => CommandType::Reserved,
            0x1C => CommandType::MasterRead,
            0x1D => CommandType::MasterWrite,
            0x1E => CommandType::MasterHandoff,
            0x1F => CommandType::Interrupt,
            0x20..=0x2F => CommandType::ExtRead,
            0x30..=0x37 => CommandType::ExtLongWrite,
            0x38..=0x3F => CommandType::ExtLongRead,
            0x40..=0x5F => CommandType::NormalWrite,
            0x60..=0x7F => CommandType::NormalRead,
            0x80..=0xFF => CommandType::Write0,
        }
    }

    /// Inverse of the `repr(u8)` discriminant, as carried in Command frames.
    pub fn from_discriminant(value: u64) -> Option<Self> {
        Self::ALL.get(usize::try_from(value).ok()?).copied()
    }

    /// Master-class commands carry a master id in the address nibble.
    pub const fn is_master(self) -> bool {
        matches!(
            self,
            CommandType::MasterRead | CommandType::MasterWrite | CommandType::MasterHandoff
        )
    }

    /// Field packed into the low bits of the command byte, if any.
    pub const fn inline_field(self) -> Option<InlineField> {
        match self {
            CommandType::ExtWrite | CommandType::ExtRead => {
                Some(InlineField { kind: FrameKind::ExtByteCount, width: 4 })
            }
            CommandType::ExtLongWrite | CommandType::ExtLongRead => {
                Some(InlineField { kind: FrameKind::ExtLongByteCount, width: 3 })
            }
            CommandType::NormalWrite | CommandType::NormalRead => {
                Some(InlineField { kind: FrameKind::Address, width: 5 })
            }
            CommandType::Write0 => Some(InlineField { kind: FrameKind::ShortData, width: 7 }),
            CommandType::Reserved
            | CommandType::MasterRead
            | CommandType::MasterWrite
            | CommandType::MasterHandoff
            | CommandType::Interrupt => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CommandType::ExtWrite => "ExtWr",
            CommandType::Reserved => "Rsvd",
            CommandType::MasterRead => "MstRd",
            CommandType::MasterWrite => "MstWr",
            CommandType::MasterHandoff => "MstHO",
            CommandType::Interrupt => "Int",
            CommandType::ExtRead => "ExtRd",
            CommandType::ExtLongWrite => "ExtLngWr",
            CommandType::ExtLongRead => "ExtLngRd",
            CommandType::NormalWrite => "Wr",
            CommandType::NormalRead => "Rd",
            CommandType::Write0 => "Wr0",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of payload data bytes minus one for a command byte.
///
/// Extended commands encode the count in the command byte. Master read and
/// write always move two bytes; everything else moves one (or none).
pub const fn byte_count(command: u8) -> u8 {
    match CommandType::classify(command) {
        CommandType::ExtWrite | CommandType::ExtRead => command & 0x0F,
        CommandType::ExtLongWrite | CommandType::ExtLongRead => command & 0x07,
        CommandType::MasterRead | CommandType::MasterWrite => 1,
        CommandType::Reserved
        | CommandType::MasterHandoff
        | CommandType::Interrupt
        | CommandType::NormalWrite
        | CommandType::NormalRead
        | CommandType::Write0 => 0,
    }
}

/// Odd parity bit for a value of any width.
pub const fn odd_parity(value: u64) -> bool {
    (value.count_ones() + 1) % 2 == 1
}
