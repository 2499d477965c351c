//! Committed packets: one bus transaction worth of frames

use serde::{Deserialize, Serialize};

use super::{CommandType, Frame, FrameFlags, FrameKind, Marker};

/// Whether a packet ran to its final bus park.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketStatus {
    Complete,
    /// Cut short by an unexpected start condition
    Incomplete,
}

/// Frames and markers of one bus transaction, in decode order.
///
/// The first frame is always the start condition, followed by the slave
/// address and the command. Everything after depends on the command type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub frames: Vec<Frame>,
    pub markers: Vec<Marker>,
    pub status: PacketStatus,
}

impl Packet {
    pub fn is_complete(&self) -> bool {
        self.status == PacketStatus::Complete
    }

    /// First and last sample covered by the packet's frames.
    pub fn span(&self) -> Option<(u64, u64)> {
        let first = self.frames.first()?;
        let last = self.frames.last()?;
        Some((first.start, last.end))
    }

    fn first_of(&self, kind: FrameKind) -> Option<&Frame> {
        self.frames.iter().find(|frame| frame.kind == kind)
    }

    pub fn start_condition(&self) -> Option<&Frame> {
        self.first_of(FrameKind::StartCondition)
    }

    /// Slave address (or master id) from the header.
    pub fn slave_address(&self) -> Option<u8> {
        self.first_of(FrameKind::SlaveAddress).map(|frame| frame.value as u8)
    }

    pub fn command_type(&self) -> Option<CommandType> {
        self.first_of(FrameKind::Command).and_then(|frame| CommandType::from_discriminant(frame.value))
    }

    /// Raw command byte from the header.
    pub fn command_byte(&self) -> Option<u8> {
        self.first_of(FrameKind::Command).map(|frame| frame.aux as u8)
    }

    /// Byte count encoded in an extended command.
    pub fn byte_count(&self) -> Option<u8> {
        self.frames
            .iter()
            .find(|frame| {
                matches!(frame.kind, FrameKind::ExtByteCount | FrameKind::ExtLongByteCount)
            })
            .map(|frame| frame.value as u8)
    }

    /// Value packed into the command byte: register address, byte count, or Write0 data.
    pub fn inline_value(&self) -> Option<u8> {
        let command_type = self.command_type()?;
        let field = command_type.inline_field()?;
        self.first_of(field.kind).map(|frame| frame.value as u8)
    }

    /// Address and data bytes after the header, in wire order.
    pub fn payload(&self) -> Vec<u8> {
        let header_parity = self.frames.iter().position(|frame| frame.kind == FrameKind::Parity);
        let Some(header_parity) = header_parity else {
            return Vec::new();
        };
        self.frames[header_parity + 1..]
            .iter()
            .filter(|frame| frame.kind.is_payload_byte())
            .map(|frame| frame.value as u8)
            .collect()
    }

    /// Interrupt-slot bits as a mask, bit `n` for slot `n`.
    pub fn interrupt_slots(&self) -> Option<u16> {
        let mut slots = self.frames.iter().filter(|frame| frame.kind == FrameKind::InterruptSlot).peekable();
        slots.peek()?;
        Some(slots.fold(0u16, |mask, frame| {
            if frame.value != 0 { mask | (1 << frame.aux) } else { mask }
        }))
    }

    pub fn has_flag(&self, flag: FrameFlags) -> bool {
        self.frames.iter().any(|frame| frame.has_flag(flag))
    }

    pub fn parity_errors(&self) -> usize {
        self.frames.iter().filter(|frame| frame.has_flag(FrameFlags::PARITY_ERROR)).count()
    }

    /// Frame kinds in order, mostly useful in tests and logs.
    pub fn kinds(&self) -> Vec<FrameKind> {
        self.frames.iter().map(|frame| frame.kind).collect()
    }
}
