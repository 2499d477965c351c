//! Core types for decoded bus traffic.
//!
//! ## Architecture
//!
//! - [`BitState`], [`ChannelId`] and [`Line`] describe the raw two-wire bus
//! - [`CommandType`] classifies the command byte; [`byte_count`] and
//!   [`odd_parity`] are the other pure helpers the decoder and generator share
//! - [`Frame`] is one decoded field, annotated by [`FrameFlags`]
//! - [`Packet`] is one committed transaction: frames plus [`Marker`]s
//!
//! ## Usage Example
//!
//! ```rust
//! use rffe::types::{CommandType, byte_count, odd_parity};
//!
//! assert_eq!(CommandType::classify(0x05), CommandType::ExtWrite);
//! assert_eq!(byte_count(0x05), 5);
//! assert!(odd_parity(0));
//! ```

mod bit_state;
mod command;
mod flags;
mod frame;
mod packet;

pub use bit_state::{BitState, ChannelId, Line};
pub use command::{CommandType, InlineField, MAX_MASTER_ID, byte_count, odd_parity};
pub use flags::{ABORTED_PACKET, FrameFlags, PARITY_MISMATCH, RESERVED_COMMAND, RESYNC_START};
pub use frame::{Frame, FrameKind, Marker, MarkerKind};
pub use packet::{Packet, PacketStatus};

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(kind: FrameKind, value: u64, aux: u64) -> Frame {
        Frame { kind, value, aux, start: 0, end: 0, flags: FrameFlags::empty() }
    }

    #[test]
    fn packet_accessors_read_header_and_payload() {
        let packet = Packet {
            frames: vec![
                frame(FrameKind::StartCondition, 0, 0),
                frame(FrameKind::SlaveAddress, 0xA, 0),
                frame(FrameKind::Command, CommandType::ExtLongWrite as u64, 0x31),
                frame(FrameKind::ExtLongByteCount, 1, 0),
                frame(FrameKind::Parity, 1, 0),
                frame(FrameKind::AddressHigh, 0x12, 0),
                frame(FrameKind::Parity, 1, 1),
                frame(FrameKind::AddressLow, 0x34, 0),
                frame(FrameKind::Parity, 0, 1),
                frame(FrameKind::Data, 0x56, 0),
                frame(FrameKind::Parity, 0, 1),
                frame(FrameKind::Data, 0x78, 0),
                frame(FrameKind::Parity, 1, 1),
                frame(FrameKind::BusPark, 0, 0),
            ],
            markers: Vec::new(),
            status: PacketStatus::Complete,
        };

        assert_eq!(packet.slave_address(), Some(0xA));
        assert_eq!(packet.command_type(), Some(CommandType::ExtLongWrite));
        assert_eq!(packet.command_byte(), Some(0x31));
        assert_eq!(packet.byte_count(), Some(1));
        assert_eq!(packet.inline_value(), Some(1));
        assert_eq!(packet.payload(), vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(packet.interrupt_slots(), None);
        assert_eq!(packet.parity_errors(), 0);
    }

    #[test]
    fn normal_write_inline_address_is_not_payload() {
        let packet = Packet {
            frames: vec![
                frame(FrameKind::StartCondition, 0, 0),
                frame(FrameKind::SlaveAddress, 0x5, 0),
                frame(FrameKind::Command, CommandType::NormalWrite as u64, 0x47),
                frame(FrameKind::Address, 0x07, 0),
                frame(FrameKind::Parity, 0, 0),
                frame(FrameKind::Data, 0x99, 0),
                frame(FrameKind::Parity, 1, 1),
                frame(FrameKind::BusPark, 0, 0),
            ],
            markers: Vec::new(),
            status: PacketStatus::Complete,
        };

        assert_eq!(packet.inline_value(), Some(0x07));
        assert_eq!(packet.payload(), vec![0x99]);
    }

    #[test]
    fn interrupt_slots_fold_into_mask() {
        let mut frames = vec![
            frame(FrameKind::StartCondition, 0, 0),
            frame(FrameKind::SlaveAddress, 0x5, 0),
            frame(FrameKind::Command, CommandType::Interrupt as u64, 0x1F),
        ];
        for slot in (0..16u64).rev() {
            frames.push(frame(FrameKind::InterruptSlot, (slot % 5 == 0) as u64, slot));
        }
        let packet = Packet { frames, markers: Vec::new(), status: PacketStatus::Complete };

        assert_eq!(packet.interrupt_slots(), Some(0b1000_0100_0010_0001));
    }
}
