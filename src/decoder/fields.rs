//! Field-level decoding
//!
//! Each method decodes one protocol field starting at an SCLK rising edge and
//! leaves the cursor on the rising edge that starts the next field. Bit
//! boundaries are recorded in `clk_offsets` (rising edges) and `data_offsets`
//! (falling edges where SDATA was sampled) so frames can span whole bits.

use tracing::{debug, trace};

use super::cursor::ScanStop;
use super::sink::ResultsSink;
use super::Decoder;
use crate::capture::ChannelData;
use crate::types::{
    BitState, CommandType, FrameFlags, FrameKind, Frame, Line, MAX_MASTER_ID, Marker, MarkerKind,
    PARITY_MISMATCH, RESERVED_COMMAND, RESYNC_START, byte_count, odd_parity,
};

pub(super) type FieldResult<T = ()> = Result<T, ScanStop>;

/// Header bits: 4-bit address followed by the 8-bit command byte.
const HEADER_BITS: usize = 12;

impl<C: ChannelData> Decoder<C> {
    /// Locate the next start condition and emit its frame.
    ///
    /// A start condition already seen by an aborted packet is reused instead
    /// of scanning, and its frame is flagged as a resynchronisation.
    pub(super) fn find_start_condition<S: ResultsSink>(&mut self, sink: &mut S) -> FieldResult {
        if !self.cursor.both_lines_active() {
            return Err(ScanStop::Exhausted);
        }

        let (start, flags) = match self.pending_start.take() {
            Some(at) => {
                debug!("Resuming at start condition from sample {}", at);
                (at, RESYNC_START)
            }
            None => (self.cursor.scan_for_start_condition()?, FrameFlags::empty()),
        };
        self.clk_offsets[0] = start;
        self.data_offsets[0] = start;

        self.clk_offsets[1] = self.cursor.advance_to_edge(BitState::High)?;
        self.markers[0] = MarkerKind::Start;
        self.emit_frame(sink, FrameKind::StartCondition, 0, 0, 0, 1, flags);
        Ok(())
    }

    /// Decode the address and command, then check the header parity.
    ///
    /// Returns the command type and its byte count.
    pub(super) fn find_command<S: ResultsSink>(
        &mut self,
        sink: &mut S,
    ) -> FieldResult<(CommandType, u8)> {
        let header = self.read_bits(sink, HEADER_BITS)?;
        let command_byte = (header & 0xFF) as u8;
        let address = (header >> 8) & 0xF;
        let command = CommandType::classify(command_byte);
        self.command = command;

        let mut flags = FrameFlags::empty();
        if command.is_master() && address > u64::from(MAX_MASTER_ID) {
            debug!("Master id {:#x} out of range for {}", address, command);
            flags = FrameFlags::INVALID_MASTER_ID;
        }
        self.emit_frame(sink, FrameKind::SlaveAddress, address, 0, 0, 4, flags);

        match command.inline_field() {
            Some(field) => {
                let split = HEADER_BITS - field.width as usize;
                let inline = u64::from(command_byte & field.mask());
                self.emit_frame(
                    sink,
                    FrameKind::Command,
                    command as u64,
                    u64::from(command_byte),
                    4,
                    split,
                    FrameFlags::empty(),
                );
                self.emit_frame(sink, field.kind, inline, 0, split, HEADER_BITS, FrameFlags::empty());
            }
            None => {
                let flags = if command == CommandType::Reserved {
                    debug!("Reserved command {:#04x}", command_byte);
                    RESERVED_COMMAND
                } else {
                    FrameFlags::empty()
                };
                self.emit_frame(
                    sink,
                    FrameKind::Command,
                    command as u64,
                    u64::from(command_byte),
                    4,
                    HEADER_BITS,
                    flags,
                );
            }
        }

        self.check_parity(sink, odd_parity(header), false)?;
        Ok((command, byte_count(command_byte)))
    }

    /// One 8-bit field followed by its data parity bit.
    pub(super) fn find_byte<S: ResultsSink>(&mut self, sink: &mut S, kind: FrameKind) -> FieldResult {
        let value = self.read_bits(sink, 8)?;
        self.emit_frame(sink, kind, value, 0, 0, 8, FrameFlags::empty());
        self.check_parity(sink, odd_parity(value), true)
    }

    /// Sample a parity bit and compare it with `expected`.
    ///
    /// A mismatch is flagged on the Parity frame; decoding carries on.
    pub(super) fn check_parity<S: ResultsSink>(
        &mut self,
        sink: &mut S,
        expected: bool,
        is_data_parity: bool,
    ) -> FieldResult {
        let sampled = self.read_bit(sink, 0)?.is_high();
        self.clk_offsets[1] = self.cursor.position();

        let mut flags = FrameFlags::empty();
        self.markers[0] = if sampled { MarkerKind::One } else { MarkerKind::Zero };
        if sampled != expected {
            debug!(
                "Parity mismatch at sample {}: sampled {}, expected {}",
                self.data_offsets[0], sampled as u8, expected as u8
            );
            flags = PARITY_MISMATCH;
            self.markers[0] = MarkerKind::ErrorDot;
        }

        self.emit_frame(
            sink,
            FrameKind::Parity,
            sampled as u64,
            is_data_parity as u64,
            0,
            1,
            flags,
        );
        Ok(())
    }

    /// Bus park: one undriven bit used for line turnaround.
    pub(super) fn find_bus_park<S: ResultsSink>(&mut self, sink: &mut S) -> FieldResult {
        self.markers[0] = MarkerKind::Stop;
        self.clk_offsets[0] = self.cursor.position();

        let falling = self.cursor.advance_to_edge(BitState::Low)?;
        self.data_offsets[0] = falling;
        let half_clock = falling - self.clk_offsets[0];

        // A close rising edge belongs to the park; otherwise pad by half a period.
        self.clk_offsets[1] = if self.cursor.sclk_transition_within(half_clock + 2) {
            self.cursor.advance_to_edge(BitState::High)?
        } else {
            falling + half_clock
        };

        self.emit_frame(sink, FrameKind::BusPark, 0, 0, 0, 1, FrameFlags::empty());
        Ok(())
    }

    /// Interrupt summary bits and their bus park.
    ///
    /// Returns whether interrupt slots follow (low ISI bit set).
    pub(super) fn find_interrupt_summary<S: ResultsSink>(&mut self, sink: &mut S) -> FieldResult<bool> {
        let value = self.read_bits(sink, 2)?;
        self.emit_frame(sink, FrameKind::InterruptSummary, value, 0, 0, 2, FrameFlags::empty());
        self.find_bus_park(sink)?;
        Ok(value & 0x1 != 0)
    }

    /// Sixteen slot bits, slot 15 first, each followed by a bus park.
    pub(super) fn find_interrupt_slots<S: ResultsSink>(&mut self, sink: &mut S) -> FieldResult {
        for slot in (0..16u64).rev() {
            let bit = self.read_bits(sink, 1)?;
            self.emit_frame(sink, FrameKind::InterruptSlot, bit, slot, 0, 1, FrameFlags::empty());
            self.find_bus_park(sink)?;
        }
        Ok(())
    }

    /// Sample SDATA at the next SCLK falling edge and move on to the
    /// following rising edge.
    pub(super) fn read_bit<S: ResultsSink>(&mut self, sink: &mut S, index: usize) -> FieldResult<BitState> {
        self.clk_offsets[index] = self.cursor.position();

        let falling = self.cursor.advance_to_edge(BitState::Low)?;
        let bit = self.cursor.sdata_state();
        self.data_offsets[index] = falling;
        sink.add_marker(Marker { sample: falling, kind: MarkerKind::DownArrow, line: Line::Sclk });

        self.cursor.advance_to_edge(BitState::High)?;
        Ok(bit)
    }

    /// Read `length` bits MSB first.
    pub(super) fn read_bits<S: ResultsSink>(&mut self, sink: &mut S, length: usize) -> FieldResult<u64> {
        let mut value = 0u64;
        for index in 0..length {
            let bit = self.read_bit(sink, index)?;
            value = (value << 1) | bit.is_high() as u64;
            self.markers[index] = if bit.is_high() { MarkerKind::One } else { MarkerKind::Zero };
        }
        self.clk_offsets[length] = self.cursor.position();
        Ok(value)
    }

    /// Emit a frame spanning bit boundaries `start..end`, with the markers of
    /// every bit it covers.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn emit_frame<S: ResultsSink>(
        &mut self,
        sink: &mut S,
        kind: FrameKind,
        value: u64,
        aux: u64,
        start: usize,
        end: usize,
        flags: FrameFlags,
    ) {
        for index in start..end {
            sink.add_marker(Marker {
                sample: self.data_offsets[index],
                kind: self.markers[index],
                line: Line::Sdata,
            });
        }

        let frame = Frame {
            kind,
            value,
            aux,
            start: self.clk_offsets[start],
            end: self.clk_offsets[end],
            flags,
        };
        trace!("{} {:#x} [{}..={}] flags={:#04x}", kind, value, frame.start, frame.end, flags.value());
        self.last_frame_end = Some(frame.end);
        sink.add_frame(frame);
    }
}
