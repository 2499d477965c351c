//! RFFE packet decoder
//!
//! Walks a pair of sampled lines and turns each bus transaction into a
//! packet of frames:
//!
//! ```text
//! SeekStart -> Header -> Payload(command type) -> final BusPark -> commit
//! ```
//!
//! Malformed traffic never stops the decoder. Parity mismatches, reserved
//! commands and out-of-range master ids are flagged on the frames. A start
//! condition in the middle of a packet closes that packet as incomplete and
//! becomes the start of the next one. The loop only ends when the capture
//! runs out of transitions.
//!
//! ## Usage Example
//!
//! ```rust
//! use rffe::decoder::{Decoder, PacketCollector};
//! use rffe::generator::{SimulationConfig, SimulationGenerator, Transaction};
//!
//! # fn main() -> rffe::Result<()> {
//! let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
//! generator.encode(&Transaction::new(0xA, 0x05, vec![0x10, 1, 2, 3, 4, 5, 6])?)?;
//! generator.idle(40);
//!
//! let (sclk, sdata) = generator.output()?;
//! let mut decoder = Decoder::new(sclk, sdata);
//! let mut sink = PacketCollector::new();
//! decoder.run(&mut sink, || false);
//!
//! let packet = &sink.committed()[0];
//! assert_eq!(packet.slave_address(), Some(0xA));
//! assert_eq!(packet.payload(), vec![0x10, 1, 2, 3, 4, 5, 6]);
//! # Ok(())
//! # }
//! ```

mod cursor;
mod fields;
mod sink;


pub use cursor::{BusCursor, CursorCheckpoint, ScanStop};
pub use sink::{PacketCollector, ResultsSink};

use tracing::{debug, trace};

use crate::capture::{Capture, ChannelData, RecordedChannel, Rewind};
use crate::error::Result;
use crate::settings::AnalyzerSettings;
use crate::types::{ABORTED_PACKET, CommandType, Frame, FrameKind, MarkerKind, PacketStatus};
use fields::FieldResult;

/// Bit boundaries kept per field; the longest field is the 12-bit header.
const OFFSET_SLOTS: usize = 16;

/// What happened to one attempt at decoding a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// A packet was handed to the sink.
    Committed(PacketStatus),
    /// A start condition interrupted the packet before any frame was emitted.
    Discarded,
    /// The capture ran out of transitions; the open packet was cancelled.
    Exhausted,
}

/// Totals for one [`Decoder::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub complete: u64,
    pub incomplete: u64,
    pub discarded: u64,
    /// The loop ended because `should_stop` returned true
    pub stopped: bool,
}

impl DecodeSummary {
    pub fn committed(&self) -> u64 {
        self.complete + self.incomplete
    }
}

/// Decoder state captured between packets.
#[derive(Debug, Clone, Copy)]
pub struct DecoderCheckpoint {
    cursor: CursorCheckpoint,
    pending_start: Option<u64>,
}

/// Packet state machine over a clock/data channel pair.
#[derive(Debug)]
pub struct Decoder<C> {
    cursor: BusCursor<C>,
    /// Start condition seen while decoding the previous packet
    pending_start: Option<u64>,
    clk_offsets: [u64; OFFSET_SLOTS],
    data_offsets: [u64; OFFSET_SLOTS],
    markers: [MarkerKind; OFFSET_SLOTS],
    command: CommandType,
    last_frame_end: Option<u64>,
}

impl Decoder<RecordedChannel> {
    /// Decoder over the SCLK and SDATA channels named in `settings`.
    pub fn from_capture(capture: &Capture, settings: &AnalyzerSettings) -> Result<Self> {
        settings.validate()?;
        let (sclk, sdata) = capture.channel_pair(settings.sclk_channel, settings.sdata_channel)?;
        Ok(Self::new(sclk, sdata))
    }

    /// Drop the transitions behind the current position on both lines.
    ///
    /// Checkpoints taken earlier can no longer be restored; take a new one
    /// afterwards.
    pub fn release_consumed(&mut self) {
        let (sclk, sdata) = self.cursor.channels_mut();
        sclk.discard_consumed();
        sdata.discard_consumed();
    }

    /// Transitions held on both lines.
    pub fn retained_edges(&self) -> usize {
        let (sclk, sdata) = self.cursor.channels();
        sclk.edges().len() + sdata.edges().len()
    }
}

impl<C: ChannelData> Decoder<C> {
    pub fn new(sclk: C, sdata: C) -> Self {
        Self {
            cursor: BusCursor::new(sclk, sdata),
            pending_start: None,
            clk_offsets: [0; OFFSET_SLOTS],
            data_offsets: [0; OFFSET_SLOTS],
            markers: [MarkerKind::default(); OFFSET_SLOTS],
            command: CommandType::Reserved,
            last_frame_end: None,
        }
    }

    /// Sample the decoder has reached.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Command type of the most recent header.
    pub fn last_command(&self) -> CommandType {
        self.command
    }

    pub fn has_pending_start(&self) -> bool {
        self.pending_start.is_some()
    }

    pub fn channels_mut(&mut self) -> (&mut C, &mut C) {
        self.cursor.channels_mut()
    }

    pub fn into_channels(self) -> (C, C) {
        self.cursor.into_channels()
    }

    /// Decode one packet into `sink`.
    pub fn decode_packet<S: ResultsSink>(&mut self, sink: &mut S) -> PacketOutcome {
        self.last_frame_end = None;

        match self.decode_transaction(sink) {
            Ok(()) => {
                trace!("Packet {} committed at sample {}", self.command, self.position());
                sink.commit_packet(PacketStatus::Complete);
                PacketOutcome::Committed(PacketStatus::Complete)
            }
            Err(ScanStop::Exhausted) => {
                sink.cancel_packet();
                PacketOutcome::Exhausted
            }
            Err(ScanStop::UnexpectedStart { at }) => {
                self.pending_start = Some(at);
                match self.last_frame_end {
                    Some(last_end) => {
                        debug!(
                            "Start condition at sample {} aborted {} packet",
                            at, self.command
                        );
                        sink.add_frame(Frame {
                            kind: FrameKind::ErrorCase,
                            value: 0,
                            aux: 0,
                            start: last_end.min(at),
                            end: at,
                            flags: ABORTED_PACKET,
                        });
                        sink.commit_packet(PacketStatus::Incomplete);
                        PacketOutcome::Committed(PacketStatus::Incomplete)
                    }
                    None => {
                        debug!("Start condition at sample {} preempted an empty packet", at);
                        sink.cancel_packet();
                        PacketOutcome::Discarded
                    }
                }
            }
        }
    }

    /// Decode packets until the capture is exhausted.
    ///
    /// `should_stop` is polled once after every committed packet.
    pub fn run<S, F>(&mut self, sink: &mut S, mut should_stop: F) -> DecodeSummary
    where
        S: ResultsSink,
        F: FnMut() -> bool,
    {
        let mut summary = DecodeSummary::default();
        loop {
            match self.decode_packet(sink) {
                PacketOutcome::Committed(status) => {
                    match status {
                        PacketStatus::Complete => summary.complete += 1,
                        PacketStatus::Incomplete => summary.incomplete += 1,
                    }
                    if should_stop() {
                        summary.stopped = true;
                        break;
                    }
                }
                PacketOutcome::Discarded => summary.discarded += 1,
                PacketOutcome::Exhausted => break,
            }
        }
        debug!(
            "Decode run ended at sample {}: {} complete, {} incomplete",
            self.position(),
            summary.complete,
            summary.incomplete
        );
        summary
    }

    fn decode_transaction<S: ResultsSink>(&mut self, sink: &mut S) -> FieldResult {
        self.find_start_condition(sink)?;
        let (command, byte_count) = self.find_command(sink)?;
        let data_bytes = usize::from(byte_count) + 1;

        match command {
            CommandType::ExtWrite | CommandType::MasterWrite => {
                self.find_byte(sink, FrameKind::Address)?;
                self.find_data_bytes(sink, FrameKind::Data, data_bytes)?;
            }
            CommandType::ExtRead | CommandType::MasterRead => {
                self.find_byte(sink, FrameKind::Address)?;
                self.find_bus_park(sink)?;
                self.find_data_bytes(sink, FrameKind::Data, data_bytes)?;
            }
            CommandType::MasterHandoff => {
                self.find_bus_park(sink)?;
                self.find_data_bytes(sink, FrameKind::MasterHandoffAck, data_bytes)?;
            }
            CommandType::Interrupt => {
                self.find_bus_park(sink)?;
                if self.find_interrupt_summary(sink)? {
                    self.find_interrupt_slots(sink)?;
                }
            }
            CommandType::ExtLongWrite => {
                self.find_byte(sink, FrameKind::AddressHigh)?;
                self.find_byte(sink, FrameKind::AddressLow)?;
                self.find_data_bytes(sink, FrameKind::Data, data_bytes)?;
            }
            CommandType::ExtLongRead => {
                self.find_byte(sink, FrameKind::AddressHigh)?;
                self.find_byte(sink, FrameKind::AddressLow)?;
                self.find_bus_park(sink)?;
                self.find_data_bytes(sink, FrameKind::Data, data_bytes)?;
            }
            CommandType::NormalWrite => self.find_byte(sink, FrameKind::Data)?,
            CommandType::NormalRead => {
                self.find_bus_park(sink)?;
                self.find_byte(sink, FrameKind::Data)?;
            }
            CommandType::Reserved | CommandType::Write0 => {}
        }

        if command != CommandType::Interrupt {
            self.find_bus_park(sink)?;
        }
        Ok(())
    }

    fn find_data_bytes<S: ResultsSink>(&mut self, sink: &mut S, kind: FrameKind, count: usize) -> FieldResult {
        for _ in 0..count {
            self.find_byte(sink, kind)?;
        }
        Ok(())
    }
}

impl<C: ChannelData + Rewind> Decoder<C> {
    pub fn checkpoint(&self) -> DecoderCheckpoint {
        DecoderCheckpoint { cursor: self.cursor.checkpoint(), pending_start: self.pending_start }
    }

    /// Return to a checkpoint so a partially captured packet can be decoded
    /// again once more samples are available.
    pub fn restore(&mut self, checkpoint: DecoderCheckpoint) {
        self.cursor.restore(checkpoint.cursor);
        self.pending_start = checkpoint.pending_start;
    }
}
