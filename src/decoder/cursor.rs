//! Edge cursor over the SCLK/SDATA pair
//!
//! The cursor steps both lines together, one transition at a time, and keeps
//! the previous and current level of each line so callers can recognise
//! patterns such as clock edges and start conditions.

use crate::capture::{ChannelData, ChannelMark, Rewind};
use crate::types::BitState;

/// Why a scan stopped before reaching its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// A start condition appeared where clocked bits were expected.
    /// `at` is the sample of the SDATA rising edge.
    UnexpectedStart { at: u64 },
    /// Neither line has another transition.
    Exhausted,
}

/// Watches for SDATA rising then falling while SCLK stays LOW.
#[derive(Debug, Default)]
struct StartWatch {
    rise: Option<u64>,
}

impl StartWatch {
    /// Feed the state after one transition; returns the rising-edge sample
    /// once the pattern completes.
    fn observe<C: ChannelData>(&mut self, cursor: &BusCursor<C>) -> Option<u64> {
        if cursor.sclk_current.is_high() {
            self.rise = None;
        } else if cursor.sclk_previous.is_low()
            && cursor.sdata_current.is_high()
            && cursor.sdata_previous.is_low()
        {
            self.rise = Some(cursor.position);
        } else if cursor.sdata_current.is_low() {
            return self.rise.take();
        }
        None
    }
}

/// Cursor state captured by [`BusCursor::checkpoint`].
#[derive(Debug, Clone, Copy)]
pub struct CursorCheckpoint {
    position: u64,
    sclk_current: BitState,
    sclk_previous: BitState,
    sdata_current: BitState,
    sdata_previous: BitState,
    sclk: ChannelMark,
    sdata: ChannelMark,
}

/// Synchronised walk over the clock and data lines.
#[derive(Debug)]
pub struct BusCursor<C> {
    sclk: C,
    sdata: C,
    position: u64,
    sclk_current: BitState,
    sclk_previous: BitState,
    sdata_current: BitState,
    sdata_previous: BitState,
}

impl<C: ChannelData> BusCursor<C> {
    pub fn new(sclk: C, sdata: C) -> Self {
        let position = sclk.sample_number().max(sdata.sample_number());
        let sclk_current = sclk.bit_state();
        let sdata_current = sdata.bit_state();
        Self {
            sclk,
            sdata,
            position,
            sclk_current,
            sclk_previous: sclk_current,
            sdata_current,
            sdata_previous: sdata_current,
        }
    }

    /// Sample of the last transition the cursor moved to.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn sclk_state(&self) -> BitState {
        self.sclk_current
    }

    pub fn sdata_state(&self) -> BitState {
        self.sdata_current
    }

    /// Both lines still have transitions ahead.
    pub fn both_lines_active(&self) -> bool {
        self.sclk.has_more_transitions() && self.sdata.has_more_transitions()
    }

    pub fn channels(&self) -> (&C, &C) {
        (&self.sclk, &self.sdata)
    }

    pub fn channels_mut(&mut self) -> (&mut C, &mut C) {
        (&mut self.sclk, &mut self.sdata)
    }

    pub fn into_channels(self) -> (C, C) {
        (self.sclk, self.sdata)
    }

    /// Move both lines to whichever line's next transition comes first.
    ///
    /// On an exact tie the clock edge's sample is used, and both lines land
    /// on it together.
    pub fn advance_to_next_transition(&mut self) -> Result<u64, ScanStop> {
        self.sclk_previous = self.sclk_current;
        self.sdata_previous = self.sdata_current;

        let target = match (self.sclk.next_edge(), self.sdata.next_edge()) {
            (Some(sclk), Some(sdata)) if sclk > sdata => sdata,
            (Some(sclk), _) => sclk,
            (None, Some(sdata)) => sdata,
            (None, None) => return Err(ScanStop::Exhausted),
        };

        self.sclk.advance_to(target);
        self.sdata.advance_to(target);
        self.position = target;
        self.sclk_current = self.sclk.bit_state();
        self.sdata_current = self.sdata.bit_state();
        Ok(target)
    }

    /// Advance until SCLK moves into `target`, watching for start conditions.
    pub fn advance_to_edge(&mut self, target: BitState) -> Result<u64, ScanStop> {
        let mut watch = StartWatch::default();
        loop {
            self.advance_to_next_transition()?;
            if self.sclk_current == target && self.sclk_previous != target {
                return Ok(self.position);
            }
            if let Some(at) = watch.observe(self) {
                return Err(ScanStop::UnexpectedStart { at });
            }
        }
    }

    /// Scan for a start condition and return the SDATA rising-edge sample.
    ///
    /// Leaves the cursor on the SDATA falling edge that completes it.
    pub fn scan_for_start_condition(&mut self) -> Result<u64, ScanStop> {
        let mut watch = StartWatch::default();
        loop {
            self.advance_to_next_transition()?;
            if let Some(at) = watch.observe(self) {
                return Ok(at);
            }
        }
    }

    /// Whether SCLK has a transition within `samples` of the current position.
    pub fn sclk_transition_within(&self, samples: u64) -> bool {
        self.sclk.would_advancing_cause_transition(samples)
    }
}

impl<C: ChannelData + Rewind> BusCursor<C> {
    pub fn checkpoint(&self) -> CursorCheckpoint {
        CursorCheckpoint {
            position: self.position,
            sclk_current: self.sclk_current,
            sclk_previous: self.sclk_previous,
            sdata_current: self.sdata_current,
            sdata_previous: self.sdata_previous,
            sclk: self.sclk.mark(),
            sdata: self.sdata.mark(),
        }
    }

    pub fn restore(&mut self, checkpoint: CursorCheckpoint) {
        self.position = checkpoint.position;
        self.sclk_current = checkpoint.sclk_current;
        self.sclk_previous = checkpoint.sclk_previous;
        self.sdata_current = checkpoint.sdata_current;
        self.sdata_previous = checkpoint.sdata_previous;
        self.sclk.rewind(checkpoint.sclk);
        self.sdata.rewind(checkpoint.sdata);
    }
}
