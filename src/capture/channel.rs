//! Per-line transition access
//!
//! The decoder only ever moves forward through a line. [`ChannelData`] is the
//! read side it needs; [`Rewind`] lets an owner of in-memory data step back to
//! an earlier mark when a packet has to be decoded again once more samples
//! have arrived.

use crate::error::{Result, RffeError};
use crate::types::{BitState, ChannelId};

/// Forward-only view of one sampled line.
///
/// A transition recorded at sample `n` means the line holds the new state from
/// `n` onwards. The cursor never moves backwards through this trait.
pub trait ChannelData {
    /// Current sample position.
    fn sample_number(&self) -> u64;

    /// Line state at the current sample position.
    fn bit_state(&self) -> BitState;

    /// Sample of the first transition after the current position.
    fn next_edge(&self) -> Option<u64>;

    /// Move forward to `sample`, applying every transition at or before it.
    fn advance_to(&mut self, sample: u64);

    fn has_more_transitions(&self) -> bool {
        self.next_edge().is_some()
    }

    /// Whether a transition lies within the next `samples` samples.
    fn would_advancing_cause_transition(&self, samples: u64) -> bool {
        self.next_edge()
            .is_some_and(|edge| edge <= self.sample_number().saturating_add(samples))
    }

    /// Move to the next transition and return its sample.
    fn advance_to_next_edge(&mut self) -> Option<u64> {
        let edge = self.next_edge()?;
        self.advance_to(edge);
        Some(edge)
    }
}

/// Opaque position snapshot taken by [`Rewind::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMark {
    position: u64,
    consumed: usize,
}

/// Channels that can return to an earlier position.
pub trait Rewind {
    fn mark(&self) -> ChannelMark;
    fn rewind(&mut self, mark: ChannelMark);
}

/// In-memory line: an initial state plus the samples where it toggles.
///
/// A channel fed chunk by chunk can drop the transitions its reader has
/// moved past with [`RecordedChannel::discard_before`]. Counts and marks stay
/// absolute, so states and rewinds are unaffected.
#[derive(Debug, Clone, Default)]
pub struct RecordedChannel {
    id: ChannelId,
    initial: BitState,
    /// Retained transitions; the first `released` were dropped
    edges: Vec<u64>,
    released: usize,
    released_last: Option<u64>,
    position: u64,
    /// Number of edges at or before `position`
    consumed: usize,
}

impl RecordedChannel {
    /// Build a channel, rejecting edge lists that are not strictly increasing.
    pub fn new(id: ChannelId, initial: BitState, edges: Vec<u64>) -> Result<Self> {
        validate_edges(id, None, &edges)?;
        Ok(Self { id, initial, edges, ..Self::default() })
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn initial_state(&self) -> BitState {
        self.initial
    }

    /// Transitions still held in memory.
    pub fn edges(&self) -> &[u64] {
        &self.edges
    }

    /// Transitions dropped by [`RecordedChannel::discard_before`].
    pub fn released_edges(&self) -> usize {
        self.released
    }

    pub fn last_edge(&self) -> Option<u64> {
        self.edges.last().copied().or(self.released_last)
    }

    /// Append transitions recorded after the existing ones.
    pub fn extend(&mut self, edges: &[u64]) -> Result<()> {
        validate_edges(self.id, self.last_edge(), edges)?;
        self.edges.extend_from_slice(edges);
        Ok(())
    }

    /// Line state at an arbitrary sample, independent of the cursor.
    ///
    /// Samples before the last released transition are not answerable and
    /// report the state right after it.
    pub fn state_at(&self, sample: u64) -> BitState {
        let toggles = self.released + self.edges.partition_point(|&edge| edge <= sample);
        if toggles % 2 == 0 { self.initial } else { !self.initial }
    }

    /// Drop every transition before `mark`. Rewinding to a mark older than
    /// this is no longer possible.
    pub fn discard_before(&mut self, mark: ChannelMark) {
        let keep_from = mark.consumed.min(self.released + self.edges.len());
        if keep_from <= self.released {
            return;
        }
        let dropped = keep_from - self.released;
        self.released_last = Some(self.edges[dropped - 1]);
        self.edges.drain(..dropped);
        self.released = keep_from;
    }

    /// Drop every transition the cursor has already passed.
    pub fn discard_consumed(&mut self) {
        self.discard_before(self.mark());
    }
}

fn validate_edges(id: ChannelId, after: Option<u64>, edges: &[u64]) -> Result<()> {
    let mut previous = after;
    for &edge in edges {
        if edge == 0 {
            return Err(RffeError::invalid_capture(
                id,
                "transition at sample 0 (use the initial state instead)",
            ));
        }
        if previous.is_some_and(|previous| edge <= previous) {
            return Err(RffeError::invalid_capture(
                id,
                format!("transition at sample {edge} is not after {}", previous.unwrap_or(0)),
            ));
        }
        previous = Some(edge);
    }
    Ok(())
}

impl ChannelData for RecordedChannel {
    fn sample_number(&self) -> u64 {
        self.position
    }

    fn bit_state(&self) -> BitState {
        if self.consumed % 2 == 0 { self.initial } else { !self.initial }
    }

    fn next_edge(&self) -> Option<u64> {
        self.edges.get(self.consumed - self.released).copied()
    }

    fn advance_to(&mut self, sample: u64) {
        if sample <= self.position {
            return;
        }
        let ahead = &self.edges[self.consumed - self.released..];
        self.consumed += ahead.partition_point(|&edge| edge <= sample);
        self.position = sample;
    }
}

impl Rewind for RecordedChannel {
    fn mark(&self) -> ChannelMark {
        ChannelMark { position: self.position, consumed: self.consumed }
    }

    fn rewind(&mut self, mark: ChannelMark) {
        self.position = mark.position;
        self.consumed = mark.consumed.clamp(self.released, self.released + self.edges.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(edges: &[u64]) -> RecordedChannel {
        RecordedChannel::new(ChannelId(0), BitState::Low, edges.to_vec()).unwrap()
    }

    #[test]
    fn state_follows_transitions() {
        let mut line = channel(&[10, 20, 30]);
        assert_eq!(line.bit_state(), BitState::Low);
        assert_eq!(line.next_edge(), Some(10));

        line.advance_to(9);
        assert_eq!(line.bit_state(), BitState::Low);

        line.advance_to(10);
        assert_eq!(line.bit_state(), BitState::High);
        assert_eq!(line.next_edge(), Some(20));

        line.advance_to(35);
        assert_eq!(line.bit_state(), BitState::High);
        assert_eq!(line.sample_number(), 35);
        assert!(!line.has_more_transitions());
    }

    #[test]
    fn advancing_backwards_is_ignored() {
        let mut line = channel(&[10, 20]);
        line.advance_to(15);
        line.advance_to(5);
        assert_eq!(line.sample_number(), 15);
        assert_eq!(line.bit_state(), BitState::High);
    }

    #[test]
    fn transition_window_is_inclusive() {
        let mut line = channel(&[10]);
        line.advance_to(4);
        assert!(line.would_advancing_cause_transition(6));
        assert!(!line.would_advancing_cause_transition(5));
    }

    #[test]
    fn advance_to_next_edge_lands_on_edge() {
        let mut line = channel(&[7, 9]);
        assert_eq!(line.advance_to_next_edge(), Some(7));
        assert_eq!(line.advance_to_next_edge(), Some(9));
        assert_eq!(line.advance_to_next_edge(), None);
        assert_eq!(line.bit_state(), BitState::Low);
    }

    #[test]
    fn rewind_restores_position_and_state() {
        let mut line = channel(&[10, 20]);
        line.advance_to(12);
        let mark = line.mark();

        line.advance_to(25);
        assert_eq!(line.bit_state(), BitState::Low);

        line.rewind(mark);
        assert_eq!(line.sample_number(), 12);
        assert_eq!(line.bit_state(), BitState::High);
        assert_eq!(line.next_edge(), Some(20));
    }

    #[test]
    fn extend_rejects_out_of_order_edges() {
        let mut line = channel(&[10, 20]);
        assert!(line.extend(&[20]).is_err());
        assert!(line.extend(&[30, 25]).is_err());
        line.extend(&[21, 40]).unwrap();
        assert_eq!(line.edges(), &[10, 20, 21, 40]);
    }

    #[test]
    fn exhausted_channel_sees_appended_edges() {
        let mut line = channel(&[10]);
        line.advance_to(50);
        assert!(!line.has_more_transitions());

        line.extend(&[60]).unwrap();
        assert_eq!(line.next_edge(), Some(60));
    }

    #[test]
    fn discard_keeps_state_and_position() {
        let mut line = channel(&[10, 20, 30]);
        line.advance_to(25);
        line.discard_consumed();

        assert_eq!(line.edges(), &[30]);
        assert_eq!(line.released_edges(), 2);
        assert_eq!(line.bit_state(), BitState::Low);
        assert_eq!(line.next_edge(), Some(30));
        assert_eq!(line.state_at(40), BitState::High);

        line.advance_to(35);
        assert_eq!(line.bit_state(), BitState::High);
        assert!(!line.has_more_transitions());
    }

    #[test]
    fn discard_then_rewind_to_later_mark() {
        let mut line = channel(&[10, 20, 30]);
        line.advance_to(15);
        let mark = line.mark();
        line.discard_before(mark);

        line.advance_to(35);
        line.rewind(mark);
        assert_eq!(line.sample_number(), 15);
        assert_eq!(line.bit_state(), BitState::High);
        assert_eq!(line.next_edge(), Some(20));
    }

    #[test]
    fn fully_released_line_still_orders_appends() {
        let mut line = channel(&[10, 20]);
        line.advance_to(20);
        line.discard_consumed();
        assert!(line.edges().is_empty());
        assert_eq!(line.last_edge(), Some(20));

        assert!(line.extend(&[20]).is_err());
        line.extend(&[25]).unwrap();
        assert_eq!(line.next_edge(), Some(25));
        line.advance_to(25);
        assert_eq!(line.bit_state(), BitState::High);
    }

    #[test]
    fn new_rejects_bad_edge_lists() {
        assert!(RecordedChannel::new(ChannelId(1), BitState::Low, vec![0, 5]).is_err());
        assert!(RecordedChannel::new(ChannelId(1), BitState::Low, vec![5, 5]).is_err());
    }

    #[test]
    fn state_at_is_independent_of_cursor() {
        let line = RecordedChannel::new(ChannelId(1), BitState::High, vec![3, 8]).unwrap();
        assert_eq!(line.state_at(0), BitState::High);
        assert_eq!(line.state_at(3), BitState::Low);
        assert_eq!(line.state_at(100), BitState::High);
    }
}
