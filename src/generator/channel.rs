//! Output lines of the generator

use crate::capture::RecordedChannel;
use crate::error::{Result, RffeError};
use crate::types::{BitState, ChannelId};

/// A line being drawn sample by sample.
#[derive(Debug, Clone)]
pub struct SimulatedChannel {
    id: ChannelId,
    initial: BitState,
    state: BitState,
    sample: u64,
    edges: Vec<u64>,
    /// Edges already handed out by [`SimulatedChannel::drain_edges`]
    drained: usize,
    /// Keep drained edges for [`SimulatedChannel::to_recorded`]
    keep_history: bool,
    /// Drained edges dropped while streaming
    released: usize,
}

impl SimulatedChannel {
    pub fn new(id: ChannelId, initial: BitState) -> Self {
        Self {
            id,
            initial,
            state: initial,
            sample: 0,
            edges: Vec::new(),
            drained: 0,
            keep_history: true,
            released: 0,
        }
    }

    /// Forget edges once they are drained. The line can then only be read
    /// through [`SimulatedChannel::drain_edges`].
    pub fn streaming(mut self) -> Self {
        self.keep_history = false;
        self
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn current_sample(&self) -> u64 {
        self.sample
    }

    pub fn current_state(&self) -> BitState {
        self.state
    }

    /// Edges held in memory: everything drawn, or only the undrained ones
    /// when streaming.
    pub fn edges(&self) -> &[u64] {
        &self.edges
    }

    /// Toggle the line at the current sample.
    pub fn transition(&mut self) {
        self.state = !self.state;
        // two toggles on one sample cancel out
        if self.edges.len() > self.drained && self.edges.last() == Some(&self.sample) {
            self.edges.pop();
        } else {
            self.edges.push(self.sample);
        }
    }

    pub fn transition_if_needed(&mut self, state: BitState) {
        if self.state != state {
            self.transition();
        }
    }

    pub fn advance(&mut self, samples: u64) {
        self.sample += samples;
    }

    /// Edges recorded since the previous call.
    pub fn drain_edges(&mut self) -> Vec<u64> {
        if !self.keep_history {
            self.released += self.edges.len();
            return std::mem::take(&mut self.edges);
        }
        let fresh = self.edges[self.drained..].to_vec();
        self.drained = self.edges.len();
        fresh
    }

    pub fn to_recorded(&self) -> Result<RecordedChannel> {
        if self.released > 0 {
            return Err(RffeError::invalid_capture(
                self.id,
                format!("{} streamed transitions are no longer held", self.released),
            ));
        }
        RecordedChannel::new(self.id, self.initial, self.edges.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_toggles_at_current_sample() {
        let mut line = SimulatedChannel::new(ChannelId(0), BitState::Low);
        line.advance(5);
        line.transition();
        line.advance(3);
        line.transition_if_needed(BitState::High);
        line.transition_if_needed(BitState::Low);
        assert_eq!(line.edges(), &[5, 8]);
        assert_eq!(line.current_state(), BitState::Low);
    }

    #[test]
    fn same_sample_toggles_cancel() {
        let mut line = SimulatedChannel::new(ChannelId(0), BitState::Low);
        line.advance(5);
        line.transition();
        line.transition();
        assert!(line.edges().is_empty());
        assert_eq!(line.current_state(), BitState::Low);
    }

    #[test]
    fn drain_hands_out_each_edge_once() {
        let mut line = SimulatedChannel::new(ChannelId(0), BitState::Low);
        line.advance(2);
        line.transition();
        assert_eq!(line.drain_edges(), vec![2]);
        line.advance(2);
        line.transition();
        assert_eq!(line.drain_edges(), vec![4]);
        assert!(line.drain_edges().is_empty());
        assert_eq!(line.to_recorded().unwrap().edges(), &[2, 4]);
    }

    #[test]
    fn streaming_drops_drained_edges() {
        let mut line = SimulatedChannel::new(ChannelId(0), BitState::Low).streaming();
        line.advance(2);
        line.transition();
        line.advance(2);
        line.transition();
        assert_eq!(line.drain_edges(), vec![2, 4]);
        assert!(line.edges().is_empty());

        line.advance(3);
        line.transition();
        assert_eq!(line.edges(), &[7]);
        assert_eq!(line.current_state(), BitState::High);
        assert_eq!(line.drain_edges(), vec![7]);
        assert!(line.to_recorded().is_err());
    }
}
