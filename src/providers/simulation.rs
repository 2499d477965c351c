//! Simulation provider backed by the traffic generator

use tracing::{debug, info};

use crate::Result;
use crate::capture::CaptureChunk;
use crate::generator::{SimulationConfig, SimulationGenerator};
use crate::provider::CaptureProvider;
use crate::settings::AnalyzerSettings;
use crate::types::{BitState, ChannelId};

/// Provider that produces one generator sweep per chunk
pub struct SimulationProvider {
    generator: SimulationGenerator,

    /// Sweeps to run before ending; `None` runs until cancelled
    rounds: Option<u64>,
    completed: u64,
    transactions: u64,
}

impl SimulationProvider {
    pub fn new(config: SimulationConfig, settings: &AnalyzerSettings) -> Result<Self> {
        let generator = SimulationGenerator::with_settings(config, settings)?.streaming();
        info!(
            "Simulating {} slave address(es) at {}Hz",
            generator.config().slave_addresses.len(),
            generator.sample_rate_hz()
        );
        Ok(Self { generator, rounds: None, completed: 0, transactions: 0 })
    }

    /// End the capture after `rounds` sweeps
    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Sweeps produced so far
    pub fn completed_rounds(&self) -> u64 {
        self.completed
    }

    pub fn transactions_generated(&self) -> u64 {
        self.transactions
    }

    pub fn generator(&self) -> &SimulationGenerator {
        &self.generator
    }
}

#[async_trait::async_trait]
impl CaptureProvider for SimulationProvider {
    async fn next_chunk(&mut self) -> Result<Option<CaptureChunk>> {
        if self.rounds.is_some_and(|rounds| self.completed >= rounds) {
            debug!("Simulation finished after {} rounds", self.completed);
            return Ok(None);
        }

        // a sweep is pure CPU work; let the consumer side run between rounds
        tokio::task::yield_now().await;

        let transactions = self.generator.sweep();
        self.completed += 1;
        self.transactions += transactions.len() as u64;

        let chunk = self.generator.take_chunk();
        debug!(
            "Round {}: {} transactions, {} edges up to sample {}",
            self.completed,
            transactions.len(),
            chunk.edge_count(),
            chunk.end_sample
        );
        Ok(Some(chunk))
    }

    fn initial_states(&self) -> (BitState, BitState) {
        (BitState::Low, BitState::Low)
    }

    fn channel_ids(&self) -> (ChannelId, ChannelId) {
        self.generator.channel_ids()
    }

    fn sample_rate_hz(&self) -> u64 {
        self.generator.sample_rate_hz()
    }
}
