//! Synthetic RFFE traffic
//!
//! The generator draws bit-accurate SCLK/SDATA waveforms for arbitrary
//! transactions. A sweep walks every command byte for each configured slave
//! address with random payloads, which is enough to exercise every packet
//! shape the decoder knows.
//!
//! Timing, in half clock periods:
//!
//! - start condition: both lines low for 2, SDATA high for 2, SDATA low, 2 more
//! - bit: SCLK rises, SDATA settles after 0.5, SCLK falls at 1, low for 1
//! - idle: 10 before the first transaction, 80 after every sweep
//!
//! ## Usage Example
//!
//! ```rust
//! use rffe::generator::{SimulationConfig, SimulationGenerator};
//!
//! # fn main() -> rffe::Result<()> {
//! let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
//! let transactions = generator.sweep();
//! assert_eq!(transactions.len(), 256);
//!
//! let capture = generator.to_capture()?;
//! assert_eq!(capture.channels.len(), generator.channel_count());
//! # Ok(())
//! # }
//! ```

mod channel;
mod clock;
mod lfsr;
mod transaction;

pub use channel::SimulatedChannel;
pub use clock::ClockGenerator;
pub use lfsr::{DEFAULT_LFSR_SEED, LFSR_TAPS, Lfsr};
pub use transaction::Transaction;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::capture::{Capture, CaptureChannel, CaptureChunk, MIN_SAMPLE_RATE_HZ, RecordedChannel};
use crate::error::{Result, RffeError};
use crate::settings::AnalyzerSettings;
use crate::types::{BitState, ChannelId};

/// Idle time before the first transaction.
pub const INITIAL_IDLE_HALF_PERIODS: u32 = 10;

/// Idle time after every sweep.
pub const SWEEP_IDLE_HALF_PERIODS: u32 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub sample_rate_hz: u64,
    /// SCLK frequency
    pub clock_hz: u64,
    /// Addresses swept in order; each gets all 256 command bytes
    pub slave_addresses: Vec<u8>,
    pub lfsr_seed: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: MIN_SAMPLE_RATE_HZ,
            clock_hz: MIN_SAMPLE_RATE_HZ / 10,
            slave_addresses: vec![0x5],
            lfsr_seed: DEFAULT_LFSR_SEED,
        }
    }
}

impl SimulationConfig {
    /// Configuration with the default timing for another sample rate.
    pub fn with_sample_rate(sample_rate_hz: u64) -> Self {
        Self { sample_rate_hz, clock_hz: sample_rate_hz / 10, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.clock_hz == 0 {
            return Err(RffeError::invalid_settings("clock_hz must be non-zero"));
        }
        if self.sample_rate_hz < self.clock_hz.saturating_mul(4) {
            return Err(RffeError::invalid_settings(format!(
                "{} Hz sampling cannot resolve a {} Hz clock (need at least 2 samples per half period)",
                self.sample_rate_hz, self.clock_hz
            )));
        }
        if self.lfsr_seed == 0 {
            return Err(RffeError::invalid_settings("lfsr_seed must be non-zero"));
        }
        if self.slave_addresses.is_empty() {
            return Err(RffeError::invalid_settings("no slave addresses to sweep"));
        }
        if let Some(address) = self.slave_addresses.iter().find(|&&address| address > 0xF) {
            return Err(RffeError::invalid_settings(format!(
                "slave address {:#x} does not fit in 4 bits",
                address
            )));
        }
        if self.sample_rate_hz < MIN_SAMPLE_RATE_HZ {
            warn!(
                "Simulating at {} Hz, below the {} Hz minimum",
                self.sample_rate_hz, MIN_SAMPLE_RATE_HZ
            );
        }
        Ok(())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SimulationConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| RffeError::parse_error("simulation config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RffeError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }
}

/// Draws RFFE transactions onto a simulated SCLK/SDATA pair.
#[derive(Debug, Clone)]
pub struct SimulationGenerator {
    config: SimulationConfig,
    clock: ClockGenerator,
    lfsr: Lfsr,
    sclk: SimulatedChannel,
    sdata: SimulatedChannel,
}

impl SimulationGenerator {
    /// Generator on the default SCLK/SDATA channel ids.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_settings(config, &AnalyzerSettings::default())
    }

    /// Generator drawing onto the channels named in `settings`.
    pub fn with_settings(config: SimulationConfig, settings: &AnalyzerSettings) -> Result<Self> {
        config.validate()?;
        settings.validate()?;

        let lfsr = Lfsr::new(config.lfsr_seed)
            .ok_or_else(|| RffeError::invalid_settings("lfsr_seed must be non-zero"))?;
        let mut generator = Self {
            clock: ClockGenerator::new(config.clock_hz, config.sample_rate_hz),
            lfsr,
            sclk: SimulatedChannel::new(settings.sclk_channel, BitState::Low),
            sdata: SimulatedChannel::new(settings.sdata_channel, BitState::Low),
            config,
        };
        debug!(
            "Simulation at {} Hz, SCLK {} Hz ({} samples per half period)",
            generator.config.sample_rate_hz,
            generator.config.clock_hz,
            generator.clock.samples_per_half_period()
        );
        generator.idle(INITIAL_IDLE_HALF_PERIODS);
        Ok(generator)
    }

    /// Release edges once [`SimulationGenerator::take_chunk`] hands them out.
    ///
    /// Memory then stays flat however long the generator runs, but
    /// [`SimulationGenerator::output`] and [`SimulationGenerator::to_capture`]
    /// fail after the first chunk.
    pub fn streaming(mut self) -> Self {
        self.sclk = self.sclk.streaming();
        self.sdata = self.sdata.streaming();
        self
    }

    /// Edges held on both lines.
    pub fn retained_edges(&self) -> usize {
        self.sclk.edges().len() + self.sdata.edges().len()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn sample_rate_hz(&self) -> u64 {
        self.config.sample_rate_hz
    }

    pub fn current_sample(&self) -> u64 {
        self.sclk.current_sample()
    }

    /// Number of lines the generator draws.
    pub fn channel_count(&self) -> usize {
        2
    }

    pub fn lfsr_mut(&mut self) -> &mut Lfsr {
        &mut self.lfsr
    }

    fn advance_half_periods(&mut self, multiple: f64) {
        let samples = self.clock.advance_by_half_period(multiple);
        self.sclk.advance(samples);
        self.sdata.advance(samples);
    }

    /// Hold both lines for `half_periods`.
    pub fn idle(&mut self, half_periods: u32) {
        self.advance_half_periods(f64::from(half_periods));
    }

    /// SDATA pulse while SCLK is held low.
    pub fn emit_start_condition(&mut self) {
        self.sclk.transition_if_needed(BitState::Low);
        self.sdata.transition_if_needed(BitState::Low);
        self.advance_half_periods(2.0);

        self.sdata.transition();
        self.advance_half_periods(2.0);
        self.sdata.transition();
        self.advance_half_periods(2.0);
    }

    /// One clock period per bit; SDATA changes while SCLK is high.
    pub fn emit_bits(&mut self, bits: &[bool]) {
        for &bit in bits {
            self.sclk.transition();
            self.advance_half_periods(0.5);
            self.sdata.transition_if_needed(BitState::from_bool(bit));
            self.advance_half_periods(0.5);
            self.sclk.transition();
            self.advance_half_periods(1.0);
        }
    }

    /// Draw a complete transaction.
    pub fn encode(&mut self, transaction: &Transaction) -> Result<()> {
        transaction.validate()?;
        self.draw(transaction, usize::MAX);
        Ok(())
    }

    /// Draw only the first `bits` wire bits of a transaction, leaving it
    /// unfinished so the next start condition interrupts it.
    pub fn encode_aborted(&mut self, transaction: &Transaction, bits: usize) -> Result<()> {
        transaction.validate()?;
        self.draw(transaction, bits);
        Ok(())
    }

    fn draw(&mut self, transaction: &Transaction, limit: usize) {
        let bits = transaction.wire_bits();
        let bits = &bits[..limit.min(bits.len())];
        trace!(
            "Drawing SA {:#x} command {:#04x}: {} bits from sample {}",
            transaction.slave_address,
            transaction.command,
            bits.len(),
            self.current_sample()
        );
        self.emit_start_condition();
        self.emit_bits(bits);
    }

    /// Every command byte for every configured address, then idle.
    pub fn sweep(&mut self) -> Vec<Transaction> {
        let addresses = self.config.slave_addresses.clone();
        let mut transactions = Vec::with_capacity(addresses.len() * 256);
        for address in addresses {
            for command in 0..=u8::MAX {
                let transaction = Transaction::random(address, command, &mut self.lfsr);
                self.draw(&transaction, usize::MAX);
                transactions.push(transaction);
            }
        }
        self.idle(SWEEP_IDLE_HALF_PERIODS);
        debug!("Sweep of {} transactions ended at sample {}", transactions.len(), self.current_sample());
        transactions
    }

    /// Sweep until the output reaches `sample`.
    pub fn generate_until(&mut self, sample: u64) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        while self.current_sample() < sample {
            transactions.extend(self.sweep());
        }
        transactions
    }

    /// Edges drawn since the previous chunk.
    pub fn take_chunk(&mut self) -> CaptureChunk {
        CaptureChunk {
            sclk_edges: self.sclk.drain_edges(),
            sdata_edges: self.sdata.drain_edges(),
            end_sample: self.current_sample(),
        }
    }

    /// Everything drawn so far, as replayable SCLK and SDATA lines.
    pub fn output(&self) -> Result<(RecordedChannel, RecordedChannel)> {
        Ok((self.sclk.to_recorded()?, self.sdata.to_recorded()?))
    }

    pub fn channel_ids(&self) -> (ChannelId, ChannelId) {
        (self.sclk.id(), self.sdata.id())
    }

    pub fn to_capture(&self) -> Result<Capture> {
        let (sclk, sdata) = self.output()?;
        Ok(Capture {
            sample_rate_hz: self.config.sample_rate_hz,
            channels: vec![
                CaptureChannel::from_recorded("SCLK", &sclk),
                CaptureChannel::from_recorded("SDATA", &sdata),
            ],
        })
    }
}
