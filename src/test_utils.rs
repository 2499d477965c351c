//! Test utilities for generating and decoding bus traffic
//!
//! Helpers shared by unit tests and benchmarks. Every fixture is drawn by the
//! generator, so no capture files need to be checked in.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::Result;
use crate::capture::Capture;
use crate::decoder::{Decoder, PacketCollector};
use crate::generator::{SimulationConfig, SimulationGenerator, Transaction};
use crate::settings::AnalyzerSettings;
use crate::types::Packet;

/// Slave addresses used by multi-address fixtures.
pub const FIXTURE_ADDRESSES: [u8; 3] = [0x1, 0x5, 0xE];

/// One sweep over `addresses`, with the transactions it drew.
pub fn sweep_capture(addresses: &[u8]) -> Result<(Capture, Vec<Transaction>)> {
    let config = SimulationConfig { slave_addresses: addresses.to_vec(), ..SimulationConfig::default() };
    let mut generator = SimulationGenerator::new(config)?;
    let transactions = generator.sweep();
    Ok((generator.to_capture()?, transactions))
}

/// Capture holding exactly `transactions`, followed by idle time.
pub fn transactions_capture(transactions: &[Transaction]) -> Result<Capture> {
    let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
    for transaction in transactions {
        generator.encode(transaction)?;
    }
    generator.idle(40);
    generator.to_capture()
}

/// Decode a whole capture synchronously.
pub fn decode_capture(capture: &Capture, settings: &AnalyzerSettings) -> Result<Vec<Packet>> {
    let mut decoder = Decoder::from_capture(capture, settings)?;
    let mut sink = PacketCollector::new();
    decoder.run(&mut sink, || false);
    Ok(sink.into_packets())
}

/// Save `capture` as `name` under `dir`.
pub fn write_capture_fixture(dir: &Path, name: &str, capture: &Capture) -> Result<PathBuf> {
    let path = dir.join(name);
    capture.save(&path)?;
    Ok(path)
}
