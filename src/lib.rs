//! Decoder and traffic generator for the RFFE two-wire bus.
//!
//! RFFE is a clocked serial bus: SCLK is driven by the master, SDATA carries
//! a start pulse, a 12-bit header and a command-specific payload, with an odd
//! parity bit after every field and a bus park cycle where the data line
//! changes hands.
//!
//! # Features
//!
//! - **Decoder**: turns sampled SCLK/SDATA transitions into packets of
//!   annotated frames, flagging parity and protocol errors instead of failing
//! - **Generator**: draws bit-accurate waveforms for any transaction, or
//!   sweeps every command byte with random payloads
//! - **Sessions**: decode capture files or live generator output on a tokio
//!   task with backpressure, progress and cancellation
//!
//! ## Example (generator round trip)
//!
//! ```rust
//! use rffe::{AnalyzerSettings, CommandType, Decoder, PacketCollector};
//! use rffe::{SimulationConfig, SimulationGenerator, Transaction};
//!
//! # fn main() -> rffe::Result<()> {
//! let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
//! generator.encode(&Transaction::new(0x5, 0x45, vec![0x3C])?)?;
//! generator.idle(40);
//!
//! let mut decoder = Decoder::from_capture(&generator.to_capture()?, &AnalyzerSettings::default())?;
//! let mut sink = PacketCollector::new();
//! decoder.run(&mut sink, || false);
//!
//! let packet = &sink.committed()[0];
//! assert_eq!(packet.command_type(), Some(CommandType::NormalWrite));
//! assert_eq!(packet.payload(), vec![0x3C]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example (capture replay)
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use rffe::{AnalyzerSettings, Rffe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Rffe::open("bus.yaml", AnalyzerSettings::default())?;
//!     let mut frames = session.into_report_frames();
//!
//!     while let Some(frame) = frames.next().await {
//!         println!("{} {:#x} @ {}..{}", frame.kind.name(), frame.value, frame.start, frame.end);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod settings;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Bus decoding and generation
pub mod capture;
pub mod decoder;
pub mod generator;

// Stream-based decode architecture
pub mod driver;
pub mod provider;
pub mod providers;
pub mod session;
pub mod stream;

// Core exports
pub use error::*;
pub use settings::AnalyzerSettings;
pub use types::*;

// Main API exports
pub use capture::{Capture, CaptureChunk, ChannelData, RecordedChannel};
pub use decoder::{Decoder, PacketCollector, ResultsSink};
pub use driver::DecodeProgress;
pub use generator::{SimulationConfig, SimulationGenerator, Transaction};
pub use provider::CaptureProvider;
pub use session::{DecodeSession, PacketStream};
pub use stream::{ReportExt, ReportFrames};

/// Unified entry point for RFFE decode sessions.
///
/// # Examples
///
/// ## Capture file replay
/// ```rust,no_run
/// use rffe::{AnalyzerSettings, Rffe};
///
/// #[tokio::main]
/// async fn main() -> rffe::Result<()> {
///     let session = Rffe::open("bus.yaml", AnalyzerSettings::default())?;
///     // Use session...
///     Ok(())
/// }
/// ```
///
/// ## Simulated traffic
/// ```rust,no_run
/// use rffe::{AnalyzerSettings, Rffe, SimulationConfig};
///
/// #[tokio::main]
/// async fn main() -> rffe::Result<()> {
///     let session = Rffe::simulate(SimulationConfig::default(), AnalyzerSettings::default())?;
///     // Use session...
///     Ok(())
/// }
/// ```
pub struct Rffe;

impl Rffe {
    /// Replay a YAML capture file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or is not readable
    /// - The file is not a valid capture
    /// - The settings name a channel the capture does not have
    pub fn open<P: AsRef<std::path::Path>>(path: P, settings: AnalyzerSettings) -> Result<DecodeSession> {
        DecodeSession::open(path, settings)
    }

    /// Decode generator sweeps until the session is cancelled or dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or settings are invalid.
    pub fn simulate(config: SimulationConfig, settings: AnalyzerSettings) -> Result<DecodeSession> {
        DecodeSession::simulate(config, settings, None)
    }
}
