//! Decode sessions
//!
//! A [`DecodeSession`] runs the decoder on a background task and hands out
//! committed packets as they are decoded. Sessions can replay a capture file
//! or decode generator output as it is produced:
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use rffe::{AnalyzerSettings, DecodeSession};
//!
//! #[tokio::main]
//! async fn main() -> rffe::Result<()> {
//!     let session = DecodeSession::open("bus.yaml", AnalyzerSettings::default())?;
//!     let mut packets = session.into_packet_stream();
//!
//!     while let Some(packet) = packets.next().await {
//!         println!("{:?} {:?}", packet.command_type(), packet.payload());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Dropping the session, or the stream it was turned into, cancels the task.

use futures::Stream;
use pin_project_lite::pin_project;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{ReceiverStream, WatchStream};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use crate::capture::Capture;
use crate::driver::{DEFAULT_PACKET_CAPACITY, DecodeProgress, Driver};
use crate::generator::SimulationConfig;
use crate::provider::CaptureProvider;
use crate::providers::{ReplayProvider, SimulationProvider};
use crate::settings::AnalyzerSettings;
use crate::stream::{ReportExt, ReportFrames};
use crate::types::Packet;
use crate::{Result, RffeError};


/// Handle to a running decode
pub struct DecodeSession {
    /// Committed packets from the decode task
    packets: mpsc::Receiver<Arc<Packet>>,

    /// Progress watch receiver
    progress: watch::Receiver<DecodeProgress>,

    /// Report toggles and channel assignment
    settings: AnalyzerSettings,

    sample_rate_hz: u64,

    cancel: CancellationToken,

    /// Cancels the decode task when the session goes away
    guard: DropGuard,
}

impl DecodeSession {
    /// Replay a capture file.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<P: AsRef<Path>>(path: P, settings: AnalyzerSettings) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening capture file: {}", path.display());
        let provider = ReplayProvider::open(path, &settings)?;
        Self::from_provider(provider, settings)
    }

    /// Replay an in-memory capture.
    pub fn replay(capture: &Capture, settings: AnalyzerSettings) -> Result<Self> {
        let provider = ReplayProvider::new(capture, &settings)?;
        Self::from_provider(provider, settings)
    }

    /// Decode generator sweeps; `rounds` of `None` runs until cancelled.
    pub fn simulate(
        config: SimulationConfig,
        settings: AnalyzerSettings,
        rounds: Option<u64>,
    ) -> Result<Self> {
        let mut provider = SimulationProvider::new(config, &settings)?;
        if let Some(rounds) = rounds {
            provider = provider.with_rounds(rounds);
        }
        Self::from_provider(provider, settings)
    }

    pub fn from_provider<P: CaptureProvider>(provider: P, settings: AnalyzerSettings) -> Result<Self> {
        Self::with_capacity(provider, settings, DEFAULT_PACKET_CAPACITY)
    }

    /// Session whose packet buffer holds at most `capacity` packets.
    pub fn with_capacity<P: CaptureProvider>(
        provider: P,
        settings: AnalyzerSettings,
        capacity: usize,
    ) -> Result<Self> {
        settings.validate()?;
        let sample_rate_hz = provider.sample_rate_hz();
        let channels = Driver::spawn(provider, capacity)?;

        info!("Decode session started ({}Hz)", sample_rate_hz);

        Ok(Self {
            packets: channels.packets,
            progress: channels.progress,
            settings,
            sample_rate_hz,
            guard: channels.cancel.clone().drop_guard(),
            cancel: channels.cancel,
        })
    }

    /// Next committed packet; `None` once the decode has finished and every
    /// packet was handed out.
    pub async fn next_packet(&mut self) -> Option<Arc<Packet>> {
        self.packets.recv().await
    }

    /// Next committed packet, waiting at most `duration`.
    pub async fn next_packet_timeout(&mut self, duration: Duration) -> Result<Arc<Packet>> {
        match tokio::time::timeout(duration, self.packets.recv()).await {
            Ok(Some(packet)) => Ok(packet),
            Ok(None) => Err(RffeError::SessionClosed),
            Err(_) => Err(RffeError::Timeout { duration }),
        }
    }

    /// Wait for the decode to finish and return every remaining packet.
    pub async fn collect_packets(mut self) -> Vec<Arc<Packet>> {
        let mut packets = Vec::new();
        while let Some(packet) = self.packets.recv().await {
            packets.push(packet);
        }
        debug!("Collected {} packets", packets.len());
        packets
    }

    /// Progress snapshots as the decode advances
    pub fn progress(&self) -> impl Stream<Item = DecodeProgress> + 'static {
        WatchStream::new(self.progress.clone())
    }

    pub fn current_progress(&self) -> DecodeProgress {
        *self.progress.borrow()
    }

    pub fn into_packet_stream(self) -> PacketStream {
        PacketStream { inner: ReceiverStream::new(self.packets), _guard: self.guard }
    }

    /// Frames of every packet, filtered by the session's report toggles
    pub fn into_report_frames(self) -> ReportFrames<PacketStream> {
        let settings = self.settings.clone();
        self.into_packet_stream().report_frames(&settings)
    }

    /// Stop the decode task; packets already delivered stay valid.
    pub fn cancel(&self) {
        debug!("Cancelling decode session");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub fn sample_rate_hz(&self) -> u64 {
        self.sample_rate_hz
    }
}

pin_project! {
    /// Committed packets of a session, as a stream
    ///
    /// Dropping the stream cancels the decode task.
    pub struct PacketStream {
        #[pin]
        inner: ReceiverStream<Arc<Packet>>,
        _guard: DropGuard,
    }
}

impl Stream for PacketStream {
    type Item = Arc<Packet>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
