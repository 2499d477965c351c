//! Driver spawns and manages the decode task

use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::Result;
use crate::capture::RecordedChannel;
use crate::decoder::{Decoder, PacketCollector, PacketOutcome};
use crate::provider::CaptureProvider;
use crate::types::{Packet, PacketStatus};

/// Packets buffered between the decode task and its consumer.
pub const DEFAULT_PACKET_CAPACITY: usize = 256;

const MAX_ERRORS: u32 = 10;

/// Running totals published by the decode task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeProgress {
    /// Sample the decoder has reached
    pub position: u64,
    pub complete: u64,
    pub incomplete: u64,
    /// Packets preempted by a start condition before any frame
    pub discarded: u64,
    /// Chunks received from the provider
    pub chunks: u64,
    /// The task has stopped and no more packets will arrive
    pub finished: bool,
}

impl DecodeProgress {
    pub fn packets(&self) -> u64 {
        self.complete + self.incomplete
    }
}

/// Result of spawning the decode task
pub struct DriverChannels {
    /// Committed packets, in capture order
    pub packets: mpsc::Receiver<Arc<Packet>>,
    /// Latest progress snapshot
    pub progress: watch::Receiver<DecodeProgress>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the decode task
///
/// The task owns the provider and the decoder. Each chunk is appended to the
/// decoder's channels and every packet that fits in the buffered samples is
/// decoded. A packet cut off by the end of the buffer is rewound and decoded
/// again once the next chunk arrives.
pub struct Driver;

impl Driver {
    /// Spawn the decode task for the given provider
    ///
    /// `capacity` bounds the packet channel; the task waits when the
    /// consumer falls behind. Must be called from within a tokio runtime.
    pub fn spawn<P>(provider: P, capacity: usize) -> Result<DriverChannels>
    where
        P: CaptureProvider,
    {
        let (sclk_id, sdata_id) = provider.channel_ids();
        let (sclk_initial, sdata_initial) = provider.initial_states();
        let decoder = Decoder::new(
            RecordedChannel::new(sclk_id, sclk_initial, Vec::new())?,
            RecordedChannel::new(sdata_id, sdata_initial, Vec::new())?,
        );

        let (packet_tx, packet_rx) = mpsc::channel(capacity.max(1));
        let (progress_tx, progress_rx) = watch::channel(DecodeProgress::default());
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::decode_task(provider, decoder, packet_tx, progress_tx, cancel_task).await;
        });

        Ok(DriverChannels { packets: packet_rx, progress: progress_rx, cancel })
    }

    async fn decode_task<P>(
        mut provider: P,
        mut decoder: Decoder<RecordedChannel>,
        packet_tx: mpsc::Sender<Arc<Packet>>,
        progress_tx: watch::Sender<DecodeProgress>,
        cancel: CancellationToken,
    ) where
        P: CaptureProvider,
    {
        info!("Decode task started ({}Hz)", provider.sample_rate_hz());
        let mut progress = DecodeProgress::default();
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Decode task cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Decode task cancelled while waiting for capture data");
                    break;
                }
                result = provider.next_chunk() => result,
            };

            match result {
                Ok(Some(chunk)) => {
                    error_count = 0;
                    progress.chunks += 1;
                    trace!(
                        "Chunk {}: {} edges up to sample {}",
                        progress.chunks,
                        chunk.edge_count(),
                        chunk.end_sample
                    );

                    let (sclk, sdata) = decoder.channels_mut();
                    if let Err(e) = chunk.append_to(sclk, sdata) {
                        error!("Rejected capture chunk {}: {}", progress.chunks, e);
                        break;
                    }

                    let flow = Self::decode_buffered(
                        &mut decoder,
                        &packet_tx,
                        &progress_tx,
                        &mut progress,
                        &cancel,
                        true,
                    )
                    .await;
                    if flow.is_break() {
                        break;
                    }
                }
                Ok(None) => {
                    info!("Capture ended after {} chunks", progress.chunks);
                    // the trailing partial packet is dropped, not rewound
                    let _ = Self::decode_buffered(
                        &mut decoder,
                        &packet_tx,
                        &progress_tx,
                        &mut progress,
                        &cancel,
                        false,
                    )
                    .await;
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("Too many provider errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        progress.position = decoder.position();
        progress.finished = true;
        progress_tx.send_replace(progress);
        info!(
            "Decode task ended ({} complete, {} incomplete packets)",
            progress.complete, progress.incomplete
        );
    }

    /// Decode every packet the buffered samples hold.
    ///
    /// Breaks when the task should stop: cancelled, or nobody is listening.
    async fn decode_buffered(
        decoder: &mut Decoder<RecordedChannel>,
        packet_tx: &mpsc::Sender<Arc<Packet>>,
        progress_tx: &watch::Sender<DecodeProgress>,
        progress: &mut DecodeProgress,
        cancel: &CancellationToken,
        live: bool,
    ) -> ControlFlow<()> {
        let mut sink = PacketCollector::new();
        // everything up to the last checkpoint is decoded for good
        decoder.release_consumed();

        loop {
            let checkpoint = decoder.checkpoint();
            match decoder.decode_packet(&mut sink) {
                PacketOutcome::Committed(PacketStatus::Complete) => progress.complete += 1,
                PacketOutcome::Committed(PacketStatus::Incomplete) => progress.incomplete += 1,
                PacketOutcome::Discarded => {
                    progress.discarded += 1;
                    continue;
                }
                PacketOutcome::Exhausted => {
                    if live {
                        decoder.restore(checkpoint);
                    }
                    progress.position = decoder.position();
                    progress_tx.send_replace(*progress);
                    return ControlFlow::Continue(());
                }
            }

            for packet in sink.take_committed() {
                trace!(
                    "Packet {} ({:?}) over samples {:?}",
                    progress.packets(),
                    packet.status,
                    packet.span()
                );
                // cancellation wins over a send that is also ready
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Cancelled while delivering packet");
                        return ControlFlow::Break(());
                    }
                    sent = packet_tx.send(Arc::new(packet)) => sent,
                };
                if sent.is_err() {
                    debug!("Packet receiver dropped, shutting down");
                    return ControlFlow::Break(());
                }
            }

            progress.position = decoder.position();
            progress_tx.send_replace(*progress);

            if cancel.is_cancelled() {
                debug!("Cancelled after packet {}", progress.packets());
                return ControlFlow::Break(());
            }
        }
    }
}
