//! Replay provider for capture files

use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace, warn};

use crate::Result;
use crate::capture::{Capture, CaptureChunk, RecordedChannel};
use crate::provider::CaptureProvider;
use crate::settings::AnalyzerSettings;
use crate::types::{BitState, ChannelId};

/// Samples per chunk when none is configured.
pub const DEFAULT_CHUNK_SAMPLES: u64 = 50_000;

/// Replay provider that hands out a recorded capture in fixed-size chunks
pub struct ReplayProvider {
    sclk: RecordedChannel,
    sdata: RecordedChannel,

    /// Chunks not yet delivered
    chunks: VecDeque<CaptureChunk>,
    chunk_samples: u64,
    total_chunks: usize,

    sample_rate_hz: u64,

    /// Playback speed multiplier, only used when pacing
    speed: f64,

    /// Chunk pacing; `None` replays as fast as the decoder consumes
    pacing: Option<Interval>,
}

impl ReplayProvider {
    /// Create a replay provider over the channels named in `settings`
    pub fn new(capture: &Capture, settings: &AnalyzerSettings) -> Result<Self> {
        capture.validate()?;
        settings.validate()?;
        let (sclk, sdata) = capture.channel_pair(settings.sclk_channel, settings.sdata_channel)?;

        let mut provider = Self {
            sclk,
            sdata,
            chunks: VecDeque::new(),
            chunk_samples: DEFAULT_CHUNK_SAMPLES,
            total_chunks: 0,
            sample_rate_hz: capture.sample_rate_hz,
            speed: 1.0,
            pacing: None,
        };
        provider.rechunk();

        info!(
            "Replaying capture: {} chunks at {}Hz (last edge at sample {})",
            provider.total_chunks,
            provider.sample_rate_hz,
            capture.last_edge().unwrap_or(0)
        );
        Ok(provider)
    }

    /// Load a capture file and replay it
    pub fn open<P: AsRef<Path>>(path: P, settings: &AnalyzerSettings) -> Result<Self> {
        let capture = Capture::load(path)?;
        Self::new(&capture, settings)
    }

    /// Change the chunk size; restarts the replay
    pub fn with_chunk_samples(mut self, samples: u64) -> Self {
        self.chunk_samples = samples.max(1);
        self.rechunk();
        self
    }

    fn rechunk(&mut self) {
        self.chunks =
            CaptureChunk::split(self.sclk.edges(), self.sdata.edges(), self.chunk_samples).into();
        self.total_chunks = self.chunks.len();
    }

    /// Pace chunks to the capture's own sample clock
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(0.1, 10.0);

        let seconds = self.chunk_samples as f64 / (self.sample_rate_hz as f64 * self.speed);
        let chunk_duration = Duration::from_secs_f64(seconds);
        if chunk_duration < Duration::from_millis(1) {
            warn!("Chunk interval {:?} is below timer resolution; replay will run slow", chunk_duration);
        }

        let mut pacing = interval(chunk_duration.max(Duration::from_millis(1)));
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.pacing = Some(pacing);

        debug!("Playback speed set to {}x", self.speed);
    }

    /// Chunks handed out so far
    pub fn delivered_chunks(&self) -> usize {
        self.total_chunks - self.chunks.len()
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    /// Get total duration in seconds
    pub fn duration(&self) -> f64 {
        let last = self.sclk.last_edge().max(self.sdata.last_edge()).unwrap_or(0);
        last as f64 / self.sample_rate_hz as f64
    }
}

#[async_trait::async_trait]
impl CaptureProvider for ReplayProvider {
    async fn next_chunk(&mut self) -> Result<Option<CaptureChunk>> {
        if self.chunks.is_empty() {
            debug!("Reached end of replay");
            return Ok(None);
        }

        if let Some(pacing) = self.pacing.as_mut() {
            pacing.tick().await;
        }

        let chunk = self.chunks.pop_front();
        if let Some(chunk) = &chunk {
            trace!(
                "Chunk {}/{}: {} edges up to sample {}",
                self.delivered_chunks(),
                self.total_chunks,
                chunk.edge_count(),
                chunk.end_sample
            );
        }
        Ok(chunk)
    }

    fn initial_states(&self) -> (BitState, BitState) {
        (self.sclk.initial_state(), self.sdata.initial_state())
    }

    fn channel_ids(&self) -> (ChannelId, ChannelId) {
        (self.sclk.id(), self.sdata.id())
    }

    fn sample_rate_hz(&self) -> u64 {
        self.sample_rate_hz
    }
}
