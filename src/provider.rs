//! Provider trait for capture sources

use crate::Result;
use crate::capture::CaptureChunk;
use crate::types::{BitState, ChannelId};

/// Trait for sources of SCLK/SDATA transitions
///
/// Providers abstract over where samples come from (a capture file, the
/// traffic generator) and handle their own pacing internally. The decode
/// driver only ever sees chunks of edges in capture order.
#[async_trait::async_trait]
pub trait CaptureProvider: Send + 'static {
    /// Get the next chunk of transitions
    ///
    /// Returns:
    /// - `Ok(Some(chunk))` - More samples available (the chunk may be empty)
    /// - `Ok(None)` - Capture ended (normal termination)
    /// - `Err(e)` - Error occurred
    async fn next_chunk(&mut self) -> Result<Option<CaptureChunk>>;

    /// Line levels at sample 0, SCLK first
    fn initial_states(&self) -> (BitState, BitState);

    /// Channel ids carrying SCLK and SDATA
    fn channel_ids(&self) -> (ChannelId, ChannelId);

    /// Samples per second of the source
    fn sample_rate_hz(&self) -> u64;
}
