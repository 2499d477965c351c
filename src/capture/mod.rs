//! Sampled line data: the forward cursor API, in-memory channels and the
//! YAML capture file format.

mod channel;
mod chunk;
mod format;

pub use channel::{ChannelData, ChannelMark, RecordedChannel, Rewind};
pub use chunk::CaptureChunk;
pub use format::{Capture, CaptureChannel, MIN_SAMPLE_RATE_HZ};
