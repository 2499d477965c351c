//! Incremental capture data

use super::RecordedChannel;
use crate::error::Result;

/// Transitions recorded on both lines since the previous chunk.
///
/// Chunks are produced in capture order: a later chunk never carries a
/// transition earlier than one already delivered on the same line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureChunk {
    pub sclk_edges: Vec<u64>,
    pub sdata_edges: Vec<u64>,
    /// Sample the source had reached when the chunk was cut
    pub end_sample: u64,
}

impl CaptureChunk {
    pub fn is_empty(&self) -> bool {
        self.sclk_edges.is_empty() && self.sdata_edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.sclk_edges.len() + self.sdata_edges.len()
    }

    /// Append the chunk to a clock/data channel pair.
    pub fn append_to(&self, sclk: &mut RecordedChannel, sdata: &mut RecordedChannel) -> Result<()> {
        sclk.extend(&self.sclk_edges)?;
        sdata.extend(&self.sdata_edges)
    }

    /// Split an edge list into chunks covering `span` samples each.
    ///
    /// Windows without any transition are skipped, so a gap between edges
    /// never produces empty chunks.
    pub fn split(sclk: &[u64], sdata: &[u64], span: u64) -> Vec<CaptureChunk> {
        let span = span.max(1);
        let mut chunks = Vec::new();
        let (mut sclk_index, mut sdata_index) = (0, 0);
        let mut end_sample = span;
        loop {
            let sclk_end = sclk_index + sclk[sclk_index..].partition_point(|&edge| edge <= end_sample);
            let sdata_end =
                sdata_index + sdata[sdata_index..].partition_point(|&edge| edge <= end_sample);
            chunks.push(CaptureChunk {
                sclk_edges: sclk[sclk_index..sclk_end].to_vec(),
                sdata_edges: sdata[sdata_index..sdata_end].to_vec(),
                end_sample,
            });
            sclk_index = sclk_end;
            sdata_index = sdata_end;

            let next = match (sclk.get(sclk_index), sdata.get(sdata_index)) {
                (Some(&a), Some(&b)) => a.min(b),
                (Some(&edge), None) | (None, Some(&edge)) => edge,
                (None, None) => break,
            };
            // land on the window holding the next edge
            let windows = (next - end_sample - 1) / span + 1;
            end_sample = end_sample.saturating_add(windows.saturating_mul(span));
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BitState, ChannelId};

    #[test]
    fn split_keeps_every_edge_once() {
        let sclk = [3, 9, 12, 25];
        let sdata = [5, 11, 30];
        let chunks = CaptureChunk::split(&sclk, &sdata, 10);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].sclk_edges, vec![3, 9]);
        assert_eq!(chunks[0].sdata_edges, vec![5]);
        assert_eq!(chunks[1].end_sample, 20);
        assert_eq!(chunks[2].sdata_edges, vec![30]);

        let total: usize = chunks.iter().map(CaptureChunk::edge_count).sum();
        assert_eq!(total, sclk.len() + sdata.len());
    }

    #[test]
    fn split_of_empty_capture_is_one_empty_chunk() {
        let chunks = CaptureChunk::split(&[], &[], 100);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
    }

    #[test]
    fn split_skips_windows_without_edges() {
        let chunks = CaptureChunk::split(&[20_000_000_000], &[10], 50_000);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].sdata_edges, vec![10]);
        assert_eq!(chunks[0].end_sample, 50_000);
        assert_eq!(chunks[1].sclk_edges, vec![20_000_000_000]);
        assert_eq!(chunks[1].end_sample, 20_000_000_000);
        assert!(chunks.iter().all(|chunk| !chunk.is_empty()));
    }

    #[test]
    fn split_gap_resumes_on_window_boundary() {
        let chunks = CaptureChunk::split(&[5, 1_001], &[1_000], 100);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].end_sample, 1_000);
        assert_eq!(chunks[1].sdata_edges, vec![1_000]);
        assert_eq!(chunks[2].end_sample, 1_100);
        assert_eq!(chunks[2].sclk_edges, vec![1_001]);
    }

    #[test]
    fn split_with_unbounded_span_is_one_chunk() {
        let chunks = CaptureChunk::split(&[3, u64::MAX - 1], &[7], u64::MAX);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].edge_count(), 3);
    }

    #[test]
    fn append_extends_both_lines() {
        let mut sclk = RecordedChannel::new(ChannelId(0), BitState::Low, vec![1]).unwrap();
        let mut sdata = RecordedChannel::new(ChannelId(1), BitState::Low, vec![]).unwrap();
        let chunk = CaptureChunk { sclk_edges: vec![4], sdata_edges: vec![2, 3], end_sample: 5 };

        chunk.append_to(&mut sclk, &mut sdata).unwrap();
        assert_eq!(sclk.edges(), &[1, 4]);
        assert_eq!(sdata.edges(), &[2, 3]);
    }
}
