//! Destinations for decoded frames

use std::mem;

use crate::types::{Frame, Marker, Packet, PacketStatus};

/// Receives frames and markers as they are decoded.
///
/// Frames accumulate into an open packet until the decoder either commits it
/// or cancels it. A cancelled packet's frames and markers must be dropped.
pub trait ResultsSink {
    fn add_frame(&mut self, frame: Frame);
    fn add_marker(&mut self, marker: Marker);
    fn commit_packet(&mut self, status: PacketStatus);
    fn cancel_packet(&mut self);
}

/// Sink that assembles committed [`Packet`]s in memory.
#[derive(Debug, Default)]
pub struct PacketCollector {
    frames: Vec<Frame>,
    markers: Vec<Marker>,
    committed: Vec<Packet>,
}

impl PacketCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> &[Packet] {
        &self.committed
    }

    /// Remove and return every packet committed so far.
    pub fn take_committed(&mut self) -> Vec<Packet> {
        mem::take(&mut self.committed)
    }

    pub fn into_packets(self) -> Vec<Packet> {
        self.committed
    }

    /// Frames of the packet still being decoded.
    pub fn open_frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl ResultsSink for PacketCollector {
    fn add_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn commit_packet(&mut self, status: PacketStatus) {
        if self.frames.is_empty() {
            self.markers.clear();
            return;
        }
        self.committed.push(Packet {
            frames: mem::take(&mut self.frames),
            markers: mem::take(&mut self.markers),
            status,
        });
    }

    fn cancel_packet(&mut self) {
        self.frames.clear();
        self.markers.clear();
    }
}
