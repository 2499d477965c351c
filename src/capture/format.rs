//! YAML capture files
//!
//! A capture is a sample rate plus, per channel, an initial level and the list
//! of samples where the level toggles:
//!
//! ```yaml
//! sample_rate_hz: 50000000
//! channels:
//!   - id: 0
//!     name: SCLK
//!     initial: low
//!     edges: [40, 45, 50]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use super::RecordedChannel;
use crate::error::{Result, RffeError};
use crate::types::{BitState, ChannelId};

/// Lowest sample rate the decoder is rated for.
pub const MIN_SAMPLE_RATE_HZ: u64 = 50_000_000;

/// One recorded line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureChannel {
    pub id: ChannelId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub initial: BitState,
    #[serde(default)]
    pub edges: Vec<u64>,
}

impl CaptureChannel {
    pub fn from_recorded(name: impl Into<String>, channel: &RecordedChannel) -> Self {
        Self {
            id: channel.id(),
            name: name.into(),
            initial: channel.initial_state(),
            edges: channel.edges().to_vec(),
        }
    }

    pub fn to_recorded(&self) -> Result<RecordedChannel> {
        RecordedChannel::new(self.id, self.initial, self.edges.clone())
    }
}

/// A multi-channel capture as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub sample_rate_hz: u64,
    pub channels: Vec<CaptureChannel>,
}

impl Capture {
    /// Read and validate a capture file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RffeError::file_error(path.to_path_buf(), e))?;
        let capture = Self::from_yaml(&yaml)?;
        debug!(
            "Loaded capture {}: {} channels at {} Hz",
            path.display(),
            capture.channels.len(),
            capture.sample_rate_hz
        );
        Ok(capture)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| RffeError::file_error(path.to_path_buf(), e))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let capture: Capture =
            serde_yaml_ng::from_str(yaml).map_err(|e| RffeError::parse_error("capture", e))?;
        capture.validate()?;
        Ok(capture)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| RffeError::parse_error("capture", e))
    }

    /// Check channel ids are unique and every edge list is strictly increasing.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate_hz == 0 {
            return Err(RffeError::parse_error("capture", "sample_rate_hz must be non-zero"));
        }
        if self.sample_rate_hz < MIN_SAMPLE_RATE_HZ {
            warn!(
                "Capture sample rate {} Hz is below the {} Hz minimum; bus parks may be misread",
                self.sample_rate_hz, MIN_SAMPLE_RATE_HZ
            );
        }
        for (index, channel) in self.channels.iter().enumerate() {
            if self.channels[..index].iter().any(|other| other.id == channel.id) {
                return Err(RffeError::invalid_capture(channel.id, "duplicate channel id"));
            }
            channel.to_recorded()?;
        }
        Ok(())
    }

    pub fn channel(&self, id: ChannelId) -> Result<&CaptureChannel> {
        self.channels
            .iter()
            .find(|channel| channel.id == id)
            .ok_or(RffeError::ChannelNotFound { channel: id })
    }

    /// In-memory clock and data lines for a decode run.
    pub fn channel_pair(
        &self,
        sclk: ChannelId,
        sdata: ChannelId,
    ) -> Result<(RecordedChannel, RecordedChannel)> {
        Ok((self.channel(sclk)?.to_recorded()?, self.channel(sdata)?.to_recorded()?))
    }

    /// Last transition on any channel.
    pub fn last_edge(&self) -> Option<u64> {
        self.channels.iter().filter_map(|channel| channel.edges.last().copied()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ChannelData;

    const SAMPLE: &str = r#"
sample_rate_hz: 50000000
channels:
  - id: 0
    name: SCLK
    initial: low
    edges: [40, 45, 50]
  - id: 1
    name: SDATA
    initial: high
    edges: [12]
"#;

    #[test]
    fn parses_capture_yaml() {
        let capture = Capture::from_yaml(SAMPLE).unwrap();
        assert_eq!(capture.sample_rate_hz, 50_000_000);
        assert_eq!(capture.channels.len(), 2);

        let sdata = capture.channel(ChannelId(1)).unwrap();
        assert_eq!(sdata.initial, BitState::High);
        assert_eq!(sdata.edges, vec![12]);
    }

    #[test]
    fn missing_channel_is_reported() {
        let capture = Capture::from_yaml(SAMPLE).unwrap();
        assert!(matches!(
            capture.channel(ChannelId(7)),
            Err(RffeError::ChannelNotFound { channel: ChannelId(7) })
        ));
    }

    #[test]
    fn rejects_unordered_edges() {
        let yaml = SAMPLE.replace("[40, 45, 50]", "[40, 50, 45]");
        assert!(matches!(Capture::from_yaml(&yaml), Err(RffeError::InvalidCapture { .. })));
    }

    #[test]
    fn rejects_duplicate_channels() {
        let yaml = SAMPLE.replace("id: 1", "id: 0");
        assert!(matches!(Capture::from_yaml(&yaml), Err(RffeError::InvalidCapture { .. })));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(Capture::from_yaml("channels: 3"), Err(RffeError::Parse { .. })));
    }

    #[test]
    fn channel_pair_builds_recorded_lines() {
        let capture = Capture::from_yaml(SAMPLE).unwrap();
        let (mut sclk, sdata) = capture.channel_pair(ChannelId(0), ChannelId(1)).unwrap();
        assert_eq!(sdata.bit_state(), BitState::High);
        sclk.advance_to(46);
        assert_eq!(sclk.bit_state(), BitState::Low);
        assert_eq!(capture.last_edge(), Some(50));
    }

    #[test]
    fn save_and_load_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.yaml");

        let capture = Capture::from_yaml(SAMPLE).unwrap();
        capture.save(&path).unwrap();
        assert_eq!(Capture::load(&path).unwrap(), capture);
    }

    #[test]
    fn load_missing_file_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Capture::load(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(RffeError::File { .. })));
    }
}
