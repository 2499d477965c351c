//! Analyzer settings
//!
//! Which capture channels carry SCLK and SDATA, and which bookkeeping frames
//! a report should include. Settings are fixed for the length of a decode run.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, RffeError};
use crate::types::{ChannelId, Frame, FrameKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub sclk_channel: ChannelId,
    pub sdata_channel: ChannelId,
    /// Keep Parity frames in reports
    pub show_parity_in_report: bool,
    /// Keep BusPark frames in reports
    pub show_bus_park_in_report: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            sclk_channel: ChannelId(0),
            sdata_channel: ChannelId(1),
            show_parity_in_report: true,
            show_bus_park_in_report: true,
        }
    }
}

impl AnalyzerSettings {
    pub fn new(sclk_channel: ChannelId, sdata_channel: ChannelId) -> Result<Self> {
        let settings = Self { sclk_channel, sdata_channel, ..Self::default() };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_report_toggles(mut self, show_parity: bool, show_bus_park: bool) -> Self {
        self.show_parity_in_report = show_parity;
        self.show_bus_park_in_report = show_bus_park;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sclk_channel == self.sdata_channel {
            return Err(RffeError::invalid_settings(format!(
                "SCLK and SDATA both use channel {}",
                self.sclk_channel
            )));
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RffeError::file_error(path.to_path_buf(), e))?;
        let settings = Self::from_yaml(&yaml)?;
        debug!("Loaded analyzer settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml_ng::to_string(self)
            .map_err(|e| RffeError::parse_error("analyzer settings", e))?;
        std::fs::write(path, yaml).map_err(|e| RffeError::file_error(path.to_path_buf(), e))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: AnalyzerSettings = serde_yaml_ng::from_str(yaml)
            .map_err(|e| RffeError::parse_error("analyzer settings", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Whether a frame survives the report toggles.
    pub fn shows(&self, frame: &Frame) -> bool {
        match frame.kind {
            FrameKind::Parity => self.show_parity_in_report,
            FrameKind::BusPark => self.show_bus_park_in_report,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrameFlags;

    fn frame(kind: FrameKind) -> Frame {
        Frame { kind, value: 0, aux: 0, start: 0, end: 0, flags: FrameFlags::empty() }
    }

    #[test]
    fn defaults_are_valid() {
        AnalyzerSettings::default().validate().unwrap();
    }

    #[test]
    fn rejects_shared_channel() {
        let result = AnalyzerSettings::new(ChannelId(2), ChannelId(2));
        assert!(matches!(result, Err(RffeError::Settings { .. })));
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let settings = AnalyzerSettings::from_yaml("sclk_channel: 4\nsdata_channel: 5\n").unwrap();
        assert_eq!(settings.sclk_channel, ChannelId(4));
        assert_eq!(settings.sdata_channel, ChannelId(5));
        assert!(settings.show_parity_in_report);
        assert!(settings.show_bus_park_in_report);
    }

    #[test]
    fn yaml_with_shared_channel_fails_validation() {
        let result = AnalyzerSettings::from_yaml("sclk_channel: 1\nsdata_channel: 1\n");
        assert!(matches!(result, Err(RffeError::Settings { .. })));
    }

    #[test]
    fn report_toggles_filter_bookkeeping_frames() {
        let settings = AnalyzerSettings::default().with_report_toggles(false, true);
        assert!(!settings.shows(&frame(FrameKind::Parity)));
        assert!(settings.shows(&frame(FrameKind::BusPark)));
        assert!(settings.shows(&frame(FrameKind::Data)));

        let settings = settings.with_report_toggles(true, false);
        assert!(settings.shows(&frame(FrameKind::Parity)));
        assert!(!settings.shows(&frame(FrameKind::BusPark)));
    }

    #[test]
    fn save_and_load_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");

        let settings = AnalyzerSettings::new(ChannelId(3), ChannelId(7))
            .unwrap()
            .with_report_toggles(false, false);
        settings.save(&path).unwrap();
        assert_eq!(AnalyzerSettings::load(&path).unwrap(), settings);
    }
}
