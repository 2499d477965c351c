//! Error types for capture handling and decode sessions.
//!
//! Malformed bus traffic is never an error: parity mismatches, reserved
//! commands, invalid master ids and aborted transactions are reported as
//! [`FrameFlags`](crate::FrameFlags) on the decoded frames. The errors in this
//! module cover everything around the decoder instead.
//!
//! ## Error Categories
//!
//! - **File Errors**: Problems reading or writing capture and settings files
//! - **Parse Errors**: YAML documents that do not match the expected layout
//! - **Settings Errors**: Analyzer or simulation settings that cannot be used
//! - **Capture Errors**: Missing channels or edge lists that are not monotonic
//! - **Transaction Errors**: Generator input that does not fit the command type
//! - **Session Errors**: Provider failures, timeouts and closed sessions
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use rffe::RffeError;
//!
//! let error = RffeError::invalid_settings("SCLK and SDATA share channel 0");
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::ChannelId;

/// Result type alias for capture and session operations.
pub type Result<T, E = RffeError> = std::result::Result<T, E>;

/// Main error type for the crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RffeError {
    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid settings: {reason}")]
    Settings { reason: String },

    #[error("Channel {channel} not present in capture")]
    ChannelNotFound { channel: ChannelId },

    #[error("Invalid capture on channel {channel}: {reason}")]
    InvalidCapture { channel: ChannelId, reason: String },

    #[error("Invalid transaction for command {command:#04x}: {reason}")]
    InvalidTransaction { command: u8, reason: String },

    #[error("Capture provider failed: {reason}")]
    Provider {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Decode session closed")]
    SessionClosed,
}

impl RffeError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RffeError::Provider { .. } => true,
            RffeError::Timeout { .. } => true,
            RffeError::File { .. } => false,
            RffeError::Parse { .. } => false,
            RffeError::Settings { .. } => false,
            RffeError::ChannelNotFound { .. } => false,
            RffeError::InvalidCapture { .. } => false,
            RffeError::InvalidTransaction { .. } => false,
            RffeError::SessionClosed => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RffeError::File { .. } => vec![
                "Check file exists and is readable",
                "Check the output directory is writable",
                "Check file permissions",
            ],
            RffeError::Parse { .. } => vec![
                "Check the YAML document layout",
                "Regenerate the file with Capture::save or AnalyzerSettings::save",
            ],
            RffeError::Settings { .. } => vec![
                "Assign SCLK and SDATA to two different channels",
                "Use a clock at most a quarter of the sample rate",
                "Use a non-zero LFSR seed",
            ],
            RffeError::ChannelNotFound { .. } => vec![
                "Check the channel ids in the analyzer settings",
                "List the channels recorded in the capture file",
            ],
            RffeError::InvalidCapture { .. } => vec![
                "Edges must be strictly increasing sample positions",
                "Append chunks in capture order",
            ],
            RffeError::InvalidTransaction { .. } => vec![
                "Use Transaction::expected_payload_len for the command",
                "Only Interrupt commands carry an interrupt mask",
            ],
            RffeError::Provider { .. } => vec![
                "Check the capture source is still producing data",
                "Retry the session",
            ],
            RffeError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Check the capture source is still producing data",
            ],
            RffeError::SessionClosed => vec![
                "Open a new session",
                "Keep the session alive until all packets are consumed",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        RffeError::File { path, source }
    }

    /// Helper constructor for YAML parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl ToString) -> Self {
        RffeError::Parse { context: context.into(), details: details.to_string() }
    }

    /// Helper constructor for settings errors.
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        RffeError::Settings { reason: reason.into() }
    }

    /// Helper constructor for capture errors.
    pub fn invalid_capture(channel: ChannelId, reason: impl Into<String>) -> Self {
        RffeError::InvalidCapture { channel, reason: reason.into() }
    }

    /// Helper constructor for generator input errors.
    pub fn invalid_transaction(command: u8, reason: impl Into<String>) -> Self {
        RffeError::InvalidTransaction { command, reason: reason.into() }
    }

    /// Helper constructor for provider failures.
    pub fn provider_failed(reason: impl Into<String>) -> Self {
        RffeError::Provider { reason: reason.into(), source: None }
    }
}

impl From<std::io::Error> for RffeError {
    fn from(err: std::io::Error) -> Self {
        RffeError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
