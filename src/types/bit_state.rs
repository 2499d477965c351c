//! Line-level primitives shared by the capture, decoder and generator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;

/// Logic level of one line at a sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitState {
    #[default]
    Low,
    High,
}

impl BitState {
    /// Level for a sampled boolean.
    pub const fn from_bool(high: bool) -> Self {
        if high { BitState::High } else { BitState::Low }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, BitState::High)
    }

    pub const fn is_low(self) -> bool {
        matches!(self, BitState::Low)
    }
}

impl Not for BitState {
    type Output = BitState;

    fn not(self) -> Self::Output {
        match self {
            BitState::Low => BitState::High,
            BitState::High => BitState::Low,
        }
    }
}

/// Identifier of a logic-analyzer channel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two bus lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Line {
    Sclk,
    Sdata,
}
