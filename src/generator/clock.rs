//! Bit timing for the generator

/// Converts half clock periods into whole samples.
///
/// The fractional remainder is carried into the next call, so long runs stay
/// aligned with the nominal clock even when a half period is not a whole
/// number of samples.
#[derive(Debug, Clone)]
pub struct ClockGenerator {
    samples_per_half_period: f64,
    carry: f64,
}

impl ClockGenerator {
    pub fn new(clock_hz: u64, sample_rate_hz: u64) -> Self {
        Self { samples_per_half_period: sample_rate_hz as f64 / (2.0 * clock_hz as f64), carry: 0.0 }
    }

    pub fn samples_per_half_period(&self) -> f64 {
        self.samples_per_half_period
    }

    /// Samples covering `multiple` half periods from the current point.
    pub fn advance_by_half_period(&mut self, multiple: f64) -> u64 {
        self.carry += self.samples_per_half_period * multiple;
        let samples = self.carry.floor();
        self.carry -= samples;
        samples as u64
    }
}
