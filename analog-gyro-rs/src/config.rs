//! Construction-time configuration.

use crate::calibration::GyroBias;
use crate::constants::{
    AVERAGE_BITS, CALIBRATION_SAMPLE_TIME_MS, DEFAULT_VOLTS_PER_DEGREE_PER_SECOND,
    OVERSAMPLE_BITS, SAMPLES_PER_SECOND, SETTLE_TIME_MS,
};
use crate::conversion::sample_rate_for;

/// Channel programming, timing and calibration source for a new gyro.
///
/// [`GyroConfig::default()`] reproduces the stock set-up: 10 oversample
/// bits, no averaging, 50 accumulator samples per second, a 5 s calibration
/// window and a 100 ms settle wait.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GyroConfig {
    /// Average bits programmed into the channel. Default: 0.
    pub average_bits: u32,
    /// Oversample bits programmed into the channel. Default: 10.
    pub oversample_bits: u32,
    /// Accumulator samples per second. The raw conversion rate is this
    /// times `2^(average_bits + oversample_bits)`. Default: 50.
    pub samples_per_second: f64,
    /// Stationary calibration window. Default: 5000 ms.
    pub calibration_time_ms: u32,
    /// Wait after programming the sample rate. Default: 100 ms.
    pub settle_time_ms: u32,
    /// Volts per degree/second. Default: 0.007.
    pub sensitivity: f32,
    /// Preset bias. `Some` skips calibration entirely. Default: `None`.
    pub bias: Option<GyroBias>,
}

impl Default for GyroConfig {
    fn default() -> Self {
        Self {
            average_bits: AVERAGE_BITS,
            oversample_bits: OVERSAMPLE_BITS,
            samples_per_second: SAMPLES_PER_SECOND,
            calibration_time_ms: CALIBRATION_SAMPLE_TIME_MS,
            settle_time_ms: SETTLE_TIME_MS,
            sensitivity: DEFAULT_VOLTS_PER_DEGREE_PER_SECOND,
            bias: None,
        }
    }
}

impl GyroConfig {
    /// Default configuration with a preset bias.
    pub fn with_bias(bias: GyroBias) -> Self {
        Self {
            bias: Some(bias),
            ..Self::default()
        }
    }

    /// Raw conversion rate to program into the channel.
    pub fn sample_rate(&self) -> f64 {
        sample_rate_for(self.samples_per_second, self.average_bits, self.oversample_bits)
    }
}
