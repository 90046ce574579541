//! Raw accumulator counts to physical units.
//!
//! Pure functions; [`AnalogGyro`](crate::AnalogGyro) reads the channel and
//! feeds them. All voltages on the channel side are in nanovolts.

use crate::calibration::GyroBias;
use crate::channel::{AccumulatorChannel, AccumulatorOutput};
use crate::constants::NANOVOLTS_PER_VOLT;

/// Channel parameters that scale raw counts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelScale {
    /// Nanovolts per raw count.
    pub lsb_weight: f64,
    pub average_bits: u32,
    pub oversample_bits: u32,
    /// Raw conversions per second.
    pub sample_rate: f64,
}

impl ChannelScale {
    /// Snapshot the scaling parameters currently programmed into `channel`.
    pub fn of<C: AccumulatorChannel>(channel: &C) -> Self {
        Self {
            lsb_weight: channel.lsb_weight(),
            average_bits: channel.average_bits(),
            oversample_bits: channel.oversample_bits(),
            sample_rate: channel.sample_rate(),
        }
    }
}

/// Raw conversion rate for a given accumulator rate and bit configuration.
///
/// Formula: `samples_per_second * 2^(average_bits + oversample_bits)`.
pub fn sample_rate_for(samples_per_second: f64, average_bits: u32, oversample_bits: u32) -> f64 {
    samples_per_second * (1u64 << (average_bits + oversample_bits)) as f64
}

/// Round half away from zero without `std`.
fn round_to_i64(x: f64) -> i64 {
    if x < 0.0 {
        (x - 0.5) as i64
    } else {
        (x + 0.5) as i64
    }
}

/// Integrated heading in degrees.
///
/// The fractional `offset` is removed from every sample counted since the
/// last reset, so changing the offset mid-run rescales the whole history.
///
/// ```text
/// corrected = value - round(count * offset)
/// degrees   = corrected * 1e-9 * lsb_weight * 2^average_bits
///             / (sample_rate * sensitivity)
/// ```
///
/// The result is continuous: 720° of rotation reads 720, not 0.
pub fn angle_degrees(
    output: AccumulatorOutput,
    offset: f32,
    scale: &ChannelScale,
    sensitivity: f32,
) -> f32 {
    let correction = round_to_i64(output.count as f64 * offset as f64);
    let corrected = output.value - correction;

    let scaled = corrected as f64 / NANOVOLTS_PER_VOLT
        * scale.lsb_weight
        * (1u64 << scale.average_bits) as f64
        / (scale.sample_rate * sensitivity as f64);

    scaled as f32
}

/// Instantaneous rate in degrees per second from the channel's averaged value.
///
/// ```text
/// rate = (average - (center + offset)) * 1e-9 * lsb_weight
///        / (2^oversample_bits * sensitivity)
/// ```
pub fn rate_degrees_per_second(
    average: f64,
    bias: &GyroBias,
    scale: &ChannelScale,
    sensitivity: f32,
) -> f64 {
    (average - bias.mean()) / NANOVOLTS_PER_VOLT * scale.lsb_weight
        / ((1u64 << scale.oversample_bits) as f64 * sensitivity as f64)
}

/// Deadband in oversampled counts for a threshold in volts.
///
/// Formula: `volts * 1e9 / lsb_weight * 2^oversample_bits`, truncated.
pub fn deadband_counts(volts: f32, lsb_weight: f64, oversample_bits: u32) -> i32 {
    (volts as f64 * NANOVOLTS_PER_VOLT / lsb_weight * (1u64 << oversample_bits) as f64) as i32
}
