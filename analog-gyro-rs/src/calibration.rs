//! Stationary bias calibration.
//!
//! The gyro must be at rest while [`calibrate`] runs. The accumulator is
//! cleared, left to integrate for the calibration window, and its mean is
//! split into a whole-count [`center`](GyroBias::center) that the channel
//! subtracts in hardware and a fractional [`offset`](GyroBias::offset) the
//! driver subtracts in software.

use embedded_hal::delay::DelayNs;

use crate::channel::{AccumulatorChannel, AccumulatorOutput};
use crate::error::GyroError;

/// Stationary bias of the accumulator: `mean = center + offset`.
///
/// Both halves can be read back after calibration and supplied as a preset
/// on the next start-up to skip the calibration window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GyroBias {
    /// Mean rounded half-up to a whole count.
    pub center: u32,
    /// Remainder `mean - center`, in `[-0.5, 0.5)`.
    pub offset: f32,
}

impl GyroBias {
    pub fn new(center: u32, offset: f32) -> Self {
        Self { center, offset }
    }

    /// Bias as a single value in oversampled counts.
    pub fn mean(&self) -> f64 {
        self.center as f64 + self.offset as f64
    }
}

/// Derive the bias from an accumulator read with center 0.
///
/// Rounding is half-up (`+0.5` then truncate), so a mean of exactly
/// `10.5` yields a center of `11`.
///
/// # Errors
/// * [`GyroError::NoCalibrationSamples`] if `output.count` is zero
pub fn bias_from_accumulator(output: AccumulatorOutput) -> Result<GyroBias, GyroError> {
    if output.count == 0 {
        return Err(GyroError::NoCalibrationSamples);
    }

    let mean = output.value as f64 / output.count as f64;
    let center = (mean + 0.5) as u32;
    let offset = (mean - center as f64) as f32;

    Ok(GyroBias { center, offset })
}

/// Run a full calibration pass on `channel`.
///
/// 1. Reinitialise the accumulator (center 0, sum 0).
/// 2. Block for `window_ms` while the stationary gyro is sampled.
/// 3. Compute the bias from the accumulated mean.
/// 4. Program the center and reset the accumulator so integration starts
///    from the corrected baseline.
///
/// On error the channel is left with its center at 0.
pub fn calibrate<C, D>(
    channel: &mut C,
    delay: &mut D,
    window_ms: u32,
) -> Result<GyroBias, GyroError>
where
    C: AccumulatorChannel,
    D: DelayNs,
{
    channel.init_accumulator();

    delay.delay_ms(window_ms);

    let output = channel.accumulator_output();
    let bias = bias_from_accumulator(output)?;

    channel.set_accumulator_center(bias.center);
    channel.reset_accumulator();

    Ok(bias)
}
