//! Error types for the analog gyro driver.

use core::fmt;

/// Errors reported by [`AnalogGyro`](crate::AnalogGyro).
///
/// Every variant except [`InvalidSensitivity`](GyroError::InvalidSensitivity)
/// is fatal: once latched, the gyro stops touching its channel and all reads
/// return zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroError {
    /// No channel was supplied, or the provider could not open the index.
    NullChannel,

    /// The channel exists but cannot accumulate samples.
    InvalidChannel(u32),

    /// The calibration window finished without a single accumulated sample.
    NoCalibrationSamples,

    /// Sensitivity must be finite and strictly positive.
    InvalidSensitivity,
}

impl GyroError {
    /// Returns `true` if this error leaves the gyro permanently unusable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GyroError::InvalidSensitivity)
    }
}

impl fmt::Display for GyroError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GyroError::NullChannel => write!(f, "No analog channel"),
            GyroError::InvalidChannel(channel) => {
                write!(f, "Channel {} is not an accumulator channel", channel)
            }
            GyroError::NoCalibrationSamples => {
                write!(f, "Calibration window produced no samples")
            }
            GyroError::InvalidSensitivity => {
                write!(f, "Sensitivity must be finite and positive")
            }
        }
    }
}
