//! Default channel configuration and physical constants for the analog gyro.
//!
//! The accumulator channel oversamples and averages raw conversions before
//! they are integrated. The raw conversion rate is derived from the base
//! rate and the two bit counts:
//! `SAMPLES_PER_SECOND * 2^(AVERAGE_BITS + OVERSAMPLE_BITS)`.

// ---------------------------------------------------------------------------
// Channel configuration
// ---------------------------------------------------------------------------

/// Oversample bits programmed into the channel during initialisation.
pub const OVERSAMPLE_BITS: u32 = 10;

/// Average bits programmed into the channel during initialisation.
pub const AVERAGE_BITS: u32 = 0;

/// Rate at which fully oversampled/averaged values reach the accumulator.
pub const SAMPLES_PER_SECOND: f64 = 50.0;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Length of the stationary window sampled during calibration.
pub const CALIBRATION_SAMPLE_TIME_MS: u32 = 5_000;

/// Wait after reprogramming the sample rate before trusting the channel.
pub const SETTLE_TIME_MS: u32 = 100;

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// Datasheet sensitivity in volts per degree/second.
pub const DEFAULT_VOLTS_PER_DEGREE_PER_SECOND: f32 = 0.007;

/// Nanovolts per volt. Channel LSB weights are reported in nanovolts.
pub const NANOVOLTS_PER_VOLT: f64 = 1e9;

/// Name the gyro registers itself under with the diagnostics sink.
pub const SENSOR_NAME: &str = "AnalogGyro";
