//! Calibrated heading and rate for a single-axis analog rate gyro.
//!
//! The gyro's output voltage is sampled by an analog channel with a
//! hardware accumulator. This crate programs that channel, measures the
//! stationary bias, and turns the accumulator into a continuous heading
//! (degrees) and an instantaneous rate (degrees per second).
//!
//! # Architecture
//!
//! - **[`channel`]**: the [`AccumulatorChannel`] contract the driver
//!   consumes, and [`ChannelProvider`] for opening channels by index.
//! - **[`calibration`]**: stationary bias estimation into a
//!   [`GyroBias`] (`center` + `offset`).
//! - **[`conversion`]**: pure count → degrees / degrees-per-second /
//!   deadband arithmetic.
//! - **[`AnalogGyro`]**: the public driver tying the three together.
//!
//! Waits (the 5 s calibration window and a short settle) go through an
//! injected [`embedded_hal::delay::DelayNs`].
//!
//! # Quick start
//!
//! ```ignore
//! use analog_gyro::AnalogGyro;
//!
//! // Robot must be still while this runs.
//! let mut gyro = AnalogGyro::new(analog_input, delay);
//!
//! let heading = gyro.angle();   // 0.0 if the gyro could not start
//! let rate = gyro.rate();
//!
//! // Persist for next boot to skip calibration.
//! let bias = gyro.bias();
//! ```
//!
//! # Features
//!
//! - **`defmt`**: structured logging and [`defmt::Format`] on public types.
//! - **`sim`**: [`sim`] module with a software accumulator channel and a
//!   zero-cost delay for host-side runs.

#![cfg_attr(not(test), no_std)]

pub mod calibration;
pub mod channel;
pub mod config;
pub mod constants;
pub mod conversion;
pub mod diagnostics;
pub mod error;
mod gyro;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
mod source;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use calibration::GyroBias;
pub use channel::{AccumulatorChannel, AccumulatorOutput, ChannelProvider};
pub use config::GyroConfig;
pub use diagnostics::{Diagnostics, NoDiagnostics};
pub use error::GyroError;
pub use gyro::AnalogGyro;
pub use source::{Gyro, PidSource, PidSourceType};
