//! Start-up hooks for usage reporting and sensor registration.
//!
//! The gyro calls both hooks exactly once, after the channel has been
//! validated and configured. Nothing the hooks do affects the readings.

/// Sink for the gyro's start-up announcements.
///
/// Both methods default to doing nothing, so an implementation only
/// overrides the side it cares about.
pub trait Diagnostics {
    /// Record that a gyro is in use on `channel`.
    fn report_usage(&mut self, _channel: u32) {}

    /// Make the sensor visible to a dashboard or test harness.
    fn register_sensor(&mut self, _name: &'static str, _channel: u32) {}
}

/// Diagnostics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {}

impl<T: Diagnostics + ?Sized> Diagnostics for &mut T {
    fn report_usage(&mut self, channel: u32) {
        T::report_usage(self, channel)
    }

    fn register_sensor(&mut self, name: &'static str, channel: u32) {
        T::register_sensor(self, name, channel)
    }
}
