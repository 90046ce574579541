//! Heading sources for closed-loop control.

/// Which quantity a [`PidSource`] feeds to its controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PidSourceType {
    /// Integrated position (degrees for a gyro).
    #[default]
    Displacement,
    /// Rate of change (degrees per second for a gyro).
    Rate,
}

/// A sensor a PID loop can sample once per control cycle.
pub trait PidSource {
    fn set_pid_source_type(&mut self, source_type: PidSourceType);

    fn pid_source_type(&self) -> PidSourceType;

    /// Current process variable for the selected source type.
    fn pid_get(&mut self) -> f64;
}

/// Minimal heading-sensor interface.
///
/// Lets control code take any gyro without knowing its channel or delay
/// types.
pub trait Gyro {
    /// Re-measure the stationary bias. The sensor must be still.
    fn calibrate(&mut self);

    /// Zero the heading without recalibrating.
    fn reset(&mut self);

    /// Continuous heading in degrees.
    fn angle(&mut self) -> f32;

    /// Rotation rate in degrees per second.
    fn rate(&mut self) -> f64;
}
