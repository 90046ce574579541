//! The accumulating analog channel the gyro consumes.
//!
//! The driver never samples hardware itself. It programs and reads a channel
//! through [`AccumulatorChannel`], and opens channels by index through a
//! [`ChannelProvider`]. A platform crate implements both; the `sim` feature
//! provides a software model.
//!
//! # Ownership
//!
//! A channel moved into the gyro is owned by it and dropped with it. To share
//! a channel, pass `&mut channel`: the blanket impl below forwards every call,
//! and the caller keeps the channel once the gyro is gone.

/// Accumulator contents: running sum and number of samples summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccumulatorOutput {
    /// Sum of `(value - center)` over every integrated sample.
    pub value: i64,
    /// Number of samples integrated since the last reset.
    pub count: u32,
}

/// An analog input with a hardware (or modelled) accumulator.
pub trait AccumulatorChannel {
    /// Whether this channel has an accumulator at all.
    fn is_accumulator_channel(&self) -> bool;

    fn set_average_bits(&mut self, bits: u32);
    fn set_oversample_bits(&mut self, bits: u32);

    /// Raw conversion rate in samples per second.
    fn set_sample_rate(&mut self, samples_per_second: f64);

    /// Clear the accumulator and its center back to zero.
    fn init_accumulator(&mut self);

    /// Clear the accumulator, keeping center and deadband.
    fn reset_accumulator(&mut self);

    fn set_accumulator_center(&mut self, center: u32);

    /// Samples closer than `deadband` counts to the center are not integrated.
    fn set_accumulator_deadband(&mut self, deadband: i32);

    fn accumulator_output(&mut self) -> AccumulatorOutput;

    /// Latest oversampled/averaged value, in oversampled counts.
    fn average_value(&mut self) -> f64;

    /// Nanovolts represented by one raw count.
    fn lsb_weight(&self) -> f64;

    fn average_bits(&self) -> u32;
    fn oversample_bits(&self) -> u32;
    fn sample_rate(&self) -> f64;

    /// Channel number, used for diagnostics.
    fn channel(&self) -> u32;
}

impl<T> AccumulatorChannel for &mut T
where
    T: AccumulatorChannel + ?Sized,
{
    fn is_accumulator_channel(&self) -> bool {
        T::is_accumulator_channel(self)
    }

    fn set_average_bits(&mut self, bits: u32) {
        T::set_average_bits(self, bits)
    }

    fn set_oversample_bits(&mut self, bits: u32) {
        T::set_oversample_bits(self, bits)
    }

    fn set_sample_rate(&mut self, samples_per_second: f64) {
        T::set_sample_rate(self, samples_per_second)
    }

    fn init_accumulator(&mut self) {
        T::init_accumulator(self)
    }

    fn reset_accumulator(&mut self) {
        T::reset_accumulator(self)
    }

    fn set_accumulator_center(&mut self, center: u32) {
        T::set_accumulator_center(self, center)
    }

    fn set_accumulator_deadband(&mut self, deadband: i32) {
        T::set_accumulator_deadband(self, deadband)
    }

    fn accumulator_output(&mut self) -> AccumulatorOutput {
        T::accumulator_output(self)
    }

    fn average_value(&mut self) -> f64 {
        T::average_value(self)
    }

    fn lsb_weight(&self) -> f64 {
        T::lsb_weight(self)
    }

    fn average_bits(&self) -> u32 {
        T::average_bits(self)
    }

    fn oversample_bits(&self) -> u32 {
        T::oversample_bits(self)
    }

    fn sample_rate(&self) -> f64 {
        T::sample_rate(self)
    }

    fn channel(&self) -> u32 {
        T::channel(self)
    }
}

/// Opens channels by raw index for the owning constructors.
pub trait ChannelProvider {
    type Channel: AccumulatorChannel;

    /// Returns `None` if no channel exists at `index`.
    fn open(&mut self, index: u32) -> Option<Self::Channel>;
}
