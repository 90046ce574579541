//! Software model of an accumulator channel.
//!
//! Lets the driver run end to end without hardware: in unit tests, and on a
//! host with the `sim` feature. Time is a shared [`SimClock`] that only moves
//! when a [`SimDelay`] is asked to wait, so a 5 s calibration window costs
//! nothing.
//!
//! # Model
//!
//! [`SimChannel`] converts at the programmed sample rate. Each conversion
//! asks its [`Signal`] for a raw count. Every `2^(average_bits +
//! oversample_bits)` conversions form a window; the window sum shifted right
//! by `average_bits` is the new average value and is integrated as
//! `value - center`. An update closer to the center than the deadband still
//! counts as a sample but adds nothing.
//!
//! Conversions are evaluated lazily, whenever the channel is touched, up to
//! the current clock time.
//!
//! ```ignore
//! let clock = SimClock::new(0);
//! let channel = SimChannel::new(&clock, 0, Stationary::new(2048, 3));
//! let mut gyro = AnalogGyro::new(channel, SimDelay::new(&clock));
//! ```

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

use crate::channel::{AccumulatorChannel, AccumulatorOutput, ChannelProvider};

/// Channels `0..ACCUMULATOR_CHANNELS` have an accumulator.
pub const ACCUMULATOR_CHANNELS: u32 = 2;

/// Number of analog inputs a [`SimProvider`] can open.
pub const ANALOG_INPUTS: u32 = 8;

/// 5 V across a 12-bit converter, in nanovolts per count.
pub const DEFAULT_LSB_WEIGHT: f64 = 1_220_703.0;

const NANOS_PER_SECOND: f64 = 1e9;

/// Simulated time in nanoseconds.
pub type SimClock = Cell<u64>;

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

/// Delay that advances a [`SimClock`] instead of sleeping.
#[derive(Debug, Clone, Copy)]
pub struct SimDelay<'a> {
    clock: &'a SimClock,
}

impl<'a> SimDelay<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self { clock }
    }

    fn advance(&mut self, ns: u64) {
        self.clock.set(self.clock.get() + ns);
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(us as u64 * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms as u64 * 1_000_000);
    }
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// Source of raw conversions for a [`SimChannel`].
pub trait Signal {
    /// Raw count for the conversion taken at `t_ns`.
    fn sample(&mut self, t_ns: u64) -> i32;
}

impl<F> Signal for F
where
    F: FnMut(u64) -> i32,
{
    fn sample(&mut self, t_ns: u64) -> i32 {
        self(t_ns)
    }
}

/// A gyro at rest: a fixed level with alternating `±noise`.
///
/// Any even number of consecutive conversions sums to exactly
/// `n * level`.
#[derive(Debug, Clone, Copy)]
pub struct Stationary {
    level: i32,
    noise: i32,
    high: bool,
}

impl Stationary {
    pub fn new(level: i32, noise: i32) -> Self {
        Self {
            level,
            noise,
            high: true,
        }
    }
}

impl Signal for Stationary {
    fn sample(&mut self, _t_ns: u64) -> i32 {
        self.high = !self.high;
        if self.high {
            self.level - self.noise
        } else {
            self.level + self.noise
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Simulated accumulator channel driven by a [`SimClock`].
pub struct SimChannel<'a, S> {
    clock: &'a SimClock,
    signal: S,
    index: u32,
    accumulator: bool,
    lsb_weight: f64,
    average_bits: u32,
    oversample_bits: u32,
    sample_rate: f64,
    center: u32,
    deadband: i32,
    output: AccumulatorOutput,
    average: f64,
    /// Clock time the current sample rate took effect.
    epoch_ns: u64,
    /// Conversions taken since `epoch_ns`.
    conversions: u64,
    window_sum: i64,
    window_fill: u64,
}

impl<'a, S: Signal> SimChannel<'a, S> {
    /// Channel `index`; only the first [`ACCUMULATOR_CHANNELS`] accumulate.
    ///
    /// No conversions happen until a sample rate is programmed.
    pub fn new(clock: &'a SimClock, index: u32, signal: S) -> Self {
        Self {
            clock,
            signal,
            index,
            accumulator: index < ACCUMULATOR_CHANNELS,
            lsb_weight: DEFAULT_LSB_WEIGHT,
            average_bits: 0,
            oversample_bits: 0,
            sample_rate: 0.0,
            center: 0,
            deadband: 0,
            output: AccumulatorOutput::default(),
            average: 0.0,
            epoch_ns: clock.get(),
            conversions: 0,
            window_sum: 0,
            window_fill: 0,
        }
    }

    pub fn with_lsb_weight(mut self, nanovolts: f64) -> Self {
        self.lsb_weight = nanovolts;
        self
    }

    pub fn signal_mut(&mut self) -> &mut S {
        &mut self.signal
    }

    pub fn center(&self) -> u32 {
        self.center
    }

    pub fn deadband(&self) -> i32 {
        self.deadband
    }

    fn window_len(&self) -> u64 {
        1u64 << (self.average_bits + self.oversample_bits)
    }

    /// Take every conversion due up to the current clock time.
    fn sync(&mut self) {
        if self.sample_rate <= 0.0 {
            return;
        }

        let elapsed = self.clock.get().saturating_sub(self.epoch_ns);
        let due = (elapsed as f64 * self.sample_rate / NANOS_PER_SECOND) as u64;

        while self.conversions < due {
            let offset_ns = self.conversions as f64 * NANOS_PER_SECOND / self.sample_rate;
            let raw = self.signal.sample(self.epoch_ns + offset_ns as u64);
            self.conversions += 1;

            self.window_sum += raw as i64;
            self.window_fill += 1;
            if self.window_fill == self.window_len() {
                let value = self.window_sum >> self.average_bits;
                self.window_sum = 0;
                self.window_fill = 0;
                self.integrate(value);
            }
        }
    }

    fn integrate(&mut self, value: i64) {
        self.average = value as f64;

        let delta = value - self.center as i64;
        if delta.unsigned_abs() >= self.deadband.max(0) as u64 {
            self.output.value += delta;
        }
        self.output.count = self.output.count.wrapping_add(1);
    }

    /// Drop a partly filled window after the window geometry changes.
    fn restart_window(&mut self) {
        self.window_sum = 0;
        self.window_fill = 0;
    }
}

impl<S: Signal> AccumulatorChannel for SimChannel<'_, S> {
    fn is_accumulator_channel(&self) -> bool {
        self.accumulator
    }

    fn set_average_bits(&mut self, bits: u32) {
        self.sync();
        self.average_bits = bits;
        self.restart_window();
    }

    fn set_oversample_bits(&mut self, bits: u32) {
        self.sync();
        self.oversample_bits = bits;
        self.restart_window();
    }

    fn set_sample_rate(&mut self, samples_per_second: f64) {
        self.sync();
        self.sample_rate = samples_per_second;
        self.epoch_ns = self.clock.get();
        self.conversions = 0;
        self.restart_window();
    }

    fn init_accumulator(&mut self) {
        self.sync();
        self.center = 0;
        self.output = AccumulatorOutput::default();
    }

    fn reset_accumulator(&mut self) {
        self.sync();
        self.output = AccumulatorOutput::default();
    }

    fn set_accumulator_center(&mut self, center: u32) {
        self.sync();
        self.center = center;
    }

    fn set_accumulator_deadband(&mut self, deadband: i32) {
        self.sync();
        self.deadband = deadband;
    }

    fn accumulator_output(&mut self) -> AccumulatorOutput {
        self.sync();
        self.output
    }

    fn average_value(&mut self) -> f64 {
        self.sync();
        self.average
    }

    fn lsb_weight(&self) -> f64 {
        self.lsb_weight
    }

    fn average_bits(&self) -> u32 {
        self.average_bits
    }

    fn oversample_bits(&self) -> u32 {
        self.oversample_bits
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn channel(&self) -> u32 {
        self.index
    }
}

/// Opens [`SimChannel`]s on a shared clock, each with a copy of one signal.
pub struct SimProvider<'a, S> {
    clock: &'a SimClock,
    signal: S,
}

impl<'a, S: Signal + Clone> SimProvider<'a, S> {
    pub fn new(clock: &'a SimClock, signal: S) -> Self {
        Self { clock, signal }
    }
}

impl<'a, S: Signal + Clone> ChannelProvider for SimProvider<'a, S> {
    type Channel = SimChannel<'a, S>;

    fn open(&mut self, index: u32) -> Option<Self::Channel> {
        if index >= ANALOG_INPUTS {
            return None;
        }
        Some(SimChannel::new(self.clock, index, self.signal.clone()))
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
