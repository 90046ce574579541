//! High-level analog gyro.
//!
//! [`AnalogGyro`] validates and programs an [`AccumulatorChannel`], measures
//! the stationary bias, and converts the accumulator into a heading and a
//! rate on demand. Nothing runs in the background: every reading is taken
//! on the caller's thread when a method is called.

use embedded_hal::delay::DelayNs;

use crate::calibration::{self, GyroBias};
use crate::channel::{AccumulatorChannel, ChannelProvider};
use crate::config::GyroConfig;
use crate::constants::{DEFAULT_VOLTS_PER_DEGREE_PER_SECOND, SENSOR_NAME};
use crate::conversion::{angle_degrees, deadband_counts, rate_degrees_per_second, ChannelScale};
use crate::diagnostics::{Diagnostics, NoDiagnostics};
use crate::error::GyroError;
use crate::source::{Gyro, PidSource, PidSourceType};

/// Single-axis rate gyro read through an accumulator channel.
///
/// `C` is the channel: move one in to give the gyro ownership, or pass
/// `&mut channel` to share it. `D` is the blocking delay used for the
/// calibration window and the post-configuration settle wait.
///
/// # Failure model
///
/// The first fatal [`GyroError`] is latched and the channel is released.
/// From then on every operation is a no-op: [`angle`](Self::angle) and
/// [`rate`](Self::rate) return `0.0` so a control loop keeps running.
/// Callers that want to know can check [`status`](Self::status) or use
/// [`try_angle`](Self::try_angle) / [`try_rate`](Self::try_rate).
///
/// # Example
///
/// ```ignore
/// use analog_gyro::AnalogGyro;
///
/// // Owns the channel; blocks ~5 s while the robot sits still.
/// let mut gyro = AnalogGyro::open(&mut analog_inputs, 0, delay);
///
/// loop {
///     let heading = gyro.angle();
///     let turn_rate = gyro.rate();
///     // ...
/// }
/// ```
pub struct AnalogGyro<C, D> {
    channel: Option<C>,
    delay: D,
    bias: GyroBias,
    sensitivity: f32,
    calibration_time_ms: u32,
    pid_source_type: PidSourceType,
    error: Option<GyroError>,
}

impl<C, D> AnalogGyro<C, D>
where
    C: AccumulatorChannel,
    D: DelayNs,
{
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Configure `channel` and calibrate against it.
    ///
    /// Blocks for the settle wait plus the calibration window; the gyro
    /// must be stationary.
    pub fn new(channel: C, delay: D) -> Self {
        Self::with_config(Some(channel), delay, GyroConfig::default(), NoDiagnostics)
    }

    /// Configure `channel` and install a previously measured bias.
    ///
    /// No calibration is run and nothing waits.
    pub fn with_bias(channel: C, delay: D, bias: GyroBias) -> Self {
        Self::with_config(Some(channel), delay, GyroConfig::with_bias(bias), NoDiagnostics)
    }

    /// Open channel `index` from `provider`, owned by the gyro, and calibrate.
    pub fn open<P>(provider: &mut P, index: u32, delay: D) -> Self
    where
        P: ChannelProvider<Channel = C>,
    {
        Self::with_config(provider.open(index), delay, GyroConfig::default(), NoDiagnostics)
    }

    /// Open channel `index` from `provider` with a preset bias.
    pub fn open_with_bias<P>(provider: &mut P, index: u32, delay: D, bias: GyroBias) -> Self
    where
        P: ChannelProvider<Channel = C>,
    {
        Self::with_config(provider.open(index), delay, GyroConfig::with_bias(bias), NoDiagnostics)
    }

    /// General constructor.
    ///
    /// `None` stands for a missing channel and yields a gyro latched on
    /// [`GyroError::NullChannel`].
    ///
    /// 1. Reject a missing or non-accumulator channel.
    /// 2. Program average/oversample bits and the derived sample rate.
    /// 3. Clear the deadband and announce the sensor to `diagnostics`.
    /// 4. Install `config.bias`, or wait `settle_time_ms` and calibrate.
    pub fn with_config(
        channel: Option<C>,
        delay: D,
        config: GyroConfig,
        mut diagnostics: impl Diagnostics,
    ) -> Self {
        let mut gyro = Self {
            channel,
            delay,
            bias: GyroBias::default(),
            sensitivity: DEFAULT_VOLTS_PER_DEGREE_PER_SECOND,
            calibration_time_ms: config.calibration_time_ms,
            pid_source_type: PidSourceType::Displacement,
            error: None,
        };

        if gyro.channel.is_none() {
            gyro.fail(GyroError::NullChannel);
            return gyro;
        }

        if gyro.set_sensitivity(config.sensitivity).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Ignoring configured sensitivity, using default");
        }

        if gyro.init(&config, &mut diagnostics).is_err() {
            return gyro;
        }

        match config.bias {
            Some(bias) => gyro.install_bias(bias),
            None => {
                gyro.delay.delay_ms(config.settle_time_ms);
                let _ = gyro.calibrate();
            }
        }

        gyro
    }

    /// Validate and program the channel.
    fn init(
        &mut self,
        config: &GyroConfig,
        diagnostics: &mut impl Diagnostics,
    ) -> Result<(), GyroError> {
        let (id, capable) = match self.channel.as_ref() {
            Some(channel) => (channel.channel(), channel.is_accumulator_channel()),
            None => return Err(GyroError::NullChannel),
        };

        if !capable {
            self.fail(GyroError::InvalidChannel(id));
            return Err(GyroError::InvalidChannel(id));
        }

        let channel = self.channel.as_mut().ok_or(GyroError::NullChannel)?;
        channel.set_average_bits(config.average_bits);
        channel.set_oversample_bits(config.oversample_bits);
        channel.set_sample_rate(config.sample_rate());

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Gyro channel {} configured: {} Hz, avg {} bits, oversample {} bits",
            id,
            config.sample_rate(),
            config.average_bits,
            config.oversample_bits
        );

        self.set_deadband(0.0)?;
        self.pid_source_type = PidSourceType::Displacement;

        diagnostics.report_usage(id);
        diagnostics.register_sensor(SENSOR_NAME, id);

        Ok(())
    }

    /// Latch a fatal error and release the channel.
    fn fail(&mut self, error: GyroError) {
        #[cfg(feature = "defmt")]
        defmt::error!("Gyro disabled: {}", error);

        self.error = Some(error);
        self.channel = None;
    }

    fn install_bias(&mut self, bias: GyroBias) {
        self.bias = bias;
        if let Some(channel) = self.channel.as_mut() {
            channel.set_accumulator_center(bias.center);
            channel.reset_accumulator();
        }
    }

    /// Channel, if no fatal error has been latched.
    fn usable(&mut self) -> Result<&mut C, GyroError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.channel.as_mut().ok_or(GyroError::NullChannel)
    }

    // -----------------------------------------------------------------------
    // Calibration and reset
    // -----------------------------------------------------------------------

    /// Measure the stationary bias again.
    ///
    /// Blocks for the calibration window. On success the new bias is stored,
    /// programmed into the channel, and the accumulator is cleared.
    ///
    /// # Errors
    /// * The latched error, if the gyro is already unusable
    /// * [`GyroError::NoCalibrationSamples`] if the window was empty; this
    ///   is fatal
    pub fn calibrate(&mut self) -> Result<GyroBias, GyroError> {
        let window_ms = self.calibration_time_ms;
        if let Some(error) = self.error {
            return Err(error);
        }
        let channel = self.channel.as_mut().ok_or(GyroError::NullChannel)?;

        match calibration::calibrate(channel, &mut self.delay, window_ms) {
            Ok(bias) => {
                #[cfg(feature = "defmt")]
                defmt::info!("Gyro calibrated: center={} offset={}", bias.center, bias.offset);

                self.bias = bias;
                Ok(bias)
            }
            Err(error) => {
                self.fail(error);
                Err(error)
            }
        }
    }

    /// Zero the heading.
    ///
    /// Clears the channel accumulator only; bias and sensitivity are kept.
    /// Does nothing if the gyro is unusable.
    pub fn reset(&mut self) {
        if let Ok(channel) = self.usable() {
            channel.reset_accumulator();
        }
    }

    // -----------------------------------------------------------------------
    // Readings
    // -----------------------------------------------------------------------

    /// Continuous heading in degrees, or `0.0` if the gyro is unusable.
    ///
    /// The heading is not wrapped: a second full turn reads 360 to 720.
    pub fn angle(&mut self) -> f32 {
        self.try_angle().unwrap_or(0.0)
    }

    /// Heading in degrees, reporting the latched error instead of `0.0`.
    pub fn try_angle(&mut self) -> Result<f32, GyroError> {
        let offset = self.bias.offset;
        let sensitivity = self.sensitivity;
        let channel = self.usable()?;

        let output = channel.accumulator_output();
        let scale = ChannelScale::of(&*channel);

        Ok(angle_degrees(output, offset, &scale, sensitivity))
    }

    /// Rotation rate in degrees per second, or `0.0` if the gyro is unusable.
    pub fn rate(&mut self) -> f64 {
        self.try_rate().unwrap_or(0.0)
    }

    /// Rotation rate, reporting the latched error instead of `0.0`.
    pub fn try_rate(&mut self) -> Result<f64, GyroError> {
        let bias = self.bias;
        let sensitivity = self.sensitivity;
        let channel = self.usable()?;

        let average = channel.average_value();
        let scale = ChannelScale::of(&*channel);

        Ok(rate_degrees_per_second(average, &bias, &scale, sensitivity))
    }

    // -----------------------------------------------------------------------
    // Tuning
    // -----------------------------------------------------------------------

    /// Ignore accumulator updates within `volts` of the center.
    ///
    /// A deadband cuts drift while stationary at the cost of losing slow
    /// rotation. The threshold is converted to oversampled counts with the
    /// channel's current LSB weight and oversample bits.
    ///
    /// # Errors
    /// * The latched error, if the gyro is unusable
    pub fn set_deadband(&mut self, volts: f32) -> Result<(), GyroError> {
        let channel = self.usable()?;
        let counts = deadband_counts(volts, channel.lsb_weight(), channel.oversample_bits());
        channel.set_accumulator_deadband(counts);
        Ok(())
    }

    /// Set the sensitivity in volts per degree/second, from the datasheet.
    ///
    /// Applies to every later reading, including heading already accumulated.
    ///
    /// # Errors
    /// * [`GyroError::InvalidSensitivity`] if `volts_per_degree_per_second`
    ///   is not finite and positive; the previous value is kept
    pub fn set_sensitivity(&mut self, volts_per_degree_per_second: f32) -> Result<(), GyroError> {
        if !(volts_per_degree_per_second.is_finite() && volts_per_degree_per_second > 0.0) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejected gyro sensitivity {}", volts_per_degree_per_second);
            return Err(GyroError::InvalidSensitivity);
        }
        self.sensitivity = volts_per_degree_per_second;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Fractional part of the bias. Store it to preset a later start-up.
    pub fn offset(&self) -> f32 {
        self.bias.offset
    }

    /// Whole-count part of the bias. Store it to preset a later start-up.
    pub fn center(&self) -> u32 {
        self.bias.center
    }

    pub fn bias(&self) -> GyroBias {
        self.bias
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// `true` until a fatal error is latched.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// `Err` with the latched fatal error, if any.
    pub fn status(&self) -> Result<(), GyroError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// The channel, or `None` once the gyro is unusable.
    pub fn channel(&self) -> Option<&C> {
        self.channel.as_ref()
    }

    /// Mutable access to the channel for platform-specific tuning.
    pub fn channel_mut(&mut self) -> Option<&mut C> {
        self.channel.as_mut()
    }

    pub fn channel_id(&self) -> Option<u32> {
        self.channel.as_ref().map(|channel| channel.channel())
    }

    /// Tear the gyro down and hand the channel back.
    pub fn release(self) -> Option<C> {
        self.channel
    }
}

impl<C, D> Gyro for AnalogGyro<C, D>
where
    C: AccumulatorChannel,
    D: DelayNs,
{
    fn calibrate(&mut self) {
        let _ = AnalogGyro::calibrate(self);
    }

    fn reset(&mut self) {
        AnalogGyro::reset(self)
    }

    fn angle(&mut self) -> f32 {
        AnalogGyro::angle(self)
    }

    fn rate(&mut self) -> f64 {
        AnalogGyro::rate(self)
    }
}

impl<C, D> PidSource for AnalogGyro<C, D>
where
    C: AccumulatorChannel,
    D: DelayNs,
{
    fn set_pid_source_type(&mut self, source_type: PidSourceType) {
        self.pid_source_type = source_type;
    }

    fn pid_source_type(&self) -> PidSourceType {
        self.pid_source_type
    }

    fn pid_get(&mut self) -> f64 {
        match self.pid_source_type {
            PidSourceType::Displacement => self.angle() as f64,
            PidSourceType::Rate => self.rate(),
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::AccumulatorOutput;

    /// Accumulator sum after a calibration window: 250 samples averaging
    /// 2_097_152.5 counts.
    const CALIBRATION_OUTPUT: AccumulatorOutput = AccumulatorOutput {
        value: 2_097_152 * 250 + 125,
        count: 250,
    };

    /// Channel fake that records what the gyro programs into it.
    ///
    /// `init_accumulator` loads `calibration_output`, standing in for a
    /// stationary window; `reset_accumulator` empties the accumulator.
    #[derive(Debug)]
    struct FakeChannel {
        index: u32,
        capable: bool,
        lsb_weight: f64,
        average_bits: u32,
        oversample_bits: u32,
        sample_rate: f64,
        center: u32,
        deadband: Option<i32>,
        output: AccumulatorOutput,
        calibration_output: AccumulatorOutput,
        average: f64,
        inits: u32,
        resets: u32,
    }

    impl FakeChannel {
        fn new(index: u32) -> Self {
            Self {
                index,
                capable: true,
                lsb_weight: 1_000.0,
                average_bits: 0,
                oversample_bits: 0,
                sample_rate: 0.0,
                center: 0,
                deadband: None,
                output: AccumulatorOutput::default(),
                calibration_output: CALIBRATION_OUTPUT,
                average: 0.0,
                inits: 0,
                resets: 0,
            }
        }

        fn not_accumulator(index: u32) -> Self {
            Self {
                capable: false,
                ..Self::new(index)
            }
        }
    }

    impl AccumulatorChannel for FakeChannel {
        fn is_accumulator_channel(&self) -> bool {
            self.capable
        }

        fn set_average_bits(&mut self, bits: u32) {
            self.average_bits = bits;
        }

        fn set_oversample_bits(&mut self, bits: u32) {
            self.oversample_bits = bits;
        }

        fn set_sample_rate(&mut self, samples_per_second: f64) {
            self.sample_rate = samples_per_second;
        }

        fn init_accumulator(&mut self) {
            self.inits += 1;
            self.center = 0;
            self.output = self.calibration_output;
        }

        fn reset_accumulator(&mut self) {
            self.resets += 1;
            self.output = AccumulatorOutput::default();
        }

        fn set_accumulator_center(&mut self, center: u32) {
            self.center = center;
        }

        fn set_accumulator_deadband(&mut self, deadband: i32) {
            self.deadband = Some(deadband);
        }

        fn accumulator_output(&mut self) -> AccumulatorOutput {
            self.output
        }

        fn average_value(&mut self) -> f64 {
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

    /// Delay that only adds up how long it was asked to wait.
    #[derive(Debug, Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }

        fn delay_us(&mut self, us: u32) {
            self.total_ns += us as u64 * 1_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ns += ms as u64 * 1_000_000;
        }
    }

    #[derive(Debug, Default)]
    struct RecordingDiagnostics {
        usage: Option<u32>,
        sensor: Option<(&'static str, u32)>,
        calls: u32,
    }

    impl Diagnostics for RecordingDiagnostics {
        fn report_usage(&mut self, channel: u32) {
            self.usage = Some(channel);
            self.calls += 1;
        }

        fn register_sensor(&mut self, name: &'static str, channel: u32) {
            self.sensor = Some((name, channel));
            self.calls += 1;
        }
    }

    /// Two accumulator channels, like the on-board inputs 0 and 1.
    struct FakeProvider;

    impl ChannelProvider for FakeProvider {
        type Channel = FakeChannel;

        fn open(&mut self, index: u32) -> Option<FakeChannel> {
            match index {
                0 | 1 => Some(FakeChannel::new(index)),
                2..=7 => Some(FakeChannel::not_accumulator(index)),
                _ => None,
            }
        }
    }

    fn calibrated() -> AnalogGyro<FakeChannel, CountingDelay> {
        AnalogGyro::new(FakeChannel::new(0), CountingDelay::default())
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn construction_programs_channel() {
        let gyro = calibrated();
        let channel = gyro.channel().unwrap();

        assert_eq!(channel.average_bits, 0);
        assert_eq!(channel.oversample_bits, 10);
        assert_eq!(channel.sample_rate, 51_200.0);
        assert_eq!(channel.deadband, Some(0));
        assert_eq!(gyro.sensitivity(), 0.007);
        assert_eq!(gyro.pid_source_type(), PidSourceType::Displacement);
    }

    #[test]
    fn construction_calibrates() {
        let gyro = calibrated();

        assert!(gyro.is_valid());
        assert_eq!(gyro.center(), 2_097_153);
        assert_eq!(gyro.offset(), -0.5);

        let channel = gyro.channel().unwrap();
        assert_eq!(channel.inits, 1);
        assert_eq!(channel.center, 2_097_153);
        assert_eq!(channel.output, AccumulatorOutput::default());
    }

    #[test]
    fn calibration_waits_for_settle_and_window() {
        let gyro = calibrated();
        assert_eq!(gyro.delay.total_ns, 5_100_000_000);
    }

    #[test]
    fn preset_bias_skips_calibration_and_waits() {
        let gyro = AnalogGyro::with_bias(
            FakeChannel::new(0),
            CountingDelay::default(),
            GyroBias::new(100, 0.25),
        );

        assert!(gyro.is_valid());
        assert_eq!(gyro.offset(), 0.25);
        assert_eq!(gyro.center(), 100);
        assert_eq!(gyro.delay.total_ns, 0);

        let channel = gyro.channel().unwrap();
        assert_eq!(channel.inits, 0);
        assert_eq!(channel.center, 100);
        assert_eq!(channel.resets, 1);
    }

    #[test]
    fn null_channel_is_invalid_and_reads_zero() {
        let mut gyro = AnalogGyro::<FakeChannel, _>::with_config(
            None,
            CountingDelay::default(),
            GyroConfig::default(),
            NoDiagnostics,
        );

        assert!(!gyro.is_valid());
        assert_eq!(gyro.status(), Err(GyroError::NullChannel));
        assert_eq!(gyro.angle(), 0.0);
        assert_eq!(gyro.rate(), 0.0);
        gyro.reset();
        assert_eq!(gyro.set_deadband(0.1), Err(GyroError::NullChannel));
        assert_eq!(gyro.calibrate(), Err(GyroError::NullChannel));
        assert_eq!(gyro.delay.total_ns, 0);
    }

    #[test]
    fn non_accumulator_channel_is_cleared() {
        let mut gyro = AnalogGyro::new(FakeChannel::not_accumulator(3), CountingDelay::default());

        assert_eq!(gyro.status(), Err(GyroError::InvalidChannel(3)));
        assert!(gyro.channel().is_none());
        assert!(gyro.channel_id().is_none());
        assert_eq!(gyro.angle(), 0.0);
        assert_eq!(gyro.try_rate(), Err(GyroError::InvalidChannel(3)));
        assert_eq!(gyro.delay.total_ns, 0);
    }

    #[test]
    fn non_accumulator_channel_is_not_programmed() {
        let mut channel = FakeChannel::not_accumulator(2);
        {
            let gyro = AnalogGyro::new(&mut channel, CountingDelay::default());
            assert!(!gyro.is_valid());
        }
        assert_eq!(channel.oversample_bits, 0);
        assert_eq!(channel.deadband, None);
        assert_eq!(channel.inits, 0);
    }

    #[test]
    fn empty_calibration_window_is_fatal() {
        let mut channel = FakeChannel::new(1);
        channel.calibration_output = AccumulatorOutput { value: 0, count: 0 };

        let mut gyro = AnalogGyro::new(channel, CountingDelay::default());

        assert_eq!(gyro.status(), Err(GyroError::NoCalibrationSamples));
        assert!(gyro.channel().is_none());
        assert_eq!(gyro.angle(), 0.0);
        assert_eq!(gyro.rate(), 0.0);
    }

    #[test]
    fn diagnostics_announced_once() {
        let mut diagnostics = RecordingDiagnostics::default();
        let _gyro = AnalogGyro::with_config(
            Some(FakeChannel::new(1)),
            CountingDelay::default(),
            GyroConfig::default(),
            &mut diagnostics,
        );

        assert_eq!(diagnostics.calls, 2);
        assert_eq!(diagnostics.usage, Some(1));
        assert_eq!(diagnostics.sensor, Some(("AnalogGyro", 1)));
    }

    #[test]
    fn invalid_channel_is_not_announced() {
        let mut diagnostics = RecordingDiagnostics::default();
        let _gyro = AnalogGyro::with_config(
            Some(FakeChannel::not_accumulator(4)),
            CountingDelay::default(),
            GyroConfig::default(),
            &mut diagnostics,
        );
        assert_eq!(diagnostics.calls, 0);
    }

    #[test]
    fn configured_sensitivity_is_used() {
        let config = GyroConfig {
            sensitivity: 0.0125,
            ..GyroConfig::default()
        };
        let gyro = AnalogGyro::with_config(
            Some(FakeChannel::new(0)),
            CountingDelay::default(),
            config,
            NoDiagnostics,
        );
        assert_eq!(gyro.sensitivity(), 0.0125);
    }

    #[test]
    fn invalid_configured_sensitivity_falls_back_to_default() {
        let config = GyroConfig {
            sensitivity: -1.0,
            ..GyroConfig::default()
        };
        let gyro = AnalogGyro::with_config(
            Some(FakeChannel::new(0)),
            CountingDelay::default(),
            config,
            NoDiagnostics,
        );
        assert!(gyro.is_valid());
        assert_eq!(gyro.sensitivity(), 0.007);
    }

    // ── Ownership ────────────────────────────────────────────────────

    #[test]
    fn shared_channel_outlives_gyro() {
        let mut channel = FakeChannel::new(0);
        {
            let mut gyro = AnalogGyro::new(&mut channel, CountingDelay::default());
            assert!(gyro.is_valid());
            gyro.reset();
        }

        // Still usable, and still carrying what the gyro programmed.
        assert_eq!(channel.center, 2_097_153);
        assert_eq!(channel.oversample_bits, 10);
        channel.reset_accumulator();
        assert_eq!(channel.resets, 3);
    }

    #[test]
    fn release_returns_owned_channel() {
        let gyro = calibrated();
        let channel = gyro.release().unwrap();
        assert_eq!(channel.index, 0);
        assert_eq!(channel.center, 2_097_153);
    }

    #[test]
    fn open_from_provider() {
        let gyro = AnalogGyro::open(&mut FakeProvider, 1, CountingDelay::default());
        assert!(gyro.is_valid());
        assert_eq!(gyro.channel_id(), Some(1));
    }

    #[test]
    fn open_missing_index_is_null() {
        let gyro = AnalogGyro::open(&mut FakeProvider, 42, CountingDelay::default());
        assert_eq!(gyro.status(), Err(GyroError::NullChannel));
    }

    #[test]
    fn open_non_accumulator_index_is_invalid() {
        let gyro = AnalogGyro::open(&mut FakeProvider, 5, CountingDelay::default());
        assert_eq!(gyro.status(), Err(GyroError::InvalidChannel(5)));
    }

    #[test]
    fn open_with_bias_skips_calibration() {
        let gyro = AnalogGyro::open_with_bias(
            &mut FakeProvider,
            0,
            CountingDelay::default(),
            GyroBias::new(100, 0.25),
        );
        assert_eq!(gyro.bias(), GyroBias::new(100, 0.25));
        assert_eq!(gyro.channel().unwrap().inits, 0);
    }

    // ── Readings ─────────────────────────────────────────────────────

    #[test]
    fn angle_is_continuous_past_a_full_turn() {
        let mut gyro = AnalogGyro::with_bias(
            FakeChannel::new(0),
            CountingDelay::default(),
            GyroBias::new(0, 0.0),
        );

        // 720 deg = value * 1e-9 * 1000 / (51200 * 0.007)
        let value = (720.0f64 * 51_200.0 * 0.007f32 as f64 * 1e6) as i64;
        gyro.channel_mut().unwrap().output = AccumulatorOutput { value, count: 36_000 };

        let angle = gyro.angle();
        assert!((angle - 720.0).abs() < 1e-3, "angle = {}", angle);
    }

    #[test]
    fn angle_subtracts_offset_over_all_samples() {
        let mut gyro = AnalogGyro::with_bias(
            FakeChannel::new(0),
            CountingDelay::default(),
            GyroBias::new(100, 0.25),
        );
        gyro.channel_mut().unwrap().output = AccumulatorOutput { value: 250, count: 1_000 };

        assert_eq!(gyro.angle(), 0.0);
    }

    #[test]
    fn reset_zeroes_angle_and_keeps_bias() {
        let mut gyro = calibrated();
        gyro.set_sensitivity(0.005).unwrap();
        gyro.channel_mut().unwrap().output = AccumulatorOutput {
            value: 50_000_000,
            count: 500,
        };
        assert!(gyro.angle() != 0.0);

        gyro.reset();

        assert_eq!(gyro.angle(), 0.0);
        assert_eq!(gyro.center(), 2_097_153);
        assert_eq!(gyro.offset(), -0.5);
        assert_eq!(gyro.sensitivity(), 0.005);
    }

    #[test]
    fn rate_is_zero_at_bias() {
        let mut gyro = calibrated();
        gyro.channel_mut().unwrap().average = 2_097_152.5;
        assert_eq!(gyro.rate(), 0.0);
    }

    #[test]
    fn rate_follows_average_value() {
        let mut gyro = AnalogGyro::with_bias(
            FakeChannel::new(0),
            CountingDelay::default(),
            GyroBias::new(0, 0.0),
        );
        // 7 mV at 1 uV per count, 1024x oversampled: 1 deg/s.
        gyro.channel_mut().unwrap().average = 7_000.0 * 1024.0;
        let rate = gyro.rate();
        assert!((rate - 1.0).abs() < 1e-6, "rate = {}", rate);
    }

    // ── Tuning ───────────────────────────────────────────────────────

    #[test]
    fn deadband_passed_verbatim() {
        let mut gyro = calibrated();
        gyro.channel_mut().unwrap().oversample_bits = 2;

        gyro.set_deadband(0.5).unwrap();

        assert_eq!(gyro.channel().unwrap().deadband, Some(2_000_000));
    }

    #[test]
    fn sensitivity_rejects_nonsense() {
        let mut gyro = calibrated();
        assert_eq!(gyro.set_sensitivity(0.0), Err(GyroError::InvalidSensitivity));
        assert_eq!(gyro.set_sensitivity(-0.01), Err(GyroError::InvalidSensitivity));
        assert_eq!(gyro.set_sensitivity(f32::NAN), Err(GyroError::InvalidSensitivity));
        assert_eq!(gyro.set_sensitivity(f32::INFINITY), Err(GyroError::InvalidSensitivity));
        assert_eq!(gyro.sensitivity(), 0.007);
        assert!(gyro.is_valid());
    }

    #[test]
    fn sensitivity_scales_angle() {
        let mut gyro = calibrated();
        gyro.channel_mut().unwrap().output = AccumulatorOutput {
            value: 3_584_000,
            count: 100,
        };
        let before = gyro.angle();

        gyro.set_sensitivity(0.014).unwrap();

        let after = gyro.angle();
        assert!((after - before / 2.0).abs() < 1e-5, "{} vs {}", after, before);
    }

    #[test]
    fn recalibrate_replaces_bias() {
        let mut gyro = calibrated();
        gyro.channel_mut().unwrap().calibration_output = AccumulatorOutput {
            value: 4_000,
            count: 4,
        };

        let bias = gyro.calibrate().unwrap();

        assert_eq!(bias, GyroBias::new(1_000, 0.0));
        assert_eq!(gyro.bias(), bias);
        assert_eq!(gyro.channel().unwrap().center, 1_000);
        assert_eq!(gyro.delay.total_ns, 10_100_000_000);
    }

    // ── Traits ───────────────────────────────────────────────────────

    #[test]
    fn pid_get_follows_source_type() {
        let mut gyro = AnalogGyro::with_bias(
            FakeChannel::new(0),
            CountingDelay::default(),
            GyroBias::new(0, 0.0),
        );
        gyro.channel_mut().unwrap().average = 7_000.0 * 1024.0;
        gyro.channel_mut().unwrap().output = AccumulatorOutput {
            value: 358_400_000,
            count: 10,
        };

        assert!((gyro.pid_get() - 1.0).abs() < 1e-5);

        gyro.set_pid_source_type(PidSourceType::Rate);
        assert_eq!(gyro.pid_source_type(), PidSourceType::Rate);
        assert!((gyro.pid_get() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn gyro_trait_delegates() {
        fn heading(sensor: &mut impl Gyro) -> f32 {
            sensor.reset();
            sensor.angle()
        }

        let mut gyro = calibrated();
        gyro.channel_mut().unwrap().output = AccumulatorOutput {
            value: 1_000_000,
            count: 10,
        };
        assert_eq!(heading(&mut gyro), 0.0);
    }
}
