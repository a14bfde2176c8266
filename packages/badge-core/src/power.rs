//! Power Supervision
//!
//! Classifies the battery voltage into a [`PowerState`] and runs the brown out
//! handlers that take over the badge when the cells run low.
//!
//! # Brown out ratchet
//! Once a soft or hard brown out was observed, the supervisor keeps reporting that
//! level (or a worse one) even if the voltage recovers or the badge is plugged into
//! USB. Only [`PowerSupervisor::reset_power_state`] clears it.
//!
//! # Voltage conversion
//! ```text
//! V_BAT = raw * reference / adc_max * divider
//! ```

use moving_median::MovingMedian;

use crate::board::{Board, Radio};
use crate::led::{LedStrip, Region, BLACK, RED};

/// Samples taken per battery reading by [`MedianBatteryAdc`]
pub const BURST_SAMPLES: usize = 9;

/// Single conversions of the battery divider, `None` if one failed
pub trait BatterySampler {
    fn sample(&mut self) -> Option<u16>;
}

/// Median of a burst of conversions.
///
/// Every reading takes a full window of fresh samples, so it reflects the battery
/// now and not the readings of earlier checks. Failed conversions are skipped.
pub struct MedianBatteryAdc<S: BatterySampler> {
    sampler: S,
}

impl<S: BatterySampler> MedianBatteryAdc<S> {
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }
}

impl<S: BatterySampler> BatteryAdc for MedianBatteryAdc<S> {
    fn read_raw_battery(&mut self) -> u16 {
        let mut median_filter = MovingMedian::<f32, BURST_SAMPLES>::new();
        let mut samples = 0;
        for _ in 0..BURST_SAMPLES {
            if let Some(raw) = self.sampler.sample() {
                median_filter.add_value(f32::from(raw));
                samples += 1;
            }
        }
        if samples == 0 {
            warn!("power: no battery sample in burst");
            return 0;
        }
        libm::roundf(median_filter.median()) as u16
    }
}

/// Source of raw battery voltage samples
pub trait BatteryAdc {
    /// Raw sample of the battery voltage divider
    fn read_raw_battery(&mut self) -> u16;
}

/// Power state of the badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Not evaluated yet
    Unknown,
    /// Powered through USB, no batteries inserted
    Usb,
    /// Running from batteries with enough charge
    BatteryNormal,
    /// Battery is empty, the badge only signals the condition
    SoftBrownout,
    /// Battery is too low to operate safely, only a reset recovers
    HardBrownout,
}

/// Battery and ADC parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerConfig {
    /// ADC reference voltage
    pub reference_voltage: f32,
    /// Largest raw ADC value
    pub adc_max: f32,
    /// Ratio of the voltage divider in front of the ADC
    pub divider_ratio: f32,
    /// Number of cells in series
    pub cell_count: u8,
    /// Cell voltage considered empty
    pub cell_empty_voltage: f32,
    /// Battery voltage at or below which the badge must stop
    pub hard_brownout_voltage: f32,
}

impl PowerConfig {
    /// Battery voltage considered empty, also the soft brown out threshold
    pub fn empty_voltage(&self) -> f32 {
        self.cell_empty_voltage * f32::from(self.cell_count)
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            // the ADC reads slightly high across boards, 3.41 V matches better than 3.3 V
            reference_voltage: 3.41,
            adc_max: 4095.0,
            // R11 = 51.1k, R12 = 100k
            divider_ratio: (51.1 + 100.0) / 100.0,
            cell_count: 3,
            cell_empty_voltage: 1.16,
            hard_brownout_voltage: 3.35,
        }
    }
}

/// Tracks the power state of the badge
pub struct PowerSupervisor<A: BatteryAdc> {
    adc: A,
    config: PowerConfig,
    state: PowerState,
}

impl<A: BatteryAdc> PowerSupervisor<A> {
    pub fn new(adc: A) -> Self {
        Self::with_config(adc, PowerConfig::default())
    }

    pub fn with_config(adc: A, config: PowerConfig) -> Self {
        Self {
            adc,
            config,
            state: PowerState::Unknown,
        }
    }

    pub fn config(&self) -> &PowerConfig {
        &self.config
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// Current battery voltage in volts
    pub fn battery_voltage(&mut self) -> f32 {
        let raw = f32::from(self.adc.read_raw_battery());
        raw * (self.config.reference_voltage / self.config.adc_max) * self.config.divider_ratio
    }

    /// Whether the badge runs from batteries rather than USB
    pub fn is_battery_powered(&mut self) -> bool {
        self.battery_voltage() > self.config.empty_voltage() - 0.5
    }

    /// Approximate remaining capacity in percent.
    ///
    /// Cubic fit of an alkaline AA discharge curve per cell (1.60 V full, 1.16 V
    /// empty), clamped to 0..=100.
    pub fn battery_capacity_percent(&mut self) -> u8 {
        capacity_percent(self.battery_voltage(), self.config.cell_count)
    }

    /// Last evaluated state, without sampling
    pub fn power_state(&self) -> PowerState {
        self.state
    }

    /// Samples the battery, classifies it and applies the brown out ratchet
    pub fn update_power_state(&mut self) -> PowerState {
        let voltage = self.battery_voltage();
        let battery_powered = voltage > self.config.empty_voltage() - 0.5;

        let next = if voltage <= self.config.hard_brownout_voltage && battery_powered {
            PowerState::HardBrownout
        } else if voltage <= self.config.empty_voltage() && battery_powered {
            PowerState::SoftBrownout
        } else if battery_powered {
            PowerState::BatteryNormal
        } else {
            PowerState::Usb
        };

        let ratcheted = match (self.state, next) {
            (PowerState::HardBrownout, _) => PowerState::HardBrownout,
            (PowerState::SoftBrownout, PowerState::HardBrownout) => PowerState::HardBrownout,
            (PowerState::SoftBrownout, _) => PowerState::SoftBrownout,
            (_, next) => next,
        };

        if ratcheted != self.state {
            debug!("power: state {:?} -> {:?} at {} mV", self.state, ratcheted, (voltage * 1000.0) as u32);
        }
        self.state = ratcheted;
        self.state
    }

    /// Forgets any brown out and evaluates the state from scratch
    pub fn reset_power_state(&mut self) -> PowerState {
        self.state = PowerState::Unknown;
        self.update_power_state()
    }
}

/// Maps a battery voltage to a remaining capacity in percent
pub fn capacity_percent(voltage: f32, cell_count: u8) -> u8 {
    let cell = voltage / f32::from(cell_count.max(1));
    let percent = (14.9679 * libm::powf(cell, 3.0) - 68.9823 * libm::powf(cell, 2.0) + 106.4289 * cell - 54.0063) * 100.0;
    libm::roundf(percent).clamp(0.0, 100.0) as u8
}

/// Puts the LEDs into the hard brown out signal and shuts the radio down
pub fn enter_hard_brownout<B: Board>(board: &mut B) {
    board.radio().disable();
    let leds = board.leds();
    leds.set_brightness_percent(20);
    leds.clear();
    leds.set_region(Region::DragonNose, RED);
}

/// One short red flash of the nose followed by a long pause
pub fn hard_brownout_cycle<B: Board>(board: &mut B) {
    board.leds().set_power(true);
    board.leds().set_region(Region::DragonNose, RED);
    board.delay_ms(80);
    board.leds().set_power(false);
    board.delay_ms(4_000);
}

/// Holds the badge in hard brown out. Only a reset leaves this.
pub fn hard_brownout_hold<B: Board>(board: &mut B) -> ! {
    error!("power: hard brown out, halting until reset");
    enter_hard_brownout(board);
    loop {
        hard_brownout_cycle(board);
    }
}

/// Clears the LEDs for the soft brown out signal and shuts the radio down
pub fn enter_soft_brownout<B: Board>(board: &mut B) {
    board.radio().disable();
    let leds = board.leds();
    leds.clear();
    leds.set_power(true);
    leds.set_brightness_percent(50);
}

/// Number of nose blinks between two battery checks in soft brown out
pub const SOFT_BROWNOUT_BLINKS: u8 = 30;

/// One round of the soft brown out signal.
///
/// Checks for escalation first and returns the resulting state. Blinks only when the
/// badge is still in soft brown out.
pub fn soft_brownout_cycle<B: Board, A: BatteryAdc>(board: &mut B, supervisor: &mut PowerSupervisor<A>) -> PowerState {
    let state = supervisor.update_power_state();
    if state == PowerState::HardBrownout {
        return state;
    }

    for _ in 0..SOFT_BROWNOUT_BLINKS {
        board.leds().set_power(true);
        board.leds().set_region(Region::DragonNose, RED);
        board.delay_ms(200);
        board.leds().set_region(Region::DragonNose, BLACK);
        board.leds().set_power(false);
        board.delay_ms(800);
    }

    let voltage = supervisor.battery_voltage();
    info!(
        "power: battery at {} mV ({}%)",
        (voltage * 1000.0) as u32,
        capacity_percent(voltage, supervisor.config().cell_count)
    );
    state
}

/// Holds the badge in soft brown out, escalating to hard brown out if the voltage
/// keeps dropping. Only a reset leaves this.
pub fn soft_brownout_hold<B: Board, A: BatteryAdc>(board: &mut B, supervisor: &mut PowerSupervisor<A>) -> ! {
    warn!("power: soft brown out, showing warning until reset");
    enter_soft_brownout(board);
    loop {
        if soft_brownout_cycle(board, supervisor) == PowerState::HardBrownout {
            hard_brownout_hold(board);
        }
    }
}
