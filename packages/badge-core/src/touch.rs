//! Touch Classification
//!
//! Turns raw readings of the two capacitive touch pads into gestures.
//!
//! # Detection
//! Each pad is calibrated once at boot: the noise floor is the maximum of a number of
//! raw samples taken while nobody touches the badge. A pad counts as touched when its
//! reading is strictly above `noise floor + detection step`.
//!
//! # Gestures
//! - Rising flank: touch timestamp is recorded, `Touch` fires
//! - Falling flank: release timestamp is recorded, then
//!   - `Shortpress` fires if the pad was held for at least the short press duration
//!   - `Longpress` additionally fires if it was held for at least the long press duration
//!   - `Release` fires last
//!
//! A short or long press on one pad also fires the matching gesture on the combined
//! `All` zone when the other pad is still touched (or was released within the
//! coincidence window), was itself held long enough, and the combined gesture did not
//! fire within the cooldown. The cooldown timestamp is the only de-duplication: two
//! pads released in the same burst may both pass the check before either writes it.
//!
//! Callbacks run in interrupt context and must only record the gesture.

use crate::board::Millis;

/// Raw reading of a touch pad
pub type TouchValue = u32;

/// Callback fired for a classified gesture
pub type TouchCallback = fn();

/// Gestures fired by one flank, in firing order
pub type FiredGestures = heapless::Vec<(TouchZone, Gesture), 10>;

/// Touch zones on the badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchZone {
    /// The fingerprint pad on the bottom of the badge
    Fingerprint,
    /// The dragon nose pad
    Nose,
    /// Virtual zone for gestures on both pads at once
    All,
}

impl TouchZone {
    /// Index of a physical pad, `None` for the combined zone
    const fn pad(self) -> Option<usize> {
        match self {
            TouchZone::Fingerprint => Some(0),
            TouchZone::Nose => Some(1),
            TouchZone::All => None,
        }
    }

    /// The other physical pad
    const fn other(self) -> TouchZone {
        match self {
            TouchZone::Fingerprint => TouchZone::Nose,
            TouchZone::Nose | TouchZone::All => TouchZone::Fingerprint,
        }
    }
}

/// What happened on a touch zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    Touch,
    Release,
    Shortpress,
    Longpress,
}

impl Gesture {
    const fn index(self) -> usize {
        match self {
            Gesture::Touch => 0,
            Gesture::Release => 1,
            Gesture::Shortpress => 2,
            Gesture::Longpress => 3,
        }
    }
}

/// Source of raw pad readings
pub trait TouchSensor {
    /// Reads the raw value of a physical pad. Higher values mean more capacitance.
    ///
    /// Only called with [`TouchZone::Fingerprint`] or [`TouchZone::Nose`].
    fn read_raw(&mut self, zone: TouchZone) -> TouchValue;
}

/// Thresholds and timings of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchConfig {
    /// Amount a reading must rise above the noise floor to count as a touch
    pub detection_step: TouchValue,
    /// Samples taken per pad during calibration
    pub calibration_samples: u8,
    /// Minimum hold time for a short press
    pub shortpress_ms: Millis,
    /// Minimum hold time for a long press
    pub longpress_ms: Millis,
    /// How long after its release the other pad still counts for a combined gesture
    pub coincidence_window_ms: Millis,
    /// Minimum time between two combined gestures of the same kind
    pub multitouch_cooldown_ms: Millis,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            detection_step: 10_000,
            calibration_samples: 10,
            shortpress_ms: 450,
            longpress_ms: 3_000,
            coincidence_window_ms: 1_000,
            multitouch_cooldown_ms: 1_000,
        }
    }
}

/// Calibration and timing state of one physical pad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchChannel {
    pub noise_floor: TouchValue,
    pub last_touch_ms: Option<Millis>,
    pub last_release_ms: Option<Millis>,
    /// Whether flanks on this pad are handled
    pub interrupts_enabled: bool,
    /// Touch state seen by the last poll
    touched: bool,
}

/// Classifies pad readings into gestures and fires the attached callbacks
pub struct TouchClassifier<S: TouchSensor> {
    sensor: S,
    config: TouchConfig,
    channels: [TouchChannel; 2],
    last_all_shortpress_ms: Option<Millis>,
    last_all_longpress_ms: Option<Millis>,
    callbacks: [[Option<TouchCallback>; 4]; 2],
    all_shortpress: Option<TouchCallback>,
    all_longpress: Option<TouchCallback>,
}

impl<S: TouchSensor> TouchClassifier<S> {
    /// Creates a classifier with default thresholds. Call [`Self::init`] before use.
    pub fn new(sensor: S) -> Self {
        Self::with_config(sensor, TouchConfig::default())
    }

    pub fn with_config(sensor: S, config: TouchConfig) -> Self {
        Self {
            sensor,
            config,
            channels: [TouchChannel::default(); 2],
            last_all_shortpress_ms: None,
            last_all_longpress_ms: None,
            callbacks: [[None; 4]; 2],
            all_shortpress: None,
            all_longpress: None,
        }
    }

    /// Calibrates both pads and enables flank handling on them
    pub fn init(&mut self) {
        info!("touch: init with detection_step={}", self.config.detection_step);
        self.calibrate();
        self.enable_interrupts(TouchZone::Fingerprint);
        self.enable_interrupts(TouchZone::Nose);
    }

    /// Sets each noise floor to the maximum of the configured number of samples.
    ///
    /// Must run with nobody touching the pads, a touch during calibration raises the
    /// floor and makes the pad unresponsive until the next calibration.
    pub fn calibrate(&mut self) {
        for channel in &mut self.channels {
            channel.noise_floor = 0;
        }

        for _ in 0..self.config.calibration_samples {
            for zone in [TouchZone::Fingerprint, TouchZone::Nose] {
                let reading = self.sensor.read_raw(zone);
                if let Some(pad) = zone.pad() {
                    let channel = &mut self.channels[pad];
                    if reading > channel.noise_floor {
                        channel.noise_floor = reading;
                    }
                }
            }
        }

        info!(
            "touch: calibrated noise floors fingerprint={} nose={}",
            self.channels[0].noise_floor,
            self.channels[1].noise_floor
        );
    }

    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    /// Calibration and timing state of a physical pad
    pub fn channel(&self, zone: TouchZone) -> Option<&TouchChannel> {
        zone.pad().map(|pad| &self.channels[pad])
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    fn threshold(&self, pad: usize) -> TouchValue {
        self.channels[pad].noise_floor.saturating_add(self.config.detection_step)
    }

    /// Whether the pad currently reads above its threshold. The combined zone is
    /// touched when both pads are.
    pub fn is_touched(&mut self, zone: TouchZone) -> bool {
        match zone.pad() {
            Some(pad) => self.sensor.read_raw(zone) > self.threshold(pad),
            None => self.is_touched(TouchZone::Fingerprint) && self.is_touched(TouchZone::Nose),
        }
    }

    /// Number of detection steps the current reading sits above the noise floor,
    /// 0 when the pad is not touched.
    pub fn intensity(&mut self, zone: TouchZone) -> u32 {
        let Some(pad) = zone.pad() else {
            error!("touch: cannot read intensity of the combined zone");
            return 0;
        };

        let reading = self.sensor.read_raw(zone);
        if reading <= self.threshold(pad) {
            return 0;
        }
        (reading - self.channels[pad].noise_floor) / self.config.detection_step.max(1)
    }

    /// Starts handling flanks of a pad.
    ///
    /// The current reading becomes the baseline, a pad already held does not fire.
    pub fn enable_interrupts(&mut self, zone: TouchZone) {
        match zone.pad() {
            Some(pad) => {
                let touched = self.is_touched(zone);
                let channel = &mut self.channels[pad];
                channel.touched = touched;
                channel.interrupts_enabled = true;
                info!("touch: enabled interrupts for {:?}", zone);
            }
            None => error!("touch: cannot enable interrupts for invalid zone {:?}", zone),
        }
    }

    /// Stops handling flanks of a pad and forgets a touch in progress
    pub fn disable_interrupts(&mut self, zone: TouchZone) {
        match zone.pad() {
            Some(pad) => {
                let channel = &mut self.channels[pad];
                channel.interrupts_enabled = false;
                channel.touched = false;
                channel.last_touch_ms = None;
                info!("touch: disabled interrupts for {:?}", zone);
            }
            None => error!("touch: cannot disable interrupts for invalid zone {:?}", zone),
        }
    }

    /// Attaches a callback to a gesture of a zone. `None` detaches the current one.
    ///
    /// Touch and release are not supported on the combined zone and are ignored.
    pub fn attach(&mut self, zone: TouchZone, gesture: Gesture, callback: Option<TouchCallback>) {
        let slot = match (zone.pad(), gesture) {
            (Some(pad), _) => &mut self.callbacks[pad][gesture.index()],
            (None, Gesture::Shortpress) => &mut self.all_shortpress,
            (None, Gesture::Longpress) => &mut self.all_longpress,
            (None, Gesture::Touch | Gesture::Release) => {
                error!("touch: attaching {:?} to the combined zone is not supported", gesture);
                return;
            }
        };

        *slot = callback;
        if callback.is_some() {
            info!("touch: attached {:?} callback to {:?}", gesture, zone);
        } else {
            info!("touch: detached {:?} callback from {:?}", gesture, zone);
        }
    }

    fn fire(&self, zone: TouchZone, gesture: Gesture, fired: &mut FiredGestures) {
        let callback = match zone.pad() {
            Some(pad) => self.callbacks[pad][gesture.index()],
            None => match gesture {
                Gesture::Shortpress => self.all_shortpress,
                Gesture::Longpress => self.all_longpress,
                Gesture::Touch | Gesture::Release => None,
            },
        };
        if let Some(callback) = callback {
            callback();
        }
        let _ = fired.push((zone, gesture));
    }

    /// Handles a touch interrupt of a pad.
    ///
    /// `rising` is `true` when the pad became touched. Returns the gestures fired, in
    /// the order their callbacks ran.
    pub fn handle_flank(&mut self, zone: TouchZone, rising: bool, now: Millis) -> FiredGestures {
        let mut fired = FiredGestures::new();
        let Some(pad) = zone.pad() else {
            error!("touch: flank on invalid zone {:?}", zone);
            return fired;
        };
        if !self.channels[pad].interrupts_enabled {
            return fired;
        }

        self.channels[pad].touched = rising;
        if rising {
            self.channels[pad].last_touch_ms = Some(now);
            self.fire(zone, Gesture::Touch, &mut fired);
            return fired;
        }

        self.channels[pad].last_release_ms = Some(now);
        let held_ms = self.channels[pad].last_touch_ms.map(|touch| now.saturating_sub(touch));

        if held_ms.is_some_and(|held| held >= self.config.shortpress_ms) {
            if self.all_gesture_applies(zone, Gesture::Shortpress, now) {
                self.last_all_shortpress_ms = Some(now);
                self.fire(TouchZone::All, Gesture::Shortpress, &mut fired);
            }
            self.fire(zone, Gesture::Shortpress, &mut fired);
        }

        if held_ms.is_some_and(|held| held >= self.config.longpress_ms) {
            if self.all_gesture_applies(zone, Gesture::Longpress, now) {
                self.last_all_longpress_ms = Some(now);
                self.fire(TouchZone::All, Gesture::Longpress, &mut fired);
            }
            self.fire(zone, Gesture::Longpress, &mut fired);
        }

        self.fire(zone, Gesture::Release, &mut fired);
        fired
    }

    /// Checks whether a press on `zone` completes a combined gesture
    fn all_gesture_applies(&mut self, zone: TouchZone, gesture: Gesture, now: Millis) -> bool {
        let (last_fired, hold_ms) = match gesture {
            Gesture::Shortpress => (self.last_all_shortpress_ms, self.config.shortpress_ms),
            Gesture::Longpress => (self.last_all_longpress_ms, self.config.longpress_ms),
            Gesture::Touch | Gesture::Release => return false,
        };

        let cooled_down =
            last_fired.map_or(true, |last| now.saturating_sub(last) >= self.config.multitouch_cooldown_ms);
        if !cooled_down {
            return false;
        }

        let other = zone.other();
        let Some(other_pad) = other.pad() else {
            return false;
        };
        let channel = self.channels[other_pad];

        let recently_released = channel
            .last_release_ms
            .is_some_and(|release| now.saturating_sub(release) < self.config.coincidence_window_ms);
        let held_long_enough = channel
            .last_touch_ms
            .is_some_and(|touch| now.saturating_sub(touch) >= hold_ms);

        (recently_released || self.is_touched(other)) && held_long_enough
    }

    /// Samples both pads and handles every flank since the last poll.
    ///
    /// Used as the interrupt source on boards without touch interrupts.
    pub fn poll(&mut self, now: Millis) -> FiredGestures {
        let mut fired = FiredGestures::new();
        for zone in [TouchZone::Fingerprint, TouchZone::Nose] {
            let Some(pad) = zone.pad() else {
                continue;
            };
            if !self.channels[pad].interrupts_enabled {
                continue;
            }

            let touched = self.is_touched(zone);
            if touched != self.channels[pad].touched {
                for gesture in self.handle_flank(zone, touched, now) {
                    let _ = fired.push(gesture);
                }
            }
        }
        fired
    }
}
