//! Touch sensing
//!
//! The two pads are sensed by their RC charge time: the pad is discharged, released
//! and the loop counts until the external pull-up charges it past the input
//! threshold. A finger adds capacitance, so the count goes up.
//!
//! The task runs on the high priority executor and keeps classifying while the badge
//! loop is blocked in a delay. Classified gestures only set pending flags, see
//! `system::event`.

use badge_core::touch::{TouchClassifier, TouchConfig, TouchSensor, TouchValue, TouchZone};
use defmt::info;
use embassy_rp::gpio::{Flex, Pull};
use embassy_time::{block_for, Duration, Instant, Ticker};

use crate::system::event::attach_callbacks;
use crate::system::resources::TouchResources;

/// Time between two polls of the pads
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Charge measurements summed per reading
const SAMPLES_PER_READING: u32 = 4;

/// Upper bound of a single charge count, reached with the pad shorted
const MAX_CHARGE_COUNT: u32 = 2_000;

/// Time to drain the pad before measuring
const DISCHARGE_TIME: Duration = Duration::from_micros(10);

/// Rise of the summed charge count that counts as a touch
const DETECTION_STEP: TouchValue = 80;

/// RC charge time sensor on two GPIOs
pub struct RcTouchSensor {
    fingerprint: Flex<'static>,
    nose: Flex<'static>,
}

impl RcTouchSensor {
    pub fn new(r: TouchResources) -> Self {
        let mut fingerprint = Flex::new(r.fingerprint_pin);
        let mut nose = Flex::new(r.nose_pin);
        fingerprint.set_pull(Pull::None);
        nose.set_pull(Pull::None);
        Self { fingerprint, nose }
    }
}

/// One charge measurement of a pad
fn charge_count(pad: &mut Flex<'static>) -> u32 {
    pad.set_as_output();
    pad.set_low();
    block_for(DISCHARGE_TIME);

    // interrupts would stretch the count
    critical_section::with(|_| {
        pad.set_as_input();
        let mut count = 0;
        while pad.is_low() && count < MAX_CHARGE_COUNT {
            count += 1;
        }
        count
    })
}

impl TouchSensor for RcTouchSensor {
    fn read_raw(&mut self, zone: TouchZone) -> TouchValue {
        let pad = match zone {
            TouchZone::Nose => &mut self.nose,
            _ => &mut self.fingerprint,
        };
        (0..SAMPLES_PER_READING).map(|_| charge_count(pad)).sum()
    }
}

/// Calibrates the pads, attaches the gesture callbacks and polls the pads forever
#[embassy_executor::task]
pub async fn touch_sense(r: TouchResources) {
    let config = TouchConfig {
        detection_step: DETECTION_STEP,
        ..TouchConfig::default()
    };
    let mut touch = TouchClassifier::with_config(RcTouchSensor::new(r), config);
    touch.init();
    attach_callbacks(&mut touch);
    info!("touch: sensing started");

    let mut ticker = Ticker::every(POLL_INTERVAL);
    loop {
        touch.poll(Instant::now().as_millis());
        ticker.next().await;
    }
}
