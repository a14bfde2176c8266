//! Hardware Resource Management
//!
//! Assigns the pins and peripherals of the badge to the tasks that own them.
//!
//! # Resource Groups
//! - Touch: the two RC charge touch pads
//! - LEDs: PIO state machine, DMA channel, data pin and the 5 V boost enable
//! - Battery: VSYS divider on an ADC pin
//! - Microphone: analog microphone output on an ADC pin
//! - Storage: the flash peripheral
//!
//! # Shared Resources
//! The ADC is shared between the battery supervision and the VU meter. Both read it
//! synchronously from within the state machine, so it sits behind a blocking mutex
//! that is only held for a single conversion.

use core::cell::RefCell;

use assign_resources::assign_resources;
use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, ADC, PIO0};
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Global ADC instance, `None` until [`init_adc`] ran
static ADC: Mutex<CriticalSectionRawMutex, RefCell<Option<Adc<'static, Blocking>>>> = Mutex::new(RefCell::new(None));

/// Initializes the ADC peripheral.
///
/// Call once from main before any task is spawned.
pub fn init_adc(adc: ADC) {
    let adc = Adc::new_blocking(adc, embassy_rp::adc::Config::default());
    ADC.lock(|cell| cell.replace(Some(adc)));
}

/// Converts one sample of `channel`. `None` if the ADC is not initialized or the
/// conversion failed.
pub fn read_adc(channel: &mut Channel<'static>) -> Option<u16> {
    ADC.lock(|cell| {
        let mut adc = cell.borrow_mut();
        adc.as_mut()?.blocking_read(channel).ok()
    })
}

assign_resources! {
    /// Capacitive touch pads, sensed by their RC charge time
    touch: TouchResources {
        fingerprint_pin: PIN_2,
        nose_pin: PIN_3,
    },
    /// WS2812 strip of the dragon head and the bar
    leds: LedResources {
        pio: PIO0,
        dma: DMA_CH0,
        data_pin: PIN_16,
        boost_enable_pin: PIN_17,
    },
    /// Battery voltage monitoring pin
    battery: BatteryResources {
        vsys_pin: PIN_29,
    },
    /// Analog microphone for the VU meter
    microphone: MicrophoneResources {
        mic_pin: PIN_26,
    },
    /// Flash holding the persisted settings in its last sectors
    storage: StorageResources {
        flash: FLASH,
    },
}

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});
