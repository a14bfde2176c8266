//! Badge firmware entry point
//!
//! Initializes the system, starts touch sensing on the high priority executor and the
//! badge loop on the thread executor.

#![no_std]
#![no_main]

use crate::task::{orchestrate::orchestrate, touch_sense::touch_sense};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use system::resources::{
    self, AssignedResources, BatteryResources, LedResources, MicrophoneResources, StorageResources, TouchResources,
};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// System core modules
mod system;
/// Task implementations
mod task;

/// Runs touch sensing, which must keep going while the badge loop blocks
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // The ADC is shared by the battery and the microphone, set it up before any task
    // can read it.
    resources::init_adc(p.ADC);

    let r = split_resources!(p);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(touch_sense(r.touch)).unwrap();

    spawner
        .spawn(orchestrate(r.leds, r.battery, r.microphone, r.storage))
        .unwrap();
}
