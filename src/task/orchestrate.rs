//! Orchestrator Module
//!
//! The badge main loop: owns the board, the state machine and the power supervisor.
//!
//! # Boot
//! - print the firmware version
//! - check the battery, a brown out at boot holds the badge right away
//! - restore the globals and resume the remembered mode
//!
//! # Loop
//! Every 10 ms the pending touch gestures are moved into the event queue and the
//! state machine handles them. Once a minute the battery is checked, a brown out
//! takes over the badge until the next reset.

use badge_core::power::{hard_brownout_hold, soft_brownout_hold, PowerState, PowerSupervisor};
use badge_core::Fsm;
use defmt::{debug, info};
use embassy_time::{Duration, Instant, Ticker};

use crate::system::event::{drain_pending_gestures, EVENT_QUEUE};
use crate::system::resources::{BatteryResources, LedResources, MicrophoneResources, StorageResources};
use crate::task::battery::{VsysAdc, VsysSampler};
use crate::task::board::BadgeBoard;
use crate::task::flash_storage::FlashStore;
use crate::task::led_strip::Ws2812Strip;
use crate::task::radio::OfflineRadio;

/// Firmware version printed at boot
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time between two battery checks
const POWER_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Checks the battery, never returns on brown out
fn check_power(board: &mut BadgeBoard, power: &mut PowerSupervisor<VsysAdc>) -> PowerState {
    let state = power.update_power_state();
    debug!(
        "power: {} at {} mV",
        state,
        (power.battery_voltage() * 1000.0) as u32
    );
    match state {
        PowerState::SoftBrownout => soft_brownout_hold(board, power),
        PowerState::HardBrownout => hard_brownout_hold(board),
        _ => state,
    }
}

/// Main orchestrator task
#[embassy_executor::task]
pub async fn orchestrate(
    leds: LedResources,
    battery: BatteryResources,
    microphone: MicrophoneResources,
    storage: StorageResources,
) {
    info!("EF badge firmware v{}", VERSION);

    let mut board = BadgeBoard::new(Ws2812Strip::new(leds), OfflineRadio::default(), microphone);
    let mut power = PowerSupervisor::new(VsysAdc::new(VsysSampler::new(battery)));
    let state = check_power(&mut board, &mut power);
    info!("power: booting in {}", state);

    let mut fsm = Fsm::new(FlashStore::new(storage), &EVENT_QUEUE);
    fsm.resume(&mut board, Instant::now().as_millis());

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(fsm.tick_rate_ms())));
    let mut next_power_check = Instant::now() + POWER_CHECK_INTERVAL;
    loop {
        let queued = drain_pending_gestures();
        if queued > 0 {
            debug!("orchestrate: queued {} events", queued);
        }
        fsm.handle_all(&mut board, Instant::now().as_millis());

        if Instant::now() >= next_power_check {
            check_power(&mut board, &mut power);
            next_power_check += POWER_CHECK_INTERVAL;
        }

        ticker.next().await;
    }
}
