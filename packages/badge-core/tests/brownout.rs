mod common;

use badge_core::led::{Region, RED};
use badge_core::power::{
    enter_hard_brownout, enter_soft_brownout, hard_brownout_cycle, soft_brownout_cycle, BatteryAdc,
    PowerState, PowerSupervisor, SOFT_BROWNOUT_BLINKS,
};

use common::RecordingBoard;

/// Raw samples for the default divider: about 4.5 V, 3.45 V and 3.2 V
const FULL: u16 = 3580;
const EMPTY: u16 = 2745;
const DEAD: u16 = 2545;

struct ScriptedAdc(u16);

impl BatteryAdc for ScriptedAdc {
    fn read_raw_battery(&mut self) -> u16 {
        self.0
    }
}

#[test]
fn samples_map_to_expected_states() {
    let mut power = PowerSupervisor::new(ScriptedAdc(FULL));
    assert_eq!(power.update_power_state(), PowerState::BatteryNormal);
    assert_eq!(PowerSupervisor::new(ScriptedAdc(EMPTY)).update_power_state(), PowerState::SoftBrownout);
    assert_eq!(PowerSupervisor::new(ScriptedAdc(DEAD)).update_power_state(), PowerState::HardBrownout);
    assert_eq!(PowerSupervisor::new(ScriptedAdc(0)).update_power_state(), PowerState::Usb);
}

#[test]
fn ratchet_holds_until_reset() {
    let mut power = PowerSupervisor::new(ScriptedAdc(EMPTY));
    assert_eq!(power.update_power_state(), PowerState::SoftBrownout);

    // plugging in USB does not clear the brown out
    power.adc_mut().0 = 0;
    assert_eq!(power.update_power_state(), PowerState::SoftBrownout);

    power.adc_mut().0 = FULL;
    assert_eq!(power.update_power_state(), PowerState::SoftBrownout);
    assert_eq!(power.reset_power_state(), PowerState::BatteryNormal);
}

#[test]
fn soft_brownout_blinks_nose() {
    let mut board = RecordingBoard::new();
    let mut power = PowerSupervisor::new(ScriptedAdc(EMPTY));
    power.update_power_state();

    enter_soft_brownout(&mut board);
    assert!(board.position("radio.disable").is_some());

    board.log.borrow_mut().clear();
    assert_eq!(soft_brownout_cycle(&mut board, &mut power), PowerState::SoftBrownout);

    let delays: Vec<String> = board
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("delay"))
        .collect();
    assert_eq!(delays.len(), 2 * usize::from(SOFT_BROWNOUT_BLINKS));
    assert_eq!(delays[0], "delay(200)");
    assert_eq!(delays[1], "delay(800)");
}

#[test]
fn soft_brownout_escalates_without_blinking() {
    let mut board = RecordingBoard::new();
    let mut power = PowerSupervisor::new(ScriptedAdc(EMPTY));
    power.update_power_state();

    power.adc_mut().0 = DEAD;
    assert_eq!(soft_brownout_cycle(&mut board, &mut power), PowerState::HardBrownout);
    assert!(board.calls().is_empty());
}

#[test]
fn hard_brownout_flashes_briefly() {
    let mut board = RecordingBoard::new();
    enter_hard_brownout(&mut board);
    assert_eq!(board.leds.brightness, 20);
    assert_eq!(board.leds.frame[Region::DragonNose.pixels()][0], RED);

    board.log.borrow_mut().clear();
    hard_brownout_cycle(&mut board);
    assert_eq!(
        board.calls(),
        ["leds.power(true)", "delay(80)", "leds.power(false)", "delay(4000)"]
    );
}
