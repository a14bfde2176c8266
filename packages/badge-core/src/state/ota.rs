use super::{BadgeState, Context, State, StateId, Transition};
use crate::board::{Board, Radio, UpdateProgress};
use crate::led::{LedStrip, Region, BLACK, GREEN, RED};

/// Network credentials, baked in at build time
const WIFI_SSID: &str = match option_env!("BADGE_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};
const WIFI_PASSWORD: &str = match option_env!("BADGE_WIFI_PASSWORD") {
    Some(password) => password,
    None => "",
};
const OTA_SECRET: &str = match option_env!("BADGE_OTA_SECRET") {
    Some(secret) => secret,
    None => "",
};

/// Firmware update mode.
///
/// The nose turns green once the network is joined, the muzzle once the update
/// receiver listens. A running update is shown on the bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtaUpdate {
    progress: Option<UpdateProgress>,
}

impl State for OtaUpdate {
    fn name(&self) -> &'static str {
        "OTAUpdate"
    }

    fn id(&self) -> StateId {
        StateId::OtaUpdate
    }

    fn entry<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        ctx.leds().set_region(Region::DragonNose, RED);
        if ctx.board.radio().connect(WIFI_SSID, WIFI_PASSWORD) {
            ctx.leds().set_region(Region::DragonNose, GREEN);
        } else {
            warn!("ota: could not join the network");
        }

        ctx.board.radio().enable_update_receiver(OTA_SECRET);
        ctx.leds().set_region(Region::DragonMuzzle, GREEN);
        info!("ota: waiting for updates");
    }

    fn run<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        let progress = ctx.board.radio().pump();
        if self.progress == Some(progress) {
            return;
        }
        self.progress = Some(progress);

        match progress {
            UpdateProgress::Idle => {}
            UpdateProgress::Receiving(percent) => {
                debug!("ota: received {}%", percent);
                ctx.leds().fill_bar_proportionally(percent, GREEN, BLACK);
            }
            UpdateProgress::Done => {
                info!("ota: update complete");
                ctx.leds().fill_bar_proportionally(100, GREEN, BLACK);
            }
            UpdateProgress::Failed => {
                error!("ota: update failed");
                ctx.leds().fill_bar_proportionally(100, RED, BLACK);
            }
        }
    }

    fn exit<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        ctx.board.radio().disable();
    }

    fn on_fingerprint_shortpress<B: Board>(&mut self, _ctx: &mut Context<'_, B>) -> Transition {
        BadgeState::next(StateId::MenuMain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globals::Globals;
    use crate::led::BAR_OFFSET;
    use crate::test_board::TestBoard;

    #[test]
    fn entry_signals_connection() {
        let mut board = TestBoard::new();
        board.radio.connect_ok = true;
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        OtaUpdate::default().entry(&mut ctx);
        assert_eq!(board.leds.frame[0], GREEN);
        assert_eq!(board.leds.frame[1], GREEN);
        assert!(board.radio.receiver_enabled);
    }

    #[test]
    fn failed_connection_keeps_nose_red() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        OtaUpdate::default().entry(&mut ctx);
        assert_eq!(board.leds.frame[0], RED);
        assert!(board.radio.receiver_enabled);
    }

    #[test]
    fn progress_and_exit() {
        let mut board = TestBoard::new();
        board.radio.progress.extend([UpdateProgress::Idle, UpdateProgress::Receiving(50)]);
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = OtaUpdate::default();
        state.entry(&mut ctx);
        state.run(&mut ctx);
        state.run(&mut ctx);
        assert_eq!(ctx.leds().frame()[BAR_OFFSET + 5], GREEN);
        assert_eq!(ctx.leds().frame()[BAR_OFFSET + 6], BLACK);

        state.exit(&mut ctx);
        assert!(!board.radio.receiver_enabled);
        assert_eq!(board.radio.disabled, 1);
    }
}
