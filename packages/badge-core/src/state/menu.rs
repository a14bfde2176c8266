use super::{BadgeState, Context, State, StateId, Transition};
use crate::board::Board;
use crate::led::{LedStrip, Region, BLACK, GREEN, PURPLE, WHITE};

/// Menu entries in cursor order
pub const MENU_ITEMS: [StateId; 9] = [
    StateId::DisplayPrideFlag,
    StateId::AnimateRainbow,
    StateId::AnimateMatrix,
    StateId::AnimateSnake,
    StateId::AnimateHeartbeat,
    StateId::AnimatePerlin,
    StateId::VuMeter,
    StateId::GameHuemesh,
    StateId::OtaUpdate,
];

const BRIGHTNESS_STEP: u8 = 10;
const MIN_BRIGHTNESS: u8 = 10;
const MAX_BRIGHTNESS: u8 = 100;
/// How long the new brightness level stays on the bar
const BRIGHTNESS_PREVIEW_MS: u32 = 500;

/// Next brightness level, wrapping from the maximum back to the minimum
fn next_brightness(percent: u8) -> u8 {
    if percent >= MAX_BRIGHTNESS {
        MIN_BRIGHTNESS
    } else {
        (percent / BRIGHTNESS_STEP + 1).saturating_mul(BRIGHTNESS_STEP).max(MIN_BRIGHTNESS)
    }
}

/// Main menu. The fingerprint release moves the cursor over the bar, a press enters the
/// selected mode and a nose press cycles the LED brightness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuMain;

impl MenuMain {
    fn cursor<B: Board>(ctx: &Context<'_, B>) -> u8 {
        ctx.globals.menu_main_pointer_idx % MENU_ITEMS.len() as u8
    }

    fn draw_cursor<B: Board>(ctx: &mut Context<'_, B>) {
        let cursor = Self::cursor(ctx);
        ctx.leds().set_bar_cursor(cursor, PURPLE, BLACK);
    }

    fn select<B: Board>(ctx: &Context<'_, B>) -> Transition {
        let item = MENU_ITEMS[usize::from(Self::cursor(ctx))];
        debug!("menu: selected item {}", Self::cursor(ctx));
        BadgeState::next(item)
    }
}

impl State for MenuMain {
    fn name(&self) -> &'static str {
        "MenuMain"
    }

    fn id(&self) -> StateId {
        StateId::MenuMain
    }

    fn entry<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        ctx.leds().clear();
        ctx.leds().set_region(Region::DragonEye, GREEN);
        Self::draw_cursor(ctx);
    }

    fn exit<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        ctx.leds().clear();
    }

    fn on_fingerprint_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        ctx.globals.menu_main_pointer_idx = (Self::cursor(ctx) + 1) % MENU_ITEMS.len() as u8;
        Self::draw_cursor(ctx);
        None
    }

    fn on_fingerprint_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        Self::select(ctx)
    }

    fn on_fingerprint_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        Self::select(ctx)
    }

    fn on_nose_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        let percent = next_brightness(ctx.globals.led_brightness_percent);
        ctx.globals.led_brightness_percent = percent;
        ctx.mark_globals_dirty();
        info!("menu: brightness set to {}%", percent);

        ctx.leds().set_brightness_percent(percent);
        ctx.leds().fill_bar_proportionally(percent, WHITE, BLACK);
        ctx.board.delay_ms(BRIGHTNESS_PREVIEW_MS);
        Self::draw_cursor(ctx);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globals::Globals;
    use crate::led::BAR_OFFSET;
    use crate::test_board::TestBoard;

    #[test]
    fn brightness_steps() {
        assert_eq!(next_brightness(0), 10);
        assert_eq!(next_brightness(10), 20);
        assert_eq!(next_brightness(40), 50);
        assert_eq!(next_brightness(45), 50);
        assert_eq!(next_brightness(90), 100);
        assert_eq!(next_brightness(100), 10);
        assert_eq!(next_brightness(200), 10);
    }

    #[test]
    fn entry_shows_eye_and_cursor() {
        let mut board = TestBoard::new();
        let mut globals = Globals {
            menu_main_pointer_idx: 2,
            ..Globals::default()
        };
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        MenuMain.entry(&mut ctx);
        assert_eq!(board.leds.frame[2], GREEN);
        assert_eq!(board.leds.frame[BAR_OFFSET + 2], PURPLE);
        assert_eq!(board.leds.frame[BAR_OFFSET], BLACK);
    }

    #[test]
    fn release_moves_cursor_without_dirtying() {
        let mut board = TestBoard::new();
        let mut globals = Globals {
            menu_main_pointer_idx: MENU_ITEMS.len() as u8 - 1,
            ..Globals::default()
        };
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        assert!(MenuMain.on_fingerprint_release(&mut ctx).is_none());
        assert_eq!(ctx.globals.menu_main_pointer_idx, 0);
        assert!(!ctx.is_globals_dirty());
        assert_eq!(ctx.leds().frame()[BAR_OFFSET], PURPLE);
    }

    #[test]
    fn press_selects_item_under_cursor() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        for (idx, item) in MENU_ITEMS.iter().enumerate() {
            ctx.globals.menu_main_pointer_idx = idx as u8;
            let next = MenuMain.on_fingerprint_shortpress(&mut ctx);
            assert_eq!(next.map(|s| s.id()), Some(*item));
        }
        // menu entries work while locked
        ctx.globals.locked = true;
        let next = MenuMain.on_fingerprint_longpress(&mut ctx);
        assert_eq!(next.map(|s| s.id()), Some(StateId::OtaUpdate));
    }

    #[test]
    fn nose_cycles_brightness() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        MenuMain.on_nose_shortpress(&mut ctx);
        assert_eq!(ctx.globals.led_brightness_percent, 50);
        assert!(ctx.is_globals_dirty());
        assert_eq!(board.leds.brightness_percent, 50);
        assert_eq!(board.delays, [BRIGHTNESS_PREVIEW_MS]);
    }
}
