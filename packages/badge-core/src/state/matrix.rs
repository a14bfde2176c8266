use super::{compose, menu_unless_locked, Context, State, StateId, Transition};
use crate::board::Board;
use crate::globals::Globals;
use crate::led::{hsv, hue_from_degrees, LedStrip, BAR_LED_COUNT, BLACK, DRAGON_LED_COUNT};

const TICK_RATE_MS: u32 = 100;

/// Selectable hues in degrees, starting with Eurofurence green
const HUES: [u16; 9] = [130, 160, 200, 240, 280, 320, 0, 40, 80];

/// Falling trails in one color through the dragon head and the bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimateMatrix {
    tick: u32,
}

impl State for AnimateMatrix {
    fn name(&self) -> &'static str {
        "AnimateMatrix"
    }

    fn id(&self) -> StateId {
        StateId::AnimateMatrix
    }

    fn should_be_remembered(&self) -> bool {
        true
    }

    fn tick_rate_ms(&self, _globals: &Globals) -> u32 {
        TICK_RATE_MS
    }

    fn entry<B: Board>(&mut self, _ctx: &mut Context<'_, B>) {
        self.tick = 0;
    }

    fn run<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        let hue = hue_from_degrees(HUES[usize::from(ctx.globals.anim_matrix_idx) % HUES.len()]);
        let shade = |val: u8| hsv(hue, 255, val);

        let mut dragon = [BLACK, shade(40), shade(110), shade(255), BLACK, BLACK];
        let mut bar = [
            shade(50),
            shade(110),
            shade(255),
            BLACK,
            BLACK,
            shade(70),
            shade(100),
            shade(200),
            BLACK,
            BLACK,
            BLACK,
        ];
        dragon.rotate_left(self.tick as usize % DRAGON_LED_COUNT);
        bar.rotate_right(self.tick as usize % BAR_LED_COUNT);

        ctx.leds().set_all(&compose(&dragon, &bar));
        self.tick = self.tick.wrapping_add(1);
    }

    fn on_fingerprint_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        menu_unless_locked(ctx)
    }

    fn on_fingerprint_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        menu_unless_locked(ctx)
    }

    fn on_fingerprint_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }
        ctx.globals.anim_matrix_idx = (ctx.globals.anim_matrix_idx + 1) % HUES.len() as u8;
        ctx.mark_globals_dirty();
        self.tick = 0;
        None
    }

    fn on_all_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        ctx.toggle_lock();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_board::TestBoard;

    #[test]
    fn trails_move_in_opposite_directions() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = AnimateMatrix::default();
        state.run(&mut ctx);
        let first = *ctx.leds().frame();
        state.run(&mut ctx);
        let second = *ctx.leds().frame();

        // brightest head pixel moves towards the nose
        assert_eq!(first[3], second[2]);
        // brightest bar pixel moves down the bar
        assert_eq!(first[DRAGON_LED_COUNT + 2], second[DRAGON_LED_COUNT + 3]);
    }

    #[test]
    fn release_wraps_hue_selection() {
        let mut board = TestBoard::new();
        let mut globals = Globals {
            anim_matrix_idx: 8,
            ..Globals::default()
        };
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = AnimateMatrix::default();
        state.on_fingerprint_release(&mut ctx);
        assert_eq!(ctx.globals.anim_matrix_idx, 0);
        assert!(ctx.is_globals_dirty());
    }
}
