use super::{menu_unless_locked, Context, State, StateId, Transition};
use crate::board::Board;
use crate::globals::Globals;
use crate::led::{blend, scale, LedStrip, BAR_LED_COUNT, BLACK, DRAGON_LED_COUNT};
use crate::pride::{Flag, FLAGS, LGBTQI};

const TICK_RATE_MS: u32 = 20;
/// Time each flag is shown when cycling
const SWITCH_DELAY_MS: u32 = 5_000;
/// Cycle mode plus one mode per flag
const MODE_COUNT: u8 = FLAGS.len() as u8 + 1;
/// Ticks the dragon head takes to move by one stripe
const DRAGON_STEP_TICKS: u32 = 20;

/// Shows a pride flag on the bar and lets it wander through the dragon head.
///
/// Mode 0 cycles through all flags, every other mode shows one flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayPrideFlag {
    tick: u32,
    flag_idx: usize,
}

impl DisplayPrideFlag {
    fn flag(&self, mode: u8) -> &'static Flag {
        if mode == 0 {
            return FLAGS[self.flag_idx % FLAGS.len()];
        }
        match FLAGS.get(usize::from(mode - 1)) {
            Some(flag) => flag,
            None => {
                error!("pride: invalid flag mode {}", mode);
                &LGBTQI
            }
        }
    }
}

impl State for DisplayPrideFlag {
    fn name(&self) -> &'static str {
        "DisplayPrideFlag"
    }

    fn id(&self) -> StateId {
        StateId::DisplayPrideFlag
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
        let mode = ctx.globals.pride_flag_mode_idx;
        let refresh = self.tick % (SWITCH_DELAY_MS / TICK_RATE_MS) == 0;
        if refresh && mode == 0 {
            self.flag_idx = (self.flag_idx + 1) % FLAGS.len();
            debug!("pride: switched flag to {}", self.flag_idx);
        }
        let flag = self.flag(mode);

        // blend each head pixel towards the next stripe, at half brightness
        let offset = ((self.tick % (BAR_LED_COUNT as u32 * DRAGON_STEP_TICKS)) / DRAGON_STEP_TICKS) as usize;
        let amount = ((self.tick % DRAGON_STEP_TICKS) * 255 / DRAGON_STEP_TICKS) as u8;
        let mut dragon = [BLACK; DRAGON_LED_COUNT];
        for (i, pixel) in dragon.iter_mut().enumerate() {
            let current = flag[(offset + i) % BAR_LED_COUNT];
            let next = flag[(offset + i + 1) % BAR_LED_COUNT];
            *pixel = scale(blend(current, next, amount), 127);
        }
        ctx.leds().set_dragon(&dragon);

        if refresh {
            ctx.leds().set_bar(flag);
        }
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
        ctx.globals.pride_flag_mode_idx = (ctx.globals.pride_flag_mode_idx + 1) % MODE_COUNT;
        ctx.mark_globals_dirty();
        self.tick = 0;
        info!("pride: changed mode to {}", ctx.globals.pride_flag_mode_idx);
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
    use crate::led::Region;
    use crate::pride::LGBT;
    use crate::test_board::TestBoard;

    #[test]
    fn release_cycles_modes_and_wraps() {
        let mut board = TestBoard::new();
        let mut globals = Globals {
            pride_flag_mode_idx: 12,
            ..Globals::default()
        };
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = DisplayPrideFlag::default();
        assert!(state.on_fingerprint_release(&mut ctx).is_none());
        assert_eq!(ctx.globals.pride_flag_mode_idx, 0);
        assert!(ctx.is_globals_dirty());
    }

    #[test]
    fn first_run_paints_selected_flag() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = DisplayPrideFlag::default();
        state.entry(&mut ctx);
        state.run(&mut ctx);
        assert_eq!(&board.leds.frame[Region::Bar.pixels()], &LGBT[..]);
    }

    #[test]
    fn lock_blocks_menu_and_mode_change() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = DisplayPrideFlag::default();
        state.on_all_longpress(&mut ctx);
        assert!(ctx.is_locked());
        assert!(state.on_fingerprint_shortpress(&mut ctx).is_none());
        assert!(state.on_fingerprint_release(&mut ctx).is_none());
        assert_eq!(ctx.globals.pride_flag_mode_idx, 1);

        state.on_all_longpress(&mut ctx);
        let next = state.on_fingerprint_shortpress(&mut ctx);
        assert_eq!(next.map(|s| s.id()), Some(StateId::MenuMain));
    }
}
