use super::{menu_unless_locked, Context, State, StateId, Transition};
use crate::board::Board;
use crate::globals::Globals;
use crate::led::{LedStrip, BAR_LED_COUNT, BLACK, LED_COUNT, RED};

const TICK_RATE_MS: u32 = 80;
const SNAKE_LENGTH: usize = 3;
/// Number of animations, the snake first and the knight rider second
const ANIMATION_COUNT: u8 = 2;

/// A red snake running over the strip, or a knight rider scanner on the bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimateSnake {
    tick: u32,
}

impl AnimateSnake {
    fn snake<B: Board>(&self, ctx: &mut Context<'_, B>) {
        let mut frame = [BLACK; LED_COUNT];
        frame[..SNAKE_LENGTH].fill(RED);
        frame.rotate_right(self.tick as usize % LED_COUNT);
        ctx.leds().set_all(&frame);
    }

    fn knight_rider<B: Board>(&self, ctx: &mut Context<'_, B>) {
        let phase = self.tick % 8;
        let shift = if self.tick % 16 < 8 { phase } else { 8 - phase };
        let pattern: u16 = (0b111 << (BAR_LED_COUNT - SNAKE_LENGTH)) >> shift;

        let mut bar = [BLACK; BAR_LED_COUNT];
        for (i, pixel) in bar.iter_mut().enumerate() {
            if pattern & (1 << i) != 0 {
                *pixel = RED;
            }
        }
        ctx.leds().set_bar(&bar);
    }
}

impl State for AnimateSnake {
    fn name(&self) -> &'static str {
        "AnimateSnake"
    }

    fn id(&self) -> StateId {
        StateId::AnimateSnake
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
        match ctx.globals.anim_snake_idx % ANIMATION_COUNT {
            0 => self.snake(ctx),
            _ => self.knight_rider(ctx),
        }
        self.tick = self.tick.wrapping_add(1);
    }

    fn on_fingerprint_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }
        ctx.globals.anim_snake_idx = (ctx.globals.anim_snake_idx + 1) % ANIMATION_COUNT;
        ctx.mark_globals_dirty();
        self.tick = 0;
        ctx.leds().clear();
        info!("snake: changed animation to {}", ctx.globals.anim_snake_idx);
        None
    }

    fn on_fingerprint_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        menu_unless_locked(ctx)
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
    use crate::test_board::TestBoard;

    fn lit(pixels: &[crate::led::RGB8]) -> std::vec::Vec<usize> {
        pixels
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == RED)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn snake_wraps_around_the_strip() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = AnimateSnake::default();
        state.run(&mut ctx);
        assert_eq!(lit(ctx.leds().frame()), [0, 1, 2]);

        state.tick = 15;
        state.run(&mut ctx);
        assert_eq!(lit(ctx.leds().frame()), [0, 15, 16]);
    }

    #[test]
    fn knight_rider_bounces() {
        let mut board = TestBoard::new();
        let mut globals = Globals {
            anim_snake_idx: 1,
            ..Globals::default()
        };
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = AnimateSnake::default();
        state.run(&mut ctx);
        assert_eq!(lit(&ctx.leds().frame()[Region::Bar.pixels()]), [8, 9, 10]);

        state.tick = 7;
        state.run(&mut ctx);
        assert_eq!(lit(&ctx.leds().frame()[Region::Bar.pixels()]), [1, 2, 3]);

        state.tick = 8;
        state.run(&mut ctx);
        assert_eq!(lit(&ctx.leds().frame()[Region::Bar.pixels()]), [0, 1, 2]);
    }
}
