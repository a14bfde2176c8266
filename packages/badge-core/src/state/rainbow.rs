use super::{menu_unless_locked, Context, State, StateId, Transition};
use crate::board::Board;
use crate::globals::Globals;
use crate::led::{hsv, LedStrip, BLACK, LED_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Animation {
    /// Rainbow spread over the strip, rotating
    Circle,
    /// Whole strip in one color, walking the hue circle
    Solid,
}

/// Selectable animations and their tick rates
const ANIMATIONS: [(Animation, u32); 3] = [
    (Animation::Circle, 20),
    (Animation::Solid, 100),
    (Animation::Solid, 20),
];

fn animation(globals: &Globals) -> (Animation, u32) {
    ANIMATIONS[usize::from(globals.anim_rainbow_idx) % ANIMATIONS.len()]
}

/// Rainbow animations, cycled with a fingerprint release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimateRainbow {
    tick: u32,
}

impl AnimateRainbow {
    fn circle<B: Board>(&self, ctx: &mut Context<'_, B>) {
        let start = ((self.tick % 128) * 2) as u8;
        let mut frame = [BLACK; LED_COUNT];
        for (i, pixel) in frame.iter_mut().enumerate() {
            let step = (i * 256 / LED_COUNT) as u8;
            *pixel = hsv(start.wrapping_sub(step), 255, 255);
        }
        ctx.leds().set_all(&frame);
    }

    fn solid<B: Board>(&self, ctx: &mut Context<'_, B>) {
        ctx.leds().set_all_solid(hsv((self.tick % 256) as u8, 255, 255));
    }
}

impl State for AnimateRainbow {
    fn name(&self) -> &'static str {
        "AnimateRainbow"
    }

    fn id(&self) -> StateId {
        StateId::AnimateRainbow
    }

    fn should_be_remembered(&self) -> bool {
        true
    }

    fn tick_rate_ms(&self, globals: &Globals) -> u32 {
        animation(globals).1
    }

    fn entry<B: Board>(&mut self, _ctx: &mut Context<'_, B>) {
        self.tick = 0;
    }

    fn run<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        match animation(ctx.globals).0 {
            Animation::Circle => self.circle(ctx),
            Animation::Solid => self.solid(ctx),
        }
        self.tick = self.tick.wrapping_add(1);
    }

    fn on_fingerprint_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }
        ctx.globals.anim_rainbow_idx = (ctx.globals.anim_rainbow_idx + 1) % ANIMATIONS.len() as u8;
        ctx.mark_globals_dirty();
        self.tick = 0;
        ctx.leds().clear();
        info!("rainbow: changed animation to {}", ctx.globals.anim_rainbow_idx);
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
    use crate::test_board::TestBoard;

    #[test]
    fn tick_rate_follows_selection() {
        let mut globals = Globals::default();
        let state = AnimateRainbow::default();
        assert_eq!(state.tick_rate_ms(&globals), 20);
        globals.anim_rainbow_idx = 1;
        assert_eq!(state.tick_rate_ms(&globals), 100);
        globals.anim_rainbow_idx = 5;
        assert_eq!(state.tick_rate_ms(&globals), 20);
    }

    #[test]
    fn release_advances_animation_and_clears() {
        let mut board = TestBoard::new();
        let mut globals = Globals::default();
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = AnimateRainbow::default();
        state.run(&mut ctx);
        assert!(ctx.leds().frame().iter().any(|p| *p != BLACK));

        state.on_fingerprint_release(&mut ctx);
        assert_eq!(ctx.globals.anim_rainbow_idx, 1);
        assert!(ctx.is_globals_dirty());
        assert!(ctx.leds().frame().iter().all(|p| *p == BLACK));
    }

    #[test]
    fn solid_fills_every_pixel_alike() {
        let mut board = TestBoard::new();
        let mut globals = Globals {
            anim_rainbow_idx: 1,
            ..Globals::default()
        };
        let mut dirty = false;
        let mut ctx = Context::new(&mut globals, &mut dirty, &mut board, 0);

        let mut state = AnimateRainbow::default();
        state.run(&mut ctx);
        let frame = *ctx.leds().frame();
        assert!(frame.iter().all(|p| *p == frame[0]));
    }
}
