use core::f32::consts::PI;

use super::{menu_unless_locked, show_speed_on_bar, Context, State, StateId, Transition};
use crate::board::Board;
use crate::globals::Globals;
use crate::led::{hsv, LedStrip, Region, BLACK, LED_COUNT, LED_POSITIONS};

const TICK_RATE_MS: u32 = 60;
const SPEED_COUNT: u8 = 3;
/// Minimum distance between two randomly chosen hues
const MIN_HUE_CHANGE: u8 = 20;

/// Distance of a pixel to the dragon eye in millimeters
fn distance_to_eye(idx: usize) -> f32 {
    let eye = LED_POSITIONS[Region::DragonEye.pixels().start];
    let (x, y) = LED_POSITIONS[idx];
    libm::sqrtf((x - eye.0) * (x - eye.0) + (y - eye.1) * (y - eye.1))
}

/// Heartbeat pulse starting at the dragon eye and rippling down the bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimateHeartbeat {
    tick: u32,
}

impl State for AnimateHeartbeat {
    fn name(&self) -> &'static str {
        "AnimateHeartbeat"
    }

    fn id(&self) -> StateId {
        StateId::AnimateHeartbeat
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
        let hue = ctx.globals.anim_heartbeat_hue;
        let mut frame = [BLACK; LED_COUNT];
        for (i, pixel) in frame.iter_mut().enumerate() {
            // pixels further away from the eye lag behind
            let t = self.tick as f32 / 40.0 - distance_to_eye(i) / 80.0;
            let intensity = libm::sinf(t * PI).max(0.0);
            *pixel = hsv(hue, 255, (intensity * 255.0) as u8);
        }
        ctx.leds().set_all(&frame);

        self.tick = self
            .tick
            .wrapping_add(u32::from(ctx.globals.anim_heartbeat_speed) + 1);
    }

    fn on_fingerprint_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        menu_unless_locked(ctx)
    }

    fn on_fingerprint_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        menu_unless_locked(ctx)
    }

    fn on_nose_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }

        let old = ctx.globals.anim_heartbeat_hue;
        let mut hue = ctx.board.random(255) as u8;
        if old.abs_diff(hue) < MIN_HUE_CHANGE {
            hue = ((u16::from(hue) + u16::from(MIN_HUE_CHANGE)) % 255) as u8;
        }
        ctx.globals.anim_heartbeat_hue = hue;
        ctx.mark_globals_dirty();
        debug!("heartbeat: hue {} -> {}", old, hue);

        ctx.leds().set_region(Region::DragonEye, BLACK);
        ctx.board.delay_ms(100);
        ctx.leds().set_region(Region::DragonEye, hsv(hue, 255, 255));
        ctx.board.delay_ms(300);
        ctx.leds().set_region(Region::DragonEye, BLACK);

        self.tick = 0;
        None
    }

    fn on_nose_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }
        ctx.globals.anim_heartbeat_speed = (ctx.globals.anim_heartbeat_speed + 1) % SPEED_COUNT;
        ctx.mark_globals_dirty();
        let speed = ctx.globals.anim_heartbeat_speed;
        show_speed_on_bar(ctx, speed + 1);
        None
    }

    fn on_all_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        ctx.toggle_lock();
        None
    }
}
