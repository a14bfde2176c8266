use super::{menu_unless_locked, show_speed_on_bar, Context, State, StateId, Transition};
use crate::board::Board;
use crate::globals::Globals;
use crate::led::{hsv, LedStrip, BLACK, LED_COUNT, LED_POSITIONS};

const TICK_RATE_MS: u32 = 60;
const SPEED_COUNT: u8 = 3;
/// Entry starts at a random point in time so two badges rarely look alike
const MAX_START_TICK: u32 = 500;

const HUE_SCALE: f32 = 2.0;
const VALUE_SCALE: f32 = 10.0;
/// Raw noise hovers around the middle, lift it so most pixels stay visible
const VALUE_LIFT: u16 = 50;

/// Smooth gradient noise on an integer lattice, result in `-1.0..=1.0`
fn noise(x: f32, y: f32, z: f32) -> f32 {
    let (xi, yi, zi) = (libm::floorf(x), libm::floorf(y), libm::floorf(z));
    let (xf, yf, zf) = (x - xi, y - yi, z - zi);
    let (xi, yi, zi) = (xi as i32, yi as i32, zi as i32);
    let (u, v, w) = (fade(xf), fade(yf), fade(zf));

    let corner = |dx: i32, dy: i32, dz: i32| {
        grad(
            hash(xi + dx, yi + dy, zi + dz),
            xf - dx as f32,
            yf - dy as f32,
            zf - dz as f32,
        )
    };

    let x00 = lerp(u, corner(0, 0, 0), corner(1, 0, 0));
    let x10 = lerp(u, corner(0, 1, 0), corner(1, 1, 0));
    let x01 = lerp(u, corner(0, 0, 1), corner(1, 0, 1));
    let x11 = lerp(u, corner(0, 1, 1), corner(1, 1, 1));
    lerp(w, lerp(v, x00, x10), lerp(v, x01, x11)).clamp(-1.0, 1.0)
}

/// Noise mapped onto a byte, with the input in 1/256 lattice units
fn noise8(x: f32, y: f32, z: f32) -> u8 {
    let n = noise(x / 256.0, y / 256.0, z / 256.0);
    ((n + 1.0) * 127.5) as u8
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

fn hash(x: i32, y: i32, z: i32) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343)
        ^ (y as u32).wrapping_mul(0xd816_3841)
        ^ (z as u32).wrapping_mul(0xcb1a_b31f);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2c1b_3c6d);
    h ^ (h >> 12)
}

/// Dot product with one of the twelve cube edge gradients
fn grad(hash: u32, x: f32, y: f32, z: f32) -> f32 {
    match hash % 12 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x + z,
        5 => -x + z,
        6 => x - z,
        7 => -x - z,
        8 => y + z,
        9 => -y + z,
        10 => y - z,
        _ => -y - z,
    }
}

/// Slowly drifting color clouds from three dimensional noise
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimatePerlin {
    tick: u32,
}

impl State for AnimatePerlin {
    fn name(&self) -> &'static str {
        "AnimatePerlin"
    }

    fn id(&self) -> StateId {
        StateId::AnimatePerlin
    }

    fn should_be_remembered(&self) -> bool {
        true
    }

    fn tick_rate_ms(&self, _globals: &Globals) -> u32 {
        TICK_RATE_MS
    }

    fn entry<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        self.tick = ctx.board.random(MAX_START_TICK);
    }

    fn run<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        let z = (self.tick * 2 * (u32::from(ctx.globals.anim_perlin_speed) + 1)) as f32;
        let mut frame = [BLACK; LED_COUNT];
        for (pixel, (x, y)) in frame.iter_mut().zip(LED_POSITIONS) {
            let hue = noise8(x * HUE_SCALE, y * HUE_SCALE, z);
            let value = (u16::from(noise8(x * VALUE_SCALE, y * VALUE_SCALE, z)) + VALUE_LIFT).min(255);
            *pixel = hsv(((u16::from(hue) * 2) % 255) as u8, 255, value as u8);
        }
        ctx.leds().set_all(&frame);

        self.tick = self.tick.wrapping_add(1);
    }

    fn on_fingerprint_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        menu_unless_locked(ctx)
    }

    fn on_nose_shortpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }
        ctx.globals.anim_perlin_speed = (ctx.globals.anim_perlin_speed + 1) % SPEED_COUNT;
        ctx.mark_globals_dirty();
        let speed = ctx.globals.anim_perlin_speed;
        show_speed_on_bar(ctx, speed + 1);
        None
    }

    fn on_all_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        ctx.toggle_lock();
        None
    }
}
