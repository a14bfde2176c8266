use super::{compose, menu_unless_locked, Context, State, StateId, Transition};
use crate::board::Board;
use crate::led::{hsv, LedStrip, BAR_LED_COUNT, BLACK, DRAGON_LED_COUNT};

/// Full scale of the 12 bit microphone samples
const SAMPLE_RANGE: u32 = 4096;
/// Highest level the meter shows
const MAX_LEVEL: u32 = 12;
/// Runs after which the peak detector starts over
const PEAK_WINDOW: u32 = 50;
const BAR_HUE: u8 = 110;
const HEAD_HUE: u8 = 0;

/// Maps a peak-to-peak amplitude onto `0..=MAX_LEVEL`
fn level(peak_to_peak: u16) -> u8 {
    (u32::from(peak_to_peak).min(SAMPLE_RANGE) * MAX_LEVEL / SAMPLE_RANGE) as u8
}

/// Sound level meter on the bar, driven by the microphone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VuMeter {
    tick: u32,
    /// Smallest and largest sample of the current window
    peaks: Option<(u16, u16)>,
}

impl VuMeter {
    fn sample<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> u8 {
        if self.tick % PEAK_WINDOW == 0 {
            self.peaks = None;
        }
        let sample = ctx.board.audio_sample();
        let (min, max) = self.peaks.unwrap_or((sample, sample));
        let peaks = (min.min(sample), max.max(sample));
        self.peaks = Some(peaks);
        level(peaks.1 - peaks.0)
    }
}

impl State for VuMeter {
    fn name(&self) -> &'static str {
        "VUMeter"
    }

    fn id(&self) -> StateId {
        StateId::VuMeter
    }

    fn should_be_remembered(&self) -> bool {
        true
    }

    fn entry<B: Board>(&mut self, _ctx: &mut Context<'_, B>) {
        self.tick = 0;
        self.peaks = None;
    }

    fn run<B: Board>(&mut self, ctx: &mut Context<'_, B>) {
        let level = usize::from(self.sample(ctx));

        let head = |val: u8| hsv(HEAD_HUE, 255, val);
        let mut dragon = [BLACK, head(40), head(110), head(255), BLACK, BLACK];
        let mut bar = [BLACK; BAR_LED_COUNT];
        for (i, pixel) in bar.iter_mut().enumerate() {
            *pixel = hsv(BAR_HUE, 255, if level > i { 0 } else { 255 });
        }
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

    /// Shares the hue selection with the matrix animation
    fn on_fingerprint_release<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        if ctx.is_locked() {
            return None;
        }
        ctx.globals.anim_matrix_idx = (ctx.globals.anim_matrix_idx + 1) % 9;
        ctx.mark_globals_dirty();
        self.tick = 0;
        None
    }

    fn on_all_longpress<B: Board>(&mut self, ctx: &mut Context<'_, B>) -> Transition {
        ctx.toggle_lock();
        None
    }
}
