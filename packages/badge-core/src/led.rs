//! LED Strip
//!
//! Layout of the 17 pixel strip and the drawing helpers the badge modes use.
//!
//! The strip starts with the six dragon head pixels followed by the eleven pixels of
//! the bar. Implementors of [`LedStrip`] only provide the frame buffer and the push to
//! the hardware, everything else is derived from that.

use core::ops::Range;

use smart_leds::hsv::{hsv2rgb, Hsv};
pub use smart_leds::RGB8;

/// Total number of pixels
pub const LED_COUNT: usize = 17;
/// Number of pixels in the dragon head
pub const DRAGON_LED_COUNT: usize = 6;
/// Number of pixels in the bar
pub const BAR_LED_COUNT: usize = 11;
/// Index of the first bar pixel
pub const BAR_OFFSET: usize = DRAGON_LED_COUNT;

/// One color per pixel, dragon first
pub type Frame = [RGB8; LED_COUNT];

/// Named parts of the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    DragonNose,
    DragonMuzzle,
    DragonEye,
    DragonCheek,
    DragonEarBottom,
    DragonEarTop,
    /// All dragon head pixels
    Dragon,
    /// All bar pixels
    Bar,
}

impl Region {
    /// Pixel indices covered by the region
    pub const fn pixels(self) -> Range<usize> {
        match self {
            Region::DragonNose => 0..1,
            Region::DragonMuzzle => 1..2,
            Region::DragonEye => 2..3,
            Region::DragonCheek => 3..4,
            Region::DragonEarBottom => 4..5,
            Region::DragonEarTop => 5..6,
            Region::Dragon => 0..DRAGON_LED_COUNT,
            Region::Bar => BAR_OFFSET..LED_COUNT,
        }
    }
}

/// Approximate pixel positions on the front of the badge in millimeters
pub const LED_POSITIONS: [(f32, f32); LED_COUNT] = [
    (33.0, 15.0),
    (24.0, 11.0),
    (17.0, 5.0),
    (12.0, 15.0),
    (4.0, 6.0),
    (4.0, -2.0),
    (-10.0, 2.0),
    (-10.0, 8.0),
    (-10.0, 14.0),
    (-10.0, 20.0),
    (-10.0, 26.0),
    (-10.0, 32.0),
    (-10.0, 38.0),
    (-10.0, 44.0),
    (-10.0, 50.0),
    (-10.0, 56.0),
    (-10.0, 62.0),
];

pub const BLACK: RGB8 = RGB8::new(0, 0, 0);
pub const RED: RGB8 = RGB8::new(255, 0, 0);
pub const GREEN: RGB8 = RGB8::new(0, 128, 0);
pub const BLUE: RGB8 = RGB8::new(0, 0, 255);
pub const PURPLE: RGB8 = RGB8::new(128, 0, 128);
pub const WHITE: RGB8 = RGB8::new(255, 255, 255);

/// Converts a hue/saturation/value triple to RGB
pub fn hsv(hue: u8, sat: u8, val: u8) -> RGB8 {
    hsv2rgb(Hsv { hue, sat, val })
}

/// Maps a hue in degrees (0..360) to the 8 bit hue scale
pub fn hue_from_degrees(degrees: u16) -> u8 {
    ((u32::from(degrees % 360) * 255) / 359) as u8
}

/// Scales a color down, 255 keeps it unchanged
pub fn scale(color: RGB8, factor: u8) -> RGB8 {
    let f = u16::from(factor);
    RGB8::new(
        ((u16::from(color.r) * f) / 255) as u8,
        ((u16::from(color.g) * f) / 255) as u8,
        ((u16::from(color.b) * f) / 255) as u8,
    )
}

/// Linear blend from `a` (amount 0) to `b` (amount 255)
pub fn blend(a: RGB8, b: RGB8, amount: u8) -> RGB8 {
    let mix = |x: u8, y: u8| -> u8 {
        let x = i32::from(x);
        let y = i32::from(y);
        (x + ((y - x) * i32::from(amount)) / 255) as u8
    };
    RGB8::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

/// Synchronous access to the LED strip.
///
/// Every drawing helper pushes the frame before returning, so the change is visible
/// once the call returns.
pub trait LedStrip {
    fn frame(&self) -> &Frame;

    fn frame_mut(&mut self) -> &mut Frame;

    /// Pushes the frame buffer to the pixels
    fn show(&mut self);

    /// Sets the global brightness, clamped to 0..=100 percent
    fn set_brightness_percent(&mut self, percent: u8);

    fn brightness_percent(&self) -> u8;

    /// Switches the supply of the strip
    fn set_power(&mut self, on: bool);

    fn set_all(&mut self, frame: &Frame) {
        *self.frame_mut() = *frame;
        self.show();
    }

    fn set_all_solid(&mut self, color: RGB8) {
        self.frame_mut().fill(color);
        self.show();
    }

    fn set_region(&mut self, region: Region, color: RGB8) {
        self.frame_mut()[region.pixels()].fill(color);
        self.show();
    }

    fn set_dragon(&mut self, colors: &[RGB8; DRAGON_LED_COUNT]) {
        self.frame_mut()[Region::Dragon.pixels()].copy_from_slice(colors);
        self.show();
    }

    fn set_bar(&mut self, colors: &[RGB8; BAR_LED_COUNT]) {
        self.frame_mut()[Region::Bar.pixels()].copy_from_slice(colors);
        self.show();
    }

    /// Lights a single bar pixel, all others show `background`
    fn set_bar_cursor(&mut self, idx: u8, cursor: RGB8, background: RGB8) {
        let bar = &mut self.frame_mut()[Region::Bar.pixels()];
        for (i, pixel) in bar.iter_mut().enumerate() {
            *pixel = if i == usize::from(idx) { cursor } else { background };
        }
        self.show();
    }

    /// Fills the bar from the start in proportion to `percent`
    fn fill_bar_proportionally(&mut self, percent: u8, fill: RGB8, background: RGB8) {
        let lit = bar_pixels_for_percent(percent);
        let bar = &mut self.frame_mut()[Region::Bar.pixels()];
        for (i, pixel) in bar.iter_mut().enumerate() {
            *pixel = if i < lit { fill } else { background };
        }
        self.show();
    }

    fn clear(&mut self) {
        self.set_all_solid(BLACK);
    }
}

/// Number of bar pixels lit for a percentage, rounded to the nearest pixel
pub fn bar_pixels_for_percent(percent: u8) -> usize {
    let lit = libm::roundf(f32::from(percent) * BAR_LED_COUNT as f32 / 100.0) as usize;
    lit.min(BAR_LED_COUNT)
}

/// In-memory strip, useful for rendering off screen and in tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub frame: Frame,
    pub brightness_percent: u8,
    pub powered: bool,
    /// Number of times the frame was pushed
    pub shows: usize,
}

impl FrameBuffer {
    pub const fn new() -> Self {
        Self {
            frame: [BLACK; LED_COUNT],
            brightness_percent: 100,
            powered: true,
            shows: 0,
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LedStrip for FrameBuffer {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn show(&mut self) {
        self.shows += 1;
    }

    fn set_brightness_percent(&mut self, percent: u8) {
        self.brightness_percent = percent.min(100);
    }

    fn brightness_percent(&self) -> u8 {
        self.brightness_percent
    }

    fn set_power(&mut self, on: bool) {
        self.powered = on;
    }
}
