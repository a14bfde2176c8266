//! WS2812 LED strip
//!
//! Drives the 17 pixels through a PIO state machine. The strip sits behind a 5 V boost
//! converter that is switched off in brown out to save the battery.
//!
//! The badge modes draw synchronously, so every push waits for the DMA transfer to
//! finish before returning.

use badge_core::led::{scale, Frame, LedStrip, BLACK, LED_COUNT};
use defmt::debug;
use embassy_futures::block_on;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};

use crate::system::resources::{Irqs, LedResources};

/// Brightness after boot, until the persisted value is applied
const DEFAULT_BRIGHTNESS_PERCENT: u8 = 40;

pub struct Ws2812Strip {
    ws2812: PioWs2812<'static, PIO0, 0, LED_COUNT>,
    boost_enable: Output<'static>,
    frame: Frame,
    brightness_percent: u8,
}

impl Ws2812Strip {
    /// Loads the WS2812 program and powers the strip up dark
    pub fn new(r: LedResources) -> Self {
        let Pio { mut common, sm0, .. } = Pio::new(r.pio, Irqs);
        let program = PioWs2812Program::new(&mut common);
        let ws2812 = PioWs2812::new(&mut common, sm0, r.dma, r.data_pin, &program);

        let mut strip = Self {
            ws2812,
            boost_enable: Output::new(r.boost_enable_pin, Level::High),
            frame: [BLACK; LED_COUNT],
            brightness_percent: DEFAULT_BRIGHTNESS_PERCENT,
        };
        strip.show();
        strip
    }
}

impl LedStrip for Ws2812Strip {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn show(&mut self) {
        // 100 % maps to full scale
        let factor = (u16::from(self.brightness_percent) * 255 / 100) as u8;
        let mut pixels = [BLACK; LED_COUNT];
        for (pixel, color) in pixels.iter_mut().zip(self.frame.iter()) {
            *pixel = scale(*color, factor);
        }
        block_on(self.ws2812.write(&pixels));
    }

    fn set_brightness_percent(&mut self, percent: u8) {
        self.brightness_percent = percent.min(100);
        debug!("leds: brightness {}%", self.brightness_percent);
        self.show();
    }

    fn brightness_percent(&self) -> u8 {
        self.brightness_percent
    }

    fn set_power(&mut self, on: bool) {
        if on {
            self.boost_enable.set_high();
        } else {
            self.boost_enable.set_low();
        }
    }
}
