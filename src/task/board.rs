//! The badge hardware as the state machine sees it

use badge_core::board::Board;
use embassy_rp::adc::Channel;
use embassy_rp::gpio::Pull;
use embassy_time::{block_for, Duration, Instant};
use nanorand::{Rng, WyRand};

use crate::system::resources::{read_adc, MicrophoneResources};
use crate::task::led_strip::Ws2812Strip;
use crate::task::radio::OfflineRadio;

/// Reading of a silent microphone, half of the 12 bit range
const MIC_MIDPOINT: u16 = 2048;

pub struct BadgeBoard {
    leds: Ws2812Strip,
    radio: OfflineRadio,
    rng: WyRand,
    microphone: Channel<'static>,
}

impl BadgeBoard {
    pub fn new(leds: Ws2812Strip, radio: OfflineRadio, r: MicrophoneResources) -> Self {
        let mut microphone = Channel::new_pin(r.mic_pin, Pull::None);

        // the low bits of the microphone are noise, the boot time varies with calibration
        let noise = read_adc(&mut microphone).unwrap_or(0);
        let seed = Instant::now().as_ticks() ^ (u64::from(noise) << 32);

        Self {
            leds,
            radio,
            rng: WyRand::new_seed(seed),
            microphone,
        }
    }
}

impl Board for BadgeBoard {
    type Leds = Ws2812Strip;
    type Radio = OfflineRadio;

    fn leds(&mut self) -> &mut Ws2812Strip {
        &mut self.leds
    }

    fn radio(&mut self) -> &mut OfflineRadio {
        &mut self.radio
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }

    fn random(&mut self, below: u32) -> u32 {
        if below == 0 {
            return 0;
        }
        self.rng.generate_range(0..below)
    }

    fn audio_sample(&mut self) -> u16 {
        read_adc(&mut self.microphone).unwrap_or(MIC_MIDPOINT)
    }
}
