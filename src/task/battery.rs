//! Battery voltage sampling
//!
//! Reads the VSYS divider through the shared ADC. Each battery check takes a burst
//! of conversions and uses their median, the power supervisor converts the result
//! into a voltage.

use badge_core::power::{BatterySampler, MedianBatteryAdc};
use defmt::warn;
use embassy_rp::adc::Channel;
use embassy_rp::gpio::Pull;

use crate::system::resources::{read_adc, BatteryResources};

/// Battery reading as the power supervisor consumes it
pub type VsysAdc = MedianBatteryAdc<VsysSampler>;

pub struct VsysSampler {
    channel: Channel<'static>,
}

impl VsysSampler {
    pub fn new(r: BatteryResources) -> Self {
        Self {
            channel: Channel::new_pin(r.vsys_pin, Pull::None),
        }
    }
}

impl BatterySampler for VsysSampler {
    fn sample(&mut self) -> Option<u16> {
        let raw = read_adc(&mut self.channel);
        if raw.is_none() {
            warn!("battery: ADC conversion failed");
        }
        raw
    }
}
