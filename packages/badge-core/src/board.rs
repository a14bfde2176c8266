//! Board Interface
//!
//! The parts of the badge the state machine talks to besides the touch pads: the LED
//! strip, the radio, blocking delays, randomness and the microphone.
//!
//! The firmware implements [`Board`] once and lends it to the state machine on every
//! call, there are no global hardware handles in the core.

use crate::led::LedStrip;

/// Milliseconds since boot
pub type Millis = u64;

/// Progress of a running firmware update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateProgress {
    /// Waiting for an update to start
    Idle,
    /// Receiving, in percent
    Receiving(u8),
    /// Image received, the board is about to restart
    Done,
    Failed,
}

/// Wireless subsystem used for updates and the mesh game
pub trait Radio {
    /// Joins a network. Returns `false` on failure or timeout.
    fn connect(&mut self, ssid: &str, password: &str) -> bool;

    /// Starts accepting firmware updates protected by `password`
    fn enable_update_receiver(&mut self, password: &str);

    /// Stops the update receiver and shuts the radio down
    fn disable(&mut self);

    /// Services the update receiver. Must be called periodically while it is enabled.
    fn pump(&mut self) -> UpdateProgress;

    /// Sends a payload to all badges in range
    fn mesh_broadcast(&mut self, payload: &[u8]);

    /// Copies the next received payload into `buffer` and returns its length
    fn mesh_receive(&mut self, buffer: &mut [u8]) -> Option<usize>;
}

/// Everything the badge modes need from the hardware
pub trait Board {
    type Leds: LedStrip;
    type Radio: Radio;

    fn leds(&mut self) -> &mut Self::Leds;

    fn radio(&mut self) -> &mut Self::Radio;

    /// Blocks the caller. Touch events keep being queued meanwhile.
    fn delay_ms(&mut self, ms: u32);

    /// Random number in `0..below`
    fn random(&mut self, below: u32) -> u32;

    /// Raw 12 bit microphone sample
    fn audio_sample(&mut self) -> u16;
}
