//! Recording board used by the unit tests of the badge modes

use std::collections::VecDeque;
use std::vec::Vec;

use crate::board::{Board, Radio, UpdateProgress};
use crate::led::FrameBuffer;

#[derive(Debug, Default)]
pub struct TestRadio {
    pub connect_ok: bool,
    pub connects: usize,
    pub receiver_enabled: bool,
    pub disabled: usize,
    pub progress: VecDeque<UpdateProgress>,
    pub sent: Vec<Vec<u8>>,
    pub inbox: VecDeque<Vec<u8>>,
}

impl Radio for TestRadio {
    fn connect(&mut self, _ssid: &str, _password: &str) -> bool {
        self.connects += 1;
        self.connect_ok
    }

    fn enable_update_receiver(&mut self, _password: &str) {
        self.receiver_enabled = true;
    }

    fn disable(&mut self) {
        self.receiver_enabled = false;
        self.disabled += 1;
    }

    fn pump(&mut self) -> UpdateProgress {
        self.progress.pop_front().unwrap_or(UpdateProgress::Idle)
    }

    fn mesh_broadcast(&mut self, payload: &[u8]) {
        self.sent.push(payload.to_vec());
    }

    fn mesh_receive(&mut self, buffer: &mut [u8]) -> Option<usize> {
        let payload = self.inbox.pop_front()?;
        let len = payload.len().min(buffer.len());
        buffer[..len].copy_from_slice(&payload[..len]);
        Some(len)
    }
}

#[derive(Debug, Default)]
pub struct TestBoard {
    pub leds: FrameBuffer,
    pub radio: TestRadio,
    pub delays: Vec<u32>,
    /// Values handed out by `random()`, reduced modulo the bound, 0 once empty
    pub randoms: VecDeque<u32>,
    pub audio: VecDeque<u16>,
}

impl TestBoard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Board for TestBoard {
    type Leds = FrameBuffer;
    type Radio = TestRadio;

    fn leds(&mut self) -> &mut FrameBuffer {
        &mut self.leds
    }

    fn radio(&mut self) -> &mut TestRadio {
        &mut self.radio
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn random(&mut self, below: u32) -> u32 {
        self.randoms.pop_front().unwrap_or(0) % below.max(1)
    }

    fn audio_sample(&mut self) -> u16 {
        self.audio.pop_front().unwrap_or(2048)
    }
}
