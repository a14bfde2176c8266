//! Board fake that records every call in order

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use badge_core::board::{Board, Radio, UpdateProgress};
use badge_core::led::{Frame, LedStrip, BLACK, LED_COUNT};

/// Shared, ordered record of hardware calls
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub struct RecordingLeds {
    log: CallLog,
    pub frame: Frame,
    pub brightness: u8,
}

impl LedStrip for RecordingLeds {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn show(&mut self) {}

    fn set_brightness_percent(&mut self, percent: u8) {
        self.brightness = percent.min(100);
        self.log.borrow_mut().push(format!("leds.brightness({})", self.brightness));
    }

    fn brightness_percent(&self) -> u8 {
        self.brightness
    }

    fn set_power(&mut self, on: bool) {
        self.log.borrow_mut().push(format!("leds.power({on})"));
    }

    fn clear(&mut self) {
        self.frame = [BLACK; LED_COUNT];
        self.log.borrow_mut().push("leds.clear".into());
    }
}

pub struct RecordingRadio {
    log: CallLog,
    pub connect_ok: bool,
    pub progress: VecDeque<UpdateProgress>,
}

impl Radio for RecordingRadio {
    fn connect(&mut self, _ssid: &str, _password: &str) -> bool {
        self.log.borrow_mut().push("radio.connect".into());
        self.connect_ok
    }

    fn enable_update_receiver(&mut self, _password: &str) {
        self.log.borrow_mut().push("radio.enable_update_receiver".into());
    }

    fn disable(&mut self) {
        self.log.borrow_mut().push("radio.disable".into());
    }

    fn pump(&mut self) -> UpdateProgress {
        self.log.borrow_mut().push("radio.pump".into());
        self.progress.pop_front().unwrap_or(UpdateProgress::Idle)
    }

    fn mesh_broadcast(&mut self, _payload: &[u8]) {
        self.log.borrow_mut().push("radio.mesh_broadcast".into());
    }

    fn mesh_receive(&mut self, _buffer: &mut [u8]) -> Option<usize> {
        None
    }
}

pub struct RecordingBoard {
    pub log: CallLog,
    pub leds: RecordingLeds,
    pub radio: RecordingRadio,
}

impl RecordingBoard {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            leds: RecordingLeds {
                log: log.clone(),
                frame: [BLACK; LED_COUNT],
                brightness: 100,
            },
            radio: RecordingRadio {
                log: log.clone(),
                connect_ok: true,
                progress: VecDeque::new(),
            },
            log,
        }
    }

    /// Recorded calls so far
    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// Position of the first recorded call equal to `call`
    pub fn position(&self, call: &str) -> Option<usize> {
        self.log.borrow().iter().position(|c| c == call)
    }
}

impl Board for RecordingBoard {
    type Leds = RecordingLeds;
    type Radio = RecordingRadio;

    fn leds(&mut self) -> &mut RecordingLeds {
        &mut self.leds
    }

    fn radio(&mut self) -> &mut RecordingRadio {
        &mut self.radio
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(format!("delay({ms})"));
    }

    fn random(&mut self, below: u32) -> u32 {
        below / 2
    }

    fn audio_sample(&mut self) -> u16 {
        2048
    }
}
