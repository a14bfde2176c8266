//! Tasks and the drivers they own
pub mod battery;
pub mod board;
pub mod flash_storage;
pub mod led_strip;
pub mod orchestrate;
pub mod radio;
pub mod touch_sense;
