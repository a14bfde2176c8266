//! Badge Core
//!
//! Hardware independent part of the badge firmware. Everything in here runs on the
//! badge and on the host, so the control flow can be exercised by plain `cargo test`.
//!
//! # Components
//! - `touch`: calibrates the two touch pads and turns flanks into gestures
//! - `event`: the interrupt safe event queue and the pending gesture flags
//! - `fsm` / `state`: the state machine and the badge modes it switches between
//! - `globals` / `store`: the persisted record shared by all modes
//! - `power`: battery supervision with the brown out ratchet
//! - `led` / `board`: the seams to the LED strip, radio and the rest of the board

#![cfg_attr(not(test), no_std)]

// must stay first so the macros are visible in all other modules
mod fmt;

pub mod board;
pub mod event;
pub mod fsm;
pub mod globals;
pub mod led;
pub mod power;
pub mod pride;
pub mod state;
pub mod store;
pub mod touch;

#[cfg(test)]
mod test_board;

pub use event::{EventQueue, FsmEvent, PendingGestures};
pub use fsm::Fsm;
pub use globals::Globals;
pub use power::{PowerState, PowerSupervisor};
pub use state::{BadgeState, State};
pub use touch::{Gesture, TouchClassifier, TouchZone};
