//! Shared statics and hardware resources
pub mod event;
pub mod resources;
