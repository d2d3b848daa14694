//! serialmon library
//!
//! Bridges a terminal to a microcontroller's serial console: a streaming
//! UTF-8 inbound pump, a keystroke router with detach and reset gestures,
//! and an idempotent teardown that waits for the device lock.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod tui;

pub use crate::core::bridge::{BridgeEvent, SerialBridge, TerminalDimensions};
pub use crate::core::reset::{DeviceReset, ResetSequence, UniversalReset};
pub use crate::core::transport::{Transport, TransportWriter};
pub use crate::domain::config::SerialMonConfig;
pub use crate::domain::error::{SerialMonError, SerialMonResult};
