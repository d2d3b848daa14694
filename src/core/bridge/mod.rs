// Bridge module - Terminal-facing adapter over a serial transport
pub mod bridge;
pub mod decoder;
pub mod event;
pub mod normalize;

pub use bridge::{SerialBridge, CLOSE_KEY, EXIT_CODE, RESET_KEY};
pub use decoder::Utf8StreamDecoder;
pub use event::{BridgeEvent, TerminalDimensions};
pub use normalize::normalize_output;
