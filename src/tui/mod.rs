// Terminal module - Raw-mode host that drives a serial bridge
pub mod host;
pub mod keys;

pub use host::TerminalHost;
pub use keys::key_to_input;
