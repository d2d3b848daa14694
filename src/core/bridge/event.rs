use serde::{Deserialize, Serialize};

/// Notification sent from a bridge to its terminal host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Normalized text for the display
    Output(String),
    /// The session ended; carries the exit code
    Closed(i32),
    /// User-visible error that does not end the session
    Error(String),
}

/// Terminal size reported by the host when the session opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalDimensions {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalDimensions {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    pub fn is_valid(&self) -> bool {
        self.columns > 0 && self.rows > 0
    }
}

impl std::fmt::Display for TerminalDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}
