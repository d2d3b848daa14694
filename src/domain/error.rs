use thiserror::Error;

/// serialmon unified error type
#[derive(Error, Debug)]
pub enum SerialMonError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Reset sequence failed: {message}")]
    Reset { message: String },

    #[error("Unable to write to serial port")]
    WriteUnavailable,

    #[error("Device not connected")]
    DeviceNotConnected,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type SerialMonResult<T> = Result<T, SerialMonError>;

impl SerialMonError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
