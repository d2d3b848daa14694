// Serial module - serialport-backed transport
pub mod transport;

pub use transport::SerialPortTransport;
