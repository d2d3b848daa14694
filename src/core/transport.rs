use crate::domain::error::SerialMonResult;
use async_trait::async_trait;
use std::time::Duration;

/// Exclusive handle on the transport's writable side.
///
/// The handle is released when dropped. Callers acquire it, write once and
/// drop it within the same synchronous step.
pub trait TransportWriter {
    fn write(&mut self, data: &[u8]) -> SerialMonResult<()>;
}

/// Duplex byte channel to a serial device.
///
/// The bridge borrows a transport for the lifetime of one session and never
/// owns connection setup.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Configured baud rate
    fn baud_rate(&self) -> u32;

    /// Next chunk from the device.
    ///
    /// `Ok(None)` signals end of stream. An empty chunk is treated the same
    /// way by the bridge.
    async fn raw_read(&self) -> SerialMonResult<Option<Vec<u8>>>;

    /// Whether the underlying device still exposes a readable channel
    fn is_readable(&self) -> bool;

    /// Acquire the writer, or `None` if the device has no writable channel
    fn writer(&self) -> Option<Box<dyn TransportWriter + '_>>;

    /// Release the device
    async fn disconnect(&self) -> SerialMonResult<()>;

    /// Wait until the device lock is released. Returns `false` on timeout.
    async fn wait_for_unlock(&self, timeout: Duration) -> bool;

    /// Drive the DTR control line
    fn set_dtr(&self, level: bool) -> SerialMonResult<()>;

    /// Drive the RTS control line
    fn set_rts(&self, level: bool) -> SerialMonResult<()>;

    /// USB product id of the adapter, when the port is USB attached
    fn usb_product_id(&self) -> Option<u16> {
        None
    }
}
