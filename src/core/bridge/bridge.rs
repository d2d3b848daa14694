use crate::core::bridge::decoder::Utf8StreamDecoder;
use crate::core::bridge::event::{BridgeEvent, TerminalDimensions};
use crate::core::bridge::normalize::normalize_output;
use crate::core::reset::DeviceReset;
use crate::core::transport::Transport;
use crate::domain::config::MonitorConfig;
use crate::domain::error::SerialMonError;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Ctrl+] detaches from the device
pub const CLOSE_KEY: char = '\u{1D}';
/// Ctrl+R resets the device
pub const RESET_KEY: char = '\u{12}';
/// Exit code carried by the close event
pub const EXIT_CODE: i32 = 0;

const HEX_PREVIEW_LEN: usize = 32;

/// Terminal-shaped adapter over a serial transport.
///
/// `open` runs the inbound pump until the device stream ends or the bridge
/// is closed. `handle_input` routes keystrokes and `close` tears the device
/// down. Share the bridge behind an `Arc` so the three can be driven from
/// different tasks.
pub struct SerialBridge {
    id: Uuid,
    transport: Arc<dyn Transport>,
    reset: Arc<dyn DeviceReset>,
    config: MonitorConfig,
    events: mpsc::UnboundedSender<BridgeEvent>,
    closed: watch::Sender<bool>,
}

impl SerialBridge {
    /// Create a bridge and the receiving end of its event channel
    pub fn new(
        transport: Arc<dyn Transport>,
        reset: Arc<dyn DeviceReset>,
        config: MonitorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);

        let bridge = Self {
            id: Uuid::new_v4(),
            transport,
            reset,
            config,
            events,
            closed,
        };

        (bridge, receiver)
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Announce the session, reset the device and pump its output until the
    /// stream ends or the bridge is closed.
    pub async fn open(&self, dimensions: Option<TerminalDimensions>) {
        let span = info_span!("bridge", session = %self.id);

        async move {
            match dimensions {
                Some(dims) if dims.is_valid() => debug!("Terminal opened at {}", dims),
                Some(dims) => debug!("Ignoring malformed terminal dimensions {}", dims),
                None => {}
            }

            self.write_line(&format!("Opened with baud rate: {}", self.transport.baud_rate()));

            tokio::time::sleep(self.config.settle_delay()).await;

            if let Err(e) = self.reset.reset(self.transport.as_ref()).await {
                warn!("Initial device reset failed: {}", e);
            }

            self.pump().await;
            info!("Inbound pump stopped");
        }
        .instrument(span)
        .await
    }

    /// Close the session.
    ///
    /// The close event fires at most once per bridge. Device teardown runs on
    /// every call while the device still reports a readable channel.
    pub async fn close(&self) {
        self.mark_closed();

        if self.transport.is_readable() {
            if let Err(e) = self.transport.disconnect().await {
                warn!("Disconnect failed: {}", e);
            }

            let timeout = self.config.unlock_timeout();
            if !self.transport.wait_for_unlock(timeout).await {
                debug!("Device lock not released within {} ms", timeout.as_millis());
            }
        }
    }

    /// Route one keystroke or input chunk from the terminal
    pub fn handle_input(&self, data: &str) {
        if is_close_key(data) {
            debug!("Detach key received");
            self.mark_closed();
            return;
        }

        if data.starts_with(RESET_KEY) {
            self.spawn_reset();
            if !self.config.forward_reset_key {
                return;
            }
        }

        self.write_to_device(data.as_bytes());
    }

    async fn pump(&self) {
        let mut decoder = Utf8StreamDecoder::new();
        let mut closed = self.closed.subscribe();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = async { closed.wait_for(|closed| *closed).await.is_ok() } => {
                    debug!("Bridge closed, abandoning pending read");
                    break;
                }
                chunk = self.transport.raw_read() => chunk,
            };

            let bytes = match chunk {
                Ok(Some(bytes)) if !bytes.is_empty() => bytes,
                Ok(_) => {
                    // a character cut off by the end of the stream shows as U+FFFD
                    let tail = decoder.finish();
                    if !tail.is_empty() {
                        self.write_output(&tail);
                    }
                    info!("Device stream ended");
                    break;
                }
                Err(e) => {
                    warn!("Read from device failed: {}", e);
                    break;
                }
            };

            debug!(
                "Received {} bytes: {}",
                bytes.len(),
                hex::encode(&bytes[..bytes.len().min(HEX_PREVIEW_LEN)])
            );

            let text = decoder.decode(&bytes);
            if !text.is_empty() {
                self.write_output(&text);
            }
        }
    }

    fn mark_closed(&self) {
        let was_closed = self.closed.send_replace(true);
        if !was_closed {
            info!(session = %self.id, "Serial bridge closed");
            self.emit(BridgeEvent::Closed(EXIT_CODE));
        }
    }

    fn spawn_reset(&self) {
        let transport = Arc::clone(&self.transport);
        let reset = Arc::clone(&self.reset);
        let span = info_span!("reset", session = %self.id);

        let task = async move {
            if let Err(e) = reset.reset(transport.as_ref()).await {
                warn!("Device reset failed: {}", e);
            }
        }
        .instrument(span);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => warn!("No async runtime available, reset request dropped"),
        }
    }

    fn write_to_device(&self, data: &[u8]) {
        match self.transport.writer() {
            Some(mut writer) => match writer.write(data) {
                Ok(()) => debug!("Sent {} bytes: {}", data.len(), hex::encode(data)),
                Err(e) => {
                    warn!("Write to device failed: {}", e);
                    self.emit(BridgeEvent::Error(format!("Failed to write to serial port: {}", e)));
                }
            },
            None => {
                warn!("No writable channel on device");
                self.emit(BridgeEvent::Error(SerialMonError::WriteUnavailable.to_string()));
            }
        }
    }

    fn write_line(&self, message: &str) {
        self.write_output(&format!("{}\n", message));
    }

    fn write_output(&self, text: &str) {
        self.emit(BridgeEvent::Output(normalize_output(text)));
    }

    fn emit(&self, event: BridgeEvent) {
        if self.events.send(event).is_err() {
            debug!("Bridge event dropped, receiver is gone");
        }
    }
}

fn is_close_key(data: &str) -> bool {
    let mut chars = data.chars();
    chars.next() == Some(CLOSE_KEY) && chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_key_must_be_alone() {
        assert!(is_close_key("\u{1D}"));
        assert!(!is_close_key("\u{1D}\u{1D}"));
        assert!(!is_close_key("a\u{1D}"));
        assert!(!is_close_key(""));
    }
}
