use crate::core::transport::{Transport, TransportWriter};
use crate::domain::config::{FlowControlConfig, ParityConfig, SerialConfig};
use crate::domain::error::{SerialMonError, SerialMonResult};
use async_trait::async_trait;
use serialport::{SerialPort, SerialPortBuilder, SerialPortType};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const READ_POLL: Duration = Duration::from_millis(100);
const READ_BUFFER_SIZE: usize = 1024;
/// Chunks buffered between the reader thread and `raw_read`
const CHUNK_CAPACITY: usize = 64;
/// Back-off while the chunk buffer is full
const FULL_RETRY: Duration = Duration::from_millis(10);

type Chunk = SerialMonResult<Vec<u8>>;

/// Transport over a local serial port.
///
/// A dedicated reader thread holds the device lock while it runs and feeds
/// chunks to `raw_read`. Writes and control lines go through the shared port
/// handle, which `disconnect` takes away.
pub struct SerialPortTransport {
    port_name: String,
    baud_rate: u32,
    usb_pid: Option<u16>,
    port: Mutex<Option<Box<dyn SerialPort>>>,
    chunks: tokio::sync::Mutex<mpsc::Receiver<Chunk>>,
    shutdown: Arc<AtomicBool>,
    locked: watch::Receiver<bool>,
}

impl SerialPortTransport {
    pub fn open(config: &SerialConfig) -> SerialMonResult<Self> {
        let port = port_builder(config)?.open().map_err(|e| SerialMonError::Transport {
            message: format!("Failed to open serial port {}: {}", config.port, e),
        })?;
        let reader_port = port.try_clone()?;

        info!("Serial port {} opened at {} baud", config.port, config.baud_rate);

        let (chunk_sender, chunk_receiver) = mpsc::channel(CHUNK_CAPACITY);
        let (locked_sender, locked) = watch::channel(true);
        let shutdown = Arc::new(AtomicBool::new(false));

        let reader_shutdown = Arc::clone(&shutdown);
        std::thread::Builder::new()
            .name("serialmon-reader".to_string())
            .spawn(move || read_loop(reader_port, chunk_sender, reader_shutdown, locked_sender))?;

        Ok(Self {
            port_name: config.port.clone(),
            baud_rate: config.baud_rate,
            usb_pid: usb_product_id(&config.port),
            port: Mutex::new(Some(port)),
            chunks: tokio::sync::Mutex::new(chunk_receiver),
            shutdown,
            locked,
        })
    }

    fn port(&self) -> SerialMonResult<MutexGuard<'_, Option<Box<dyn SerialPort>>>> {
        self.port
            .lock()
            .map_err(|_| SerialMonError::transport("serial port handle poisoned"))
    }
}

/// Build a port builder from configuration, rejecting unsupported framing
pub fn port_builder(config: &SerialConfig) -> SerialMonResult<SerialPortBuilder> {
    let data_bits = match config.data_bits {
        5 => serialport::DataBits::Five,
        6 => serialport::DataBits::Six,
        7 => serialport::DataBits::Seven,
        8 => serialport::DataBits::Eight,
        other => return Err(SerialMonError::InvalidInput(format!("data bits {}", other))),
    };

    let stop_bits = match config.stop_bits {
        1 => serialport::StopBits::One,
        2 => serialport::StopBits::Two,
        other => return Err(SerialMonError::InvalidInput(format!("stop bits {}", other))),
    };

    let parity = match config.parity {
        ParityConfig::None => serialport::Parity::None,
        ParityConfig::Even => serialport::Parity::Even,
        ParityConfig::Odd => serialport::Parity::Odd,
    };

    let flow_control = match config.flow_control {
        FlowControlConfig::None => serialport::FlowControl::None,
        FlowControlConfig::Software => serialport::FlowControl::Software,
        FlowControlConfig::Hardware => serialport::FlowControl::Hardware,
    };

    Ok(serialport::new(&config.port, config.baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .flow_control(flow_control)
        .timeout(READ_POLL))
}

fn usb_product_id(port_name: &str) -> Option<u16> {
    let ports = serialport::available_ports().ok()?;
    ports.into_iter().find_map(|info| match info.port_type {
        SerialPortType::UsbPort(usb) if info.port_name == port_name => Some(usb.pid),
        _ => None,
    })
}

fn read_loop(
    mut port: Box<dyn SerialPort>,
    chunks: mpsc::Sender<Chunk>,
    shutdown: Arc<AtomicBool>,
    locked: watch::Sender<bool>,
) {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    while !shutdown.load(Ordering::Acquire) {
        match port.read(&mut buffer) {
            Ok(0) => continue,
            Ok(n) => {
                if !forward_chunk(&chunks, Ok(buffer[..n].to_vec()), &shutdown) {
                    break;
                }
            }
            Err(ref e)
                if matches!(e.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted) =>
            {
                continue;
            }
            Err(e) => {
                error!("Failed to read from serial port: {}", e);
                forward_chunk(&chunks, Err(e.into()), &shutdown);
                break;
            }
        }
    }

    drop(port);
    locked.send_replace(false);
    debug!("Serial reader stopped, device lock released");
}

/// Hand a chunk to `raw_read`, waiting while the buffer is full.
///
/// Returns `false` once the receiver is gone or shutdown was requested, so a
/// full buffer nobody drains anymore never keeps the device locked.
fn forward_chunk(chunks: &mpsc::Sender<Chunk>, chunk: Chunk, shutdown: &AtomicBool) -> bool {
    let mut pending = chunk;
    loop {
        match chunks.try_send(pending) {
            Ok(()) => return true,
            Err(mpsc::error::TrySendError::Closed(_)) => return false,
            Err(mpsc::error::TrySendError::Full(chunk)) => {
                if shutdown.load(Ordering::Acquire) {
                    debug!("Dropping buffered chunk on shutdown");
                    return false;
                }
                pending = chunk;
                std::thread::sleep(FULL_RETRY);
            }
        }
    }
}

struct PortWriter<'a> {
    guard: MutexGuard<'a, Option<Box<dyn SerialPort>>>,
}

impl TransportWriter for PortWriter<'_> {
    fn write(&mut self, data: &[u8]) -> SerialMonResult<()> {
        let port = self.guard.as_mut().ok_or(SerialMonError::DeviceNotConnected)?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Transport for SerialPortTransport {
    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    async fn raw_read(&self) -> SerialMonResult<Option<Vec<u8>>> {
        let mut chunks = self.chunks.lock().await;
        chunks.recv().await.transpose()
    }

    fn is_readable(&self) -> bool {
        self.port().map(|port| port.is_some()).unwrap_or(false)
    }

    fn writer(&self) -> Option<Box<dyn TransportWriter + '_>> {
        let guard = self.port().ok()?;
        if guard.is_none() {
            return None;
        }
        Some(Box::new(PortWriter { guard }))
    }

    async fn disconnect(&self) -> SerialMonResult<()> {
        self.shutdown.store(true, Ordering::Release);

        let port = self.port()?.take();
        if port.is_some() {
            info!("Disconnected from {}", self.port_name);
        }

        Ok(())
    }

    async fn wait_for_unlock(&self, timeout: Duration) -> bool {
        let mut locked = self.locked.clone();
        let released = async move {
            // a dropped sender means the reader thread is gone
            let _ = locked.wait_for(|locked| !*locked).await;
        };

        tokio::time::timeout(timeout, released).await.is_ok()
    }

    fn set_dtr(&self, level: bool) -> SerialMonResult<()> {
        let mut port = self.port()?;
        let port = port.as_mut().ok_or(SerialMonError::DeviceNotConnected)?;
        port.write_data_terminal_ready(level)?;
        Ok(())
    }

    fn set_rts(&self, level: bool) -> SerialMonResult<()> {
        let mut port = self.port()?;
        let port = port.as_mut().ok_or(SerialMonError::DeviceNotConnected)?;
        port.write_request_to_send(level)?;
        Ok(())
    }

    fn usb_product_id(&self) -> Option<u16> {
        self.usb_pid
    }
}

impl Drop for SerialPortTransport {
    fn drop(&mut self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            warn!("Serial transport for {} dropped without disconnect", self.port_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config(port: &str) -> SerialConfig {
        SerialConfig {
            port: port.to_string(),
            ..SerialConfig::default()
        }
    }

    #[test]
    fn test_open_fails_gracefully() {
        // /dev/null is not a tty
        let result = SerialPortTransport::open(&create_test_config("/dev/null"));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_missing_port() {
        let result = SerialPortTransport::open(&create_test_config("/dev/serialmon-does-not-exist"));
        assert!(matches!(result, Err(SerialMonError::Transport { .. })));
    }

    #[test]
    fn test_invalid_framing_rejected() {
        let mut config = create_test_config("/dev/ttyUSB0");
        config.data_bits = 9;
        assert!(matches!(port_builder(&config), Err(SerialMonError::InvalidInput(_))));

        let mut config = create_test_config("/dev/ttyUSB0");
        config.stop_bits = 3;
        assert!(matches!(port_builder(&config), Err(SerialMonError::InvalidInput(_))));
    }

    #[test]
    fn test_builder_accepts_defaults() {
        assert!(port_builder(&create_test_config("/dev/ttyUSB0")).is_ok());
    }

    #[test]
    fn test_forward_chunk_delivers_when_buffer_has_room() {
        let (sender, mut receiver) = mpsc::channel(1);
        let shutdown = AtomicBool::new(false);

        assert!(forward_chunk(&sender, Ok(b"boot".to_vec()), &shutdown));
        assert_eq!(receiver.try_recv().unwrap().unwrap(), b"boot".to_vec());
    }

    #[test]
    fn test_forward_chunk_gives_up_on_full_buffer_after_shutdown() {
        let (sender, _receiver) = mpsc::channel(1);
        let shutdown = AtomicBool::new(false);
        assert!(forward_chunk(&sender, Ok(vec![1]), &shutdown));

        shutdown.store(true, Ordering::Release);
        assert!(!forward_chunk(&sender, Ok(vec![2]), &shutdown));
    }

    #[test]
    fn test_forward_chunk_stops_when_receiver_dropped() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let shutdown = AtomicBool::new(false);

        assert!(!forward_chunk(&sender, Ok(vec![1]), &shutdown));
    }
}
