#![allow(dead_code)]

use async_trait::async_trait;
use serialmon::core::bridge::BridgeEvent;
use serialmon::{DeviceReset, SerialMonError, SerialMonResult, Transport, TransportWriter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub type ChunkSender = mpsc::UnboundedSender<SerialMonResult<Option<Vec<u8>>>>;

/// Everything the bridge asked of the transport, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Read,
    Write(Vec<u8>),
    Disconnect,
    WaitForUnlock(Duration),
    Dtr(bool),
    Rts(bool),
    Reset,
}

#[derive(Debug, Clone)]
pub struct MockOptions {
    pub writable: bool,
    pub fail_writes: bool,
    pub unlocks: bool,
    /// Keep reporting a readable channel after disconnect
    pub stays_readable: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            writable: true,
            fail_writes: false,
            unlocks: true,
            stays_readable: false,
        }
    }
}

pub struct MockTransport {
    options: MockOptions,
    calls: Mutex<Vec<Call>>,
    chunks: tokio::sync::Mutex<mpsc::UnboundedReceiver<SerialMonResult<Option<Vec<u8>>>>>,
    readable: AtomicBool,
    writer_active: AtomicBool,
}

impl MockTransport {
    pub fn new(options: MockOptions) -> (Arc<Self>, ChunkSender) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            options,
            calls: Mutex::new(Vec::new()),
            chunks: tokio::sync::Mutex::new(receiver),
            readable: AtomicBool::new(true),
            writer_active: AtomicBool::new(false),
        });
        (transport, sender)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn written(&self) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Write(data) => Some(data),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn writer_active(&self) -> bool {
        self.writer_active.load(Ordering::SeqCst)
    }

    pub fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

struct MockWriter<'a> {
    transport: &'a MockTransport,
}

impl TransportWriter for MockWriter<'_> {
    fn write(&mut self, data: &[u8]) -> SerialMonResult<()> {
        if self.transport.options.fail_writes {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device gone").into());
        }
        self.transport.record(Call::Write(data.to_vec()));
        Ok(())
    }
}

impl Drop for MockWriter<'_> {
    fn drop(&mut self) {
        self.transport.writer_active.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn baud_rate(&self) -> u32 {
        115200
    }

    async fn raw_read(&self) -> SerialMonResult<Option<Vec<u8>>> {
        self.record(Call::Read);
        let mut chunks = self.chunks.lock().await;
        chunks.recv().await.unwrap_or(Ok(None))
    }

    fn is_readable(&self) -> bool {
        self.readable.load(Ordering::SeqCst)
    }

    fn writer(&self) -> Option<Box<dyn TransportWriter + '_>> {
        if !self.options.writable {
            return None;
        }
        let was_active = self.writer_active.swap(true, Ordering::SeqCst);
        assert!(!was_active, "writer acquired twice");
        Some(Box::new(MockWriter { transport: self }))
    }

    async fn disconnect(&self) -> SerialMonResult<()> {
        self.record(Call::Disconnect);
        if !self.options.stays_readable {
            self.readable.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn wait_for_unlock(&self, timeout: Duration) -> bool {
        self.record(Call::WaitForUnlock(timeout));
        self.options.unlocks
    }

    fn set_dtr(&self, level: bool) -> SerialMonResult<()> {
        self.record(Call::Dtr(level));
        Ok(())
    }

    fn set_rts(&self, level: bool) -> SerialMonResult<()> {
        self.record(Call::Rts(level));
        Ok(())
    }
}

/// Reset collaborator that logs into the mock transport's call list
pub struct MockReset {
    transport: Arc<MockTransport>,
    fail: bool,
    at: Mutex<Vec<Instant>>,
}

impl MockReset {
    pub fn new(transport: Arc<MockTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            fail: false,
            at: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(transport: Arc<MockTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            fail: true,
            at: Mutex::new(Vec::new()),
        })
    }

    pub fn times(&self) -> Vec<Instant> {
        self.at.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceReset for MockReset {
    async fn reset(&self, _transport: &dyn Transport) -> SerialMonResult<()> {
        self.transport.record(Call::Reset);
        self.at.lock().unwrap().push(Instant::now());
        if self.fail {
            return Err(SerialMonError::Reset {
                message: "line stuck".to_string(),
            });
        }
        Ok(())
    }
}

pub fn drain(events: &mut mpsc::UnboundedReceiver<BridgeEvent>) -> Vec<BridgeEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn output_text(events: &[BridgeEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            BridgeEvent::Output(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub fn closed_count(events: &[BridgeEvent]) -> usize {
    events.iter().filter(|e| matches!(e, BridgeEvent::Closed(_))).count()
}
