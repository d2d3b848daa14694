use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, disable_raw_mode, enable_raw_mode},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::keys::key_to_input;
use crate::core::bridge::{normalize_output, BridgeEvent, SerialBridge, TerminalDimensions, EXIT_CODE};
use crate::domain::error::{SerialMonError, SerialMonResult};

const KEY_POLL: Duration = Duration::from_millis(100);

/// Puts the local terminal in raw mode for as long as it lives
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> SerialMonResult<Self> {
        enable_raw_mode().map_err(|e| SerialMonError::Terminal(e.to_string()))?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Hosts a bridge on the local terminal.
///
/// Device output goes to stdout, key presses are translated and routed to
/// the bridge. The session ends when the bridge fires its close event.
pub struct TerminalHost {
    bridge: Arc<SerialBridge>,
    events: mpsc::UnboundedReceiver<BridgeEvent>,
    local_echo: bool,
    stdout: Stdout,
}

impl TerminalHost {
    pub fn new(
        bridge: Arc<SerialBridge>,
        events: mpsc::UnboundedReceiver<BridgeEvent>,
        local_echo: bool,
    ) -> Self {
        Self {
            bridge,
            events,
            local_echo,
            stdout: io::stdout(),
        }
    }

    /// Run the session and return the bridge's exit code
    pub async fn run(mut self) -> SerialMonResult<i32> {
        let _raw_mode = RawModeGuard::enable()?;

        let dimensions = terminal::size()
            .ok()
            .map(|(columns, rows)| TerminalDimensions::new(columns, rows));

        let bridge = Arc::clone(&self.bridge);
        let mut pump = tokio::spawn(async move { bridge.open(dimensions).await });
        let mut pump_done = false;

        let stop_keys = Arc::new(AtomicBool::new(false));
        let mut keys = spawn_key_reader(Arc::clone(&stop_keys))?;

        let result = loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(BridgeEvent::Output(text)) => {
                        if let Err(e) = self.write_raw(&text) {
                            break Err(e);
                        }
                    }
                    Some(BridgeEvent::Error(message)) => {
                        if let Err(e) = self.write_notice(&message, Color::Red) {
                            break Err(e);
                        }
                    }
                    Some(BridgeEvent::Closed(code)) => break Ok(code),
                    None => break Ok(EXIT_CODE),
                },
                input = keys.recv() => match input {
                    Some(input) => {
                        if self.local_echo {
                            if let Err(e) = self.write_raw(&normalize_output(&input)) {
                                break Err(e);
                            }
                        }
                        self.bridge.handle_input(&input);
                    }
                    None => {
                        warn!("Keyboard input ended, closing session");
                        break Ok(EXIT_CODE);
                    }
                },
                _ = &mut pump, if !pump_done => {
                    pump_done = true;
                    if let Err(e) = self.write_notice("Device stream ended. Press Ctrl+] to exit.", Color::Yellow) {
                        break Err(e);
                    }
                }
            }
        };

        stop_keys.store(true, Ordering::Release);
        self.bridge.close().await;

        if !pump_done {
            if let Err(e) = pump.await {
                debug!("Inbound pump task ended abnormally: {}", e);
            }
        }

        info!("Monitor session finished");
        result
    }

    fn write_raw(&mut self, text: &str) -> SerialMonResult<()> {
        self.stdout.write_all(text.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    fn write_notice(&mut self, message: &str, color: Color) -> SerialMonResult<()> {
        queue!(
            self.stdout,
            SetForegroundColor(color),
            Print(format!("\r\n--- {} ---\r\n", message)),
            ResetColor
        )?;
        self.stdout.flush()?;
        Ok(())
    }
}

fn spawn_key_reader(stop: Arc<AtomicBool>) -> SerialMonResult<mpsc::UnboundedReceiver<String>> {
    let (sender, receiver) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("serialmon-keys".to_string())
        .spawn(move || {
            while !stop.load(Ordering::Acquire) {
                match event::poll(KEY_POLL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        warn!("Polling terminal events failed: {}", e);
                        break;
                    }
                }

                match event::read() {
                    Ok(Event::Key(key)) => {
                        if let Some(input) = key_to_input(key) {
                            if sender.send(input).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Event::Paste(text)) => {
                        if sender.send(text).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Reading terminal events failed: {}", e);
                        break;
                    }
                }
            }
        })?;

    Ok(receiver)
}
