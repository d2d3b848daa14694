use crate::core::transport::Transport;
use crate::domain::config::ResetMode;
use crate::domain::error::{SerialMonError, SerialMonResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Espressif's built-in USB-JTAG-serial product id
pub const USB_JTAG_SERIAL_PID: u16 = 0x1001;

/// Out-of-band reset pulse issued to the device
#[async_trait]
pub trait DeviceReset: Send + Sync {
    async fn reset(&self, transport: &dyn Transport) -> SerialMonResult<()>;
}

/// Single step of a control-line program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    Dtr(bool),
    Rts(bool),
    Sleep(u64),
}

/// Named list of control-line steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSequence {
    name: &'static str,
    steps: Vec<ResetStep>,
}

impl ResetSequence {
    /// Pulse EN low through RTS with IO0 left high, so the chip boots the app
    pub fn hard() -> Self {
        use ResetStep::*;
        Self {
            name: "hard",
            steps: vec![Dtr(false), Rts(true), Sleep(100), Rts(false)],
        }
    }

    /// Hard reset for the USB-JTAG-serial peripheral, which needs longer holds
    pub fn usb_jtag() -> Self {
        use ResetStep::*;
        Self {
            name: "usb-jtag",
            steps: vec![Dtr(false), Rts(true), Sleep(200), Rts(false), Sleep(200)],
        }
    }

    pub fn none() -> Self {
        Self {
            name: "none",
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn steps(&self) -> &[ResetStep] {
        &self.steps
    }

    async fn run(&self, transport: &dyn Transport) -> SerialMonResult<()> {
        debug!("Running '{}' reset sequence ({} steps)", self.name, self.steps.len());

        for step in &self.steps {
            match *step {
                ResetStep::Dtr(level) => transport.set_dtr(level).map_err(|e| step_failed(self.name, e))?,
                ResetStep::Rts(level) => transport.set_rts(level).map_err(|e| step_failed(self.name, e))?,
                ResetStep::Sleep(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            }
        }

        Ok(())
    }
}

fn step_failed(name: &str, err: SerialMonError) -> SerialMonError {
    SerialMonError::Reset {
        message: format!("{} sequence: {}", name, err),
    }
}

#[async_trait]
impl DeviceReset for ResetSequence {
    async fn reset(&self, transport: &dyn Transport) -> SerialMonResult<()> {
        self.run(transport).await
    }
}

/// Picks the USB-JTAG program when the adapter identifies as one, the
/// classic hard reset otherwise.
#[derive(Debug, Clone, Default)]
pub struct UniversalReset;

impl UniversalReset {
    pub fn select(transport: &dyn Transport) -> ResetSequence {
        match transport.usb_product_id() {
            Some(USB_JTAG_SERIAL_PID) => ResetSequence::usb_jtag(),
            _ => ResetSequence::hard(),
        }
    }
}

#[async_trait]
impl DeviceReset for UniversalReset {
    async fn reset(&self, transport: &dyn Transport) -> SerialMonResult<()> {
        let sequence = Self::select(transport);
        info!("Resetting device ({})", sequence.name());
        sequence.run(transport).await
    }
}

/// Build the reset collaborator for a configured mode
pub fn reset_for_mode(mode: ResetMode) -> Arc<dyn DeviceReset> {
    match mode {
        ResetMode::Auto => Arc::new(UniversalReset),
        ResetMode::Hard => Arc::new(ResetSequence::hard()),
        ResetMode::UsbJtag => Arc::new(ResetSequence::usb_jtag()),
        ResetMode::None => Arc::new(ResetSequence::none()),
    }
}
