use serde::{Deserialize, Serialize};
use std::time::Duration;

/// serialmon configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerialMonConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Serial port settings
    #[serde(default)]
    pub serial: SerialConfig,
    /// Monitor session behaviour
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<String>,
}

/// Serial connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: ParityConfig,
    #[serde(default)]
    pub flow_control: FlowControlConfig,
}

/// Parity configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlConfig {
    #[default]
    None,
    Hardware,
    Software,
}

/// Which reset pulse program to run on open and on Ctrl+R
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetMode {
    /// Pick by USB product id
    #[default]
    Auto,
    Hard,
    UsbJtag,
    None,
}

/// Monitor session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between connecting and the first reset pulse
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// How long close() waits for the device lock to be released
    #[serde(default = "default_unlock_timeout")]
    pub unlock_timeout_ms: u64,
    /// Also send the Ctrl+R byte to the device after triggering a reset
    #[serde(default = "default_forward_reset_key")]
    pub forward_reset_key: bool,
    #[serde(default)]
    pub reset: ResetMode,
    /// Echo typed input on the local terminal
    #[serde(default)]
    pub local_echo: bool,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

fn default_settle_delay() -> u64 {
    100
}

fn default_unlock_timeout() -> u64 {
    1500
}

fn default_forward_reset_key() -> bool {
    true
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: ParityConfig::default(),
            flow_control: FlowControlConfig::default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
            unlock_timeout_ms: default_unlock_timeout(),
            forward_reset_key: default_forward_reset_key(),
            reset: ResetMode::default(),
            local_echo: false,
        }
    }
}

impl MonitorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn unlock_timeout(&self) -> Duration {
        Duration::from_millis(self.unlock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = SerialMonConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: SerialMonConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: SerialMonConfig = toml::from_str("").unwrap();

        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.monitor.settle_delay_ms, 100);
        assert_eq!(config.monitor.unlock_timeout_ms, 1500);
        assert!(config.monitor.forward_reset_key);
        assert_eq!(config.monitor.reset, ResetMode::Auto);
    }

    #[test]
    fn test_partial_sections() {
        let config: SerialMonConfig = toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyACM0"
            parity = "even"

            [monitor]
            reset = "usb-jtag"
            forward_reset_key = false
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.parity, ParityConfig::Even);
        assert_eq!(config.serial.data_bits, 8);
        assert_eq!(config.monitor.reset, ResetMode::UsbJtag);
        assert!(!config.monitor.forward_reset_key);
        assert_eq!(config.monitor.unlock_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_unknown_reset_mode_rejected() {
        let result: Result<SerialMonConfig, _> = toml::from_str("[monitor]\nreset = \"bootloader\"\n");
        assert!(result.is_err());
    }
}
