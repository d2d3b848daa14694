use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::domain::config::{FlowControlConfig, ParityConfig, ResetMode, SerialMonConfig};

/// Command line arguments for serialmon
#[derive(Parser, Debug)]
#[command(
    name = "serialmon",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serial monitor for microcontroller consoles",
    long_about = "Attach the local terminal to a microcontroller's serial console. Ctrl+] detaches, Ctrl+R resets the device."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not initialize logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format for non-interactive commands
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach to a device's serial console
    Monitor(MonitorArgs),
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

/// Monitor arguments. Anything left unset comes from the configuration file.
#[derive(ClapArgs, Debug, Default)]
pub struct MonitorArgs {
    /// Serial port path
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Data bits
    #[arg(long)]
    pub data_bits: Option<u8>,

    /// Stop bits
    #[arg(long)]
    pub stop_bits: Option<u8>,

    /// Parity
    #[arg(long, value_enum)]
    pub parity: Option<ParityArg>,

    /// Flow control
    #[arg(long, value_enum)]
    pub flow_control: Option<FlowControlArg>,

    /// Reset program run on open and on Ctrl+R
    #[arg(long, value_enum)]
    pub reset: Option<ResetArg>,

    /// Milliseconds to wait after connecting before the first reset
    #[arg(long)]
    pub settle_delay_ms: Option<u64>,

    /// Milliseconds to wait for the device lock on exit
    #[arg(long)]
    pub unlock_timeout_ms: Option<u64>,

    /// Do not send the Ctrl+R byte to the device after resetting
    #[arg(long)]
    pub no_forward_reset_key: bool,

    /// Echo typed input locally
    #[arg(short, long)]
    pub echo: bool,
}

impl MonitorArgs {
    /// Overlay command line values on a loaded configuration
    pub fn apply(&self, config: &mut SerialMonConfig) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(data_bits) = self.data_bits {
            config.serial.data_bits = data_bits;
        }
        if let Some(stop_bits) = self.stop_bits {
            config.serial.stop_bits = stop_bits;
        }
        if let Some(parity) = self.parity {
            config.serial.parity = parity.into();
        }
        if let Some(flow_control) = self.flow_control {
            config.serial.flow_control = flow_control.into();
        }
        if let Some(reset) = self.reset {
            config.monitor.reset = reset.into();
        }
        if let Some(delay) = self.settle_delay_ms {
            config.monitor.settle_delay_ms = delay;
        }
        if let Some(timeout) = self.unlock_timeout_ms {
            config.monitor.unlock_timeout_ms = timeout;
        }
        if self.no_forward_reset_key {
            config.monitor.forward_reset_key = false;
        }
        if self.echo {
            config.monitor.local_echo = true;
        }
    }
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Directory for the project configuration
        #[arg(short, long)]
        path: Option<String>,
        /// Write the global configuration instead
        #[arg(short, long)]
        global: bool,
    },
    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the active configuration)
        file: Option<String>,
    },
    /// Print the configuration file locations
    Path,
}

/// Parity argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ParityArg {
    None,
    Odd,
    Even,
}

impl From<ParityArg> for ParityConfig {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::None => ParityConfig::None,
            ParityArg::Odd => ParityConfig::Odd,
            ParityArg::Even => ParityConfig::Even,
        }
    }
}

/// Flow control argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FlowControlArg {
    None,
    Software,
    Hardware,
}

impl From<FlowControlArg> for FlowControlConfig {
    fn from(arg: FlowControlArg) -> Self {
        match arg {
            FlowControlArg::None => FlowControlConfig::None,
            FlowControlArg::Software => FlowControlConfig::Software,
            FlowControlArg::Hardware => FlowControlConfig::Hardware,
        }
    }
}

/// Reset program argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ResetArg {
    Auto,
    Hard,
    UsbJtag,
    None,
}

impl From<ResetArg> for ResetMode {
    fn from(arg: ResetArg) -> Self {
        match arg {
            ResetArg::Auto => ResetMode::Auto,
            ResetArg::Hard => ResetMode::Hard,
            ResetArg::UsbJtag => ResetMode::UsbJtag,
            ResetArg::None => ResetMode::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_monitor_overrides() {
        let args = Args::try_parse_from([
            "serialmon",
            "monitor",
            "--port",
            "/dev/ttyACM0",
            "--baud",
            "921600",
            "--reset",
            "usb-jtag",
            "--no-forward-reset-key",
        ])
        .unwrap();

        let Command::Monitor(monitor) = args.command else {
            panic!("expected monitor command");
        };

        let mut config = SerialMonConfig::default();
        monitor.apply(&mut config);

        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 921600);
        assert_eq!(config.monitor.reset, ResetMode::UsbJtag);
        assert!(!config.monitor.forward_reset_key);
        assert_eq!(config.monitor.settle_delay_ms, 100);
    }

    #[test]
    fn test_unset_flags_keep_file_values() {
        let mut config = SerialMonConfig::default();
        config.serial.baud_rate = 74880;
        config.monitor.local_echo = true;

        MonitorArgs::default().apply(&mut config);

        assert_eq!(config.serial.baud_rate, 74880);
        assert!(config.monitor.local_echo);
        assert!(config.monitor.forward_reset_key);
    }
}
