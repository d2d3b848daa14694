use crate::cli::args::{Args, Command, ConfigArgs, ConfigCommand, MonitorArgs};
use crate::cli::output::ConsoleWriter;
use crate::core::bridge::{SerialBridge, EXIT_CODE};
use crate::core::reset::reset_for_mode;
use crate::core::transport::Transport;
use crate::domain::config::SerialMonConfig;
use crate::domain::error::{SerialMonError, SerialMonResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::SerialPortTransport;
use crate::tui::TerminalHost;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Exit code of `config validate` when the configuration is broken
pub const VALIDATION_FAILED: i32 = 1;

/// Execute CLI command and return the process exit code
pub async fn execute_command(args: Args) -> SerialMonResult<i32> {
    let writer = ConsoleWriter::new(args.output);

    let config_manager = ConfigManager::new()?;
    let loaded = match &args.config {
        Some(path) => config_manager.load_config_from_path(path.as_ref()),
        None => config_manager.load_config(),
    };

    if !args.quiet {
        if let Ok(config) = &loaded {
            let raw_terminal = matches!(args.command, Command::Monitor(_));
            init_logging(&config.global, args.verbose, raw_terminal)?;
        }
    }

    match args.command {
        Command::Monitor(monitor_args) => execute_monitor(monitor_args, &writer, loaded?).await,
        Command::Config(config_args) => execute_config_command(config_args, &writer, loaded, &config_manager),
        Command::Version => {
            writer.write_message(&format!("serialmon {}", env!("CARGO_PKG_VERSION")))?;
            Ok(EXIT_CODE)
        }
    }
}

async fn execute_monitor(
    args: MonitorArgs,
    writer: &ConsoleWriter,
    mut config: SerialMonConfig,
) -> SerialMonResult<i32> {
    args.apply(&mut config);

    let transport: Arc<dyn Transport> = Arc::new(SerialPortTransport::open(&config.serial)?);
    let reset = reset_for_mode(config.monitor.reset);
    let (bridge, events) = SerialBridge::new(transport, reset, config.monitor.clone());

    info!(session = %bridge.session_id(), port = %config.serial.port, "Starting monitor");
    writer.write_message(&format!(
        "--- serialmon on {} | Ctrl+] exit | Ctrl+R reset ---",
        config.serial.port
    ))?;

    let host = TerminalHost::new(Arc::new(bridge), events, config.monitor.local_echo);
    host.run().await
}

fn execute_config_command(
    args: ConfigArgs,
    writer: &ConsoleWriter,
    loaded: SerialMonResult<SerialMonConfig>,
    config_manager: &ConfigManager,
) -> SerialMonResult<i32> {
    match args.command {
        ConfigCommand::Show => {
            writer.write_config(&loaded?)?;
        }
        ConfigCommand::Init { path, global } => {
            if global {
                let global_path = config_manager.global_config_path();
                if global_path.exists() {
                    return Err(SerialMonError::config(format!(
                        "Global configuration already exists at '{}'",
                        global_path.display()
                    )));
                }
                config_manager.save_config_to_path(global_path, &SerialMonConfig::default())?;
                writer.write_message(&format!("Global configuration initialized at '{}'", global_path.display()))?;
            } else {
                let dir: PathBuf = match path {
                    Some(path) => path.into(),
                    None => std::env::current_dir()?,
                };
                let file = config_manager.init_project_config(&dir)?;
                writer.write_message(&format!("Project configuration initialized at '{}'", file.display()))?;
            }
        }
        ConfigCommand::Validate { file } => {
            let result = match &file {
                Some(path) => config_manager.load_config_from_path(path.as_ref()),
                None => loaded,
            };
            if let Err(e) = result {
                writer.write_error(&format!("Configuration validation failed: {}", e))?;
                return Ok(VALIDATION_FAILED);
            }
            writer.write_message("Configuration is valid")?;
        }
        ConfigCommand::Path => {
            writer.write_paths(
                config_manager.global_config_path(),
                config_manager.project_config_path().map(|p| p.as_path()),
            )?;
        }
    }

    Ok(EXIT_CODE)
}
