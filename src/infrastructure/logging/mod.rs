// Logging module - Logging infrastructure
use crate::domain::config::GlobalConfig;
use crate::domain::error::{SerialMonError, SerialMonResult};
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Most verbose level allowed on stderr while a raw-mode session owns the TTY
const RAW_TERMINAL_CAP: &str = "warn";

/// Filter used when `RUST_LOG` is unset.
///
/// With `raw_terminal` set and no log file, stderr shares the terminal with
/// the device stream, so the level is capped at `warn`; `--verbose` then only
/// takes effect together with `log_file`.
pub fn default_filter(config: &GlobalConfig, verbose: bool, raw_terminal: bool) -> String {
    let mut level = if verbose {
        "debug"
    } else {
        match config.log_level.as_str() {
            level @ ("error" | "warn" | "info" | "debug" | "trace") => level,
            _ => "info",
        }
    };

    if raw_terminal && config.log_file.is_none() && level != "error" {
        level = RAW_TERMINAL_CAP;
    }

    format!("serialmon={},warn", level)
}

/// Initialize logging system.
///
/// Logs never go to stdout, which belongs to the device stream while a
/// monitor session is running.
pub fn init_logging(config: &GlobalConfig, verbose: bool, raw_terminal: bool) -> SerialMonResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config, verbose, raw_terminal)));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| SerialMonError::config(format!("Failed to open log file {}: {}", path, e)))?;

            registry
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .try_init()
        }
        None => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .with_level(true),
            )
            .try_init(),
    };

    result.map_err(|e| SerialMonError::config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!("serialmon logging system initialized");
    Ok(())
}
