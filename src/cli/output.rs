use crate::cli::args::OutputFormat;
use crate::domain::config::SerialMonConfig;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::SerialMonError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

#[derive(Serialize)]
struct ConfigPaths<'a> {
    global: &'a Path,
    project: Option<&'a Path>,
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render_config(&self, config: &SerialMonConfig) -> Result<String, OutputError> {
        Ok(match self.format {
            OutputFormat::Text => toml::to_string_pretty(config)?,
            OutputFormat::Json => serde_json::to_string_pretty(config)?,
        })
    }

    pub fn write_config(&self, config: &SerialMonConfig) -> Result<(), OutputError> {
        let rendered = self.render_config(config)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", rendered.trim_end())?;
        Ok(())
    }

    pub fn write_paths(&self, global: &Path, project: Option<&Path>) -> Result<(), OutputError> {
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Text => {
                writeln!(stdout, "global:  {}", global.display())?;
                match project {
                    Some(path) => writeln!(stdout, "project: {}", path.display())?,
                    None => writeln!(stdout, "project: (none)")?,
                }
            }
            OutputFormat::Json => {
                let paths = ConfigPaths { global, project };
                writeln!(stdout, "{}", serde_json::to_string_pretty(&paths)?)?;
            }
        }
        Ok(())
    }

    pub fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => println!("{}", serde_json::json!({ "message": message })),
        }
        Ok(())
    }

    pub fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => eprintln!("Error: {}", error),
            OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": error })),
        }
        Ok(())
    }
}
