use std::process::Command;
use std::str;
use tempfile::TempDir;

fn serialmon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_serialmon"))
}

/// CLI interface tests
#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_cli_help() {
        let output = serialmon().arg("--help").output().expect("Failed to execute command");
        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");

        assert!(output.status.success());
        assert!(stdout.contains("Usage:"));
        assert!(stdout.contains("monitor"));
        assert!(stdout.contains("config"));
    }

    #[test]
    fn test_cli_monitor_help() {
        let output = serialmon()
            .args(["monitor", "--help"])
            .output()
            .expect("Failed to execute command");
        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");

        assert!(stdout.contains("--port"));
        assert!(stdout.contains("--baud"));
        assert!(stdout.contains("--reset"));
    }

    #[test]
    fn test_cli_version() {
        let output = serialmon()
            .args(["--quiet", "version"])
            .output()
            .expect("Failed to execute command");
        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");

        assert!(output.status.success());
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_cli_config_show_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.toml");
        std::fs::write(&path, "[serial]\nbaud_rate = 74880\n").unwrap();

        let output = serialmon()
            .args(["--quiet", "--output", "json", "--config"])
            .arg(&path)
            .args(["config", "show"])
            .output()
            .expect("Failed to execute command");

        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["serial"]["baud_rate"], 74880);
    }

    #[test]
    fn test_cli_monitor_missing_port_fails() {
        let output = serialmon()
            .args(["--quiet", "monitor", "--port", "/dev/serialmon-does-not-exist"])
            .output()
            .expect("Failed to execute command");
        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr.contains("serialmon-does-not-exist"));
    }

    #[test]
    fn test_cli_config_validate_good_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.toml");
        std::fs::write(&path, "[monitor]\nreset = \"usb-jtag\"\n").unwrap();

        let output = serialmon()
            .args(["--quiet", "config", "validate"])
            .arg(&path)
            .output()
            .expect("Failed to execute command");
        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");

        assert!(output.status.success());
        assert!(stdout.contains("Configuration is valid"));
    }

    #[test]
    fn test_cli_config_validate_broken_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.toml");
        std::fs::write(&path, "[monitor]\nreset = \"sideways\"\n").unwrap();

        let output = serialmon()
            .args(["--quiet", "config", "validate"])
            .arg(&path)
            .output()
            .expect("Failed to execute command");
        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr.contains("Configuration validation failed"));
        assert!(stderr.contains("board.toml"));
    }

    #[test]
    fn test_cli_config_validate_broken_active_config_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("active.toml");
        std::fs::write(&path, "[serial\nport = ").unwrap();

        let output = serialmon()
            .args(["--quiet", "--config"])
            .arg(&path)
            .args(["config", "validate"])
            .output()
            .expect("Failed to execute command");
        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr.contains("Configuration validation failed"));
        assert!(stderr.contains("active.toml"));
    }
}
