//! Configuration module for echo-frame-server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use crate::protocols::{FramingMode, DELIMITER, MESSAGE_SIZE};

/// Command-line arguments for the echo server
#[derive(Parser, Debug)]
#[command(name = "echo-frame-server")]
#[command(author = "echo-frame-server authors")]
#[command(version = "0.1.0")]
#[command(about = "A framed TCP echo server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:5555)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen backlog for pending connections
    #[arg(long)]
    pub backlog: Option<u32>,

    /// Framing scheme used for every connection
    #[arg(short = 'f', long, value_enum)]
    pub framing: Option<FramingMode>,

    /// Maximum bytes per receive in the chunked framing modes
    #[arg(short = 'm', long)]
    pub message_size: Option<usize>,

    /// Frame terminator for the delimiter framing modes
    #[arg(short = 'd', long)]
    pub delimiter: Option<char>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub framing: FramingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backlog: default_backlog(),
        }
    }
}

/// Framing-related configuration
#[derive(Debug, Deserialize)]
pub struct FramingConfig {
    #[serde(default = "default_mode")]
    pub mode: FramingMode,
    #[serde(default = "default_message_size")]
    pub message_size: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            message_size: default_message_size(),
            delimiter: default_delimiter(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:5555".to_string()
}

fn default_backlog() -> u32 {
    1
}

fn default_mode() -> FramingMode {
    FramingMode::LengthPrefix
}

fn default_message_size() -> usize {
    MESSAGE_SIZE
}

fn default_delimiter() -> char {
    DELIMITER as char
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub backlog: u32,
    pub framing: FramingMode,
    pub message_size: usize,
    pub delimiter: u8,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    /// Resolve configuration from already-parsed CLI args.
    pub fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Self::merge(cli, toml_config)
    }

    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let delimiter = cli.delimiter.unwrap_or(toml_config.framing.delimiter);
        if !delimiter.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "delimiter '{}' is not a single ASCII byte",
                delimiter
            )));
        }

        let message_size = cli
            .message_size
            .unwrap_or(toml_config.framing.message_size);
        if message_size == 0 {
            return Err(ConfigError::Invalid(
                "message size must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            backlog: cli.backlog.unwrap_or(toml_config.server.backlog),
            framing: cli.framing.unwrap_or(toml_config.framing.mode),
            message_size,
            delimiter: delimiter as u8,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> CliArgs {
        let mut argv = vec!["echo-frame-server"];
        argv.extend_from_slice(args);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.listen, "127.0.0.1:5555");
        assert_eq!(config.server.backlog, 1);
        assert_eq!(config.framing.mode, FramingMode::LengthPrefix);
        assert_eq!(config.framing.message_size, 40);
        assert_eq!(config.framing.delimiter, '#');
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "0.0.0.0:7000"
            backlog = 16

            [framing]
            mode = "delimiter-bytewise"
            message_size = 64
            delimiter = "\n"

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:7000");
        assert_eq!(config.server.backlog, 16);
        assert_eq!(config.framing.mode, FramingMode::DelimiterBytewise);
        assert_eq!(config.framing.message_size, 64);
        assert_eq!(config.framing.delimiter, '\n');
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("[framing]\nmode = \"delimiter\"\n").unwrap();
        assert_eq!(config.framing.mode, FramingMode::Delimiter);
        assert_eq!(config.framing.message_size, 40);
        assert_eq!(config.server.listen, "127.0.0.1:5555");
    }

    #[test]
    fn test_cli_defaults() {
        let config = Config::merge(cli(&[]), TomlConfig::default()).unwrap();
        assert_eq!(config.listen, "127.0.0.1:5555");
        assert_eq!(config.framing, FramingMode::LengthPrefix);
        assert_eq!(config.message_size, 40);
        assert_eq!(config.delimiter, b'#');
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [server]
            listen = "0.0.0.0:7000"

            [framing]
            mode = "delimiter"
            delimiter = "!"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        let args = cli(&[
            "--listen",
            "127.0.0.1:9000",
            "--framing",
            "delimiter-bytewise",
            "--log-level",
            "trace",
        ]);
        let config = Config::merge(args, toml_config).unwrap();

        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.framing, FramingMode::DelimiterBytewise);
        assert_eq!(config.delimiter, b'!');
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_toml_log_level_used_when_cli_default() {
        let toml_config: TomlConfig = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let config = Config::merge(cli(&[]), toml_config).unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_delimiter() {
        let result = Config::merge(cli(&["--delimiter", "é"]), TomlConfig::default());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_message_size() {
        let result = Config::merge(cli(&["--message-size", "0"]), TomlConfig::default());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let args = cli(&["--config", "/nonexistent/echo-frame-server.toml"]);
        assert!(matches!(
            Config::from_args(args),
            Err(ConfigError::FileRead(_, _))
        ));
    }
}
