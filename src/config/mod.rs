//! Client configuration
//!
//! Settings are layered: built-in defaults, then an optional
//! `openconvert.toml`, then `OPENCONVERT_*` environment variables, then CLI
//! flags (CLI > env > file > defaults).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Cli;

/// Top-level settings for the conversion client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Network endpoint settings
    #[serde(default)]
    pub network: NetworkSettings,
    /// Conversion behavior settings
    #[serde(default)]
    pub conversion: ConversionSettings,
}

/// Where to reach the agent network.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkSettings {
    /// Network host
    #[serde(default = "default_host")]
    pub host: String,
    /// Network port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Timing knobs for conversions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionSettings {
    /// Per-file response timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// How long a discovery query waits for the network
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_seconds: u64,
}

fn default_host() -> String {
    "network.openconvert.ai".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_timeout() -> u64 {
    60
}

fn default_discovery_timeout() -> u64 {
    10
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            discovery_timeout_seconds: default_discovery_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: NetworkSettings::default(),
            conversion: ConversionSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default locations.
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_file(Path::new("openconvert.toml"))
    }

    /// Load settings from a specific config file (optional) plus environment.
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("OPENCONVERT").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        Ok(settings)
    }

    /// Create settings from CLI arguments (config file and CLI overrides).
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::from_file(&cli.config)?;
        settings.apply_cli_overrides(cli);
        Ok(settings)
    }

    /// Apply CLI argument overrides to settings.
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.network.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.network.port = port;
        }
        if let Some(timeout) = cli.timeout {
            self.conversion.timeout_seconds = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.network.host, "network.openconvert.ai");
        assert_eq!(settings.network.port, 8765);
        assert_eq!(settings.conversion.timeout_seconds, 60);
        assert_eq!(settings.conversion.discovery_timeout_seconds, 10);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = Settings::from_file(Path::new("/nonexistent/openconvert.toml")).unwrap();
        assert_eq!(settings.network.port, 8765);
    }

    #[test]
    fn test_file_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("openconvert.toml");
        std::fs::write(
            &path,
            r#"
[network]
host = "localhost"
port = 9000

[conversion]
timeout_seconds = 5
"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.network.host, "localhost");
        assert_eq!(settings.network.port, 9000);
        assert_eq!(settings.conversion.timeout_seconds, 5);
        // Unspecified keys keep their defaults
        assert_eq!(settings.conversion.discovery_timeout_seconds, 10);
    }
}
