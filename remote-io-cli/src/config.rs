//! Configuration loading and parsing

use anyhow::{Context, Result};
use remote_io_device::{DeviceConfig, Pin, SimulatedPins};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Initial pin stimulus for the simulated board
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub digital: Vec<DigitalLevelConfig>,
    #[serde(default)]
    pub analog: Vec<AnalogLevelConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DigitalLevelConfig {
    pub pin: Pin,
    pub level: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalogLevelConfig {
    pub pin: Pin,
    pub raw: u16,
}

impl SimulationConfig {
    /// Build a simulated board with the configured levels applied
    pub fn build_pins(&self) -> SimulatedPins {
        let mut pins = SimulatedPins::new();
        for entry in &self.digital {
            pins.set_level(entry.pin, entry.level);
        }
        for entry in &self.analog {
            pins.set_analog(entry.pin, entry.raw);
        }
        pins
    }

    /// The bench layout the configuration sweep expects: a released button
    /// on 6, an active IR sensor on 7, a mid-scale analog sensor on 8 and an
    /// idle IR sensor on 9.
    pub fn bench() -> Self {
        Self {
            digital: vec![
                DigitalLevelConfig { pin: 6, level: true },
                DigitalLevelConfig { pin: 7, level: true },
                DigitalLevelConfig { pin: 9, level: true },
            ],
            analog: vec![AnalogLevelConfig { pin: 8, raw: 335 }],
        }
    }
}

/// Which host routine to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Echo,
    Blink,
    #[default]
    Configuration,
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TestKind::Echo => "echo",
            TestKind::Blink => "blink",
            TestKind::Configuration => "configuration",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub test: TestKind,
    /// Configuration sweep iterations
    #[serde(default = "default_loops")]
    pub loops: usize,
    #[serde(default = "default_blink_count")]
    pub blink_count: u16,
    #[serde(default = "default_blink_pin")]
    pub blink_pin: u16,
    /// Pause between sweep iterations and blink toggles
    #[serde(default = "default_pause")]
    pub pause_ms: u64,
    #[serde(default)]
    pub output_format: OutputFormat,
    pub output: Option<PathBuf>,
}

fn default_loops() -> usize {
    10
}

fn default_blink_count() -> u16 {
    5
}

fn default_blink_pin() -> u16 {
    5
}

fn default_pause() -> u64 {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            test: TestKind::default(),
            loops: default_loops(),
            blink_count: default_blink_count(),
            blink_pin: default_blink_pin(),
            pause_ms: default_pause(),
            output_format: OutputFormat::default(),
            output: None,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .device
        .validate()
        .with_context(|| format!("Invalid [device] section in {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_io_device::{DispatchMode, PinDriver};
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [device]
            poll_period_ms = 20
            mode = "echo"

            [[simulation.digital]]
            pin = 6
            level = false

            [[simulation.analog]]
            pin = 8
            raw = 512

            [session]
            test = "blink"
            blink_count = 3
            output_format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.device.poll_period_ms, 20);
        assert_eq!(config.device.mode, DispatchMode::Echo);
        assert_eq!(config.device.range_max, 600);
        assert_eq!(config.simulation.digital.len(), 1);
        assert_eq!(config.simulation.analog[0].raw, 512);
        assert_eq!(config.session.test, TestKind::Blink);
        assert_eq!(config.session.blink_count, 3);
        assert_eq!(config.session.blink_pin, 5);
        assert_eq!(config.session.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.device.bus_address, 0x08);
        assert_eq!(config.session.test, TestKind::Configuration);
        assert_eq!(config.session.loops, 10);
        assert!(config.session.output.is_none());
    }

    #[test]
    fn test_build_pins_applies_levels() {
        let mut pins = SimulationConfig::bench().build_pins();
        assert!(pins.digital_read(6));
        assert!(!pins.digital_read(5));
        assert_eq!(pins.analog_read(8), 335);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\ntest = \"echo\"\nloops = 2").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.session.test, TestKind::Echo);
        assert_eq!(config.session.loops, 2);
    }

    #[test]
    fn test_load_config_rejects_invalid_device() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[device]\npoll_period_ms = 0").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/remote-io.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
