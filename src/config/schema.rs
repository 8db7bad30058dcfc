use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub channel: ChannelSettings,
    pub simulation: SimulationSettings,
    pub relay: RelaySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelBackend {
    #[serde(alias = "sim", alias = "simulation")]
    Simulated,
    #[serde(alias = "feed", alias = "remote")]
    Relay,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Which backend drives generation progress.
    pub backend: ChannelBackend,
    /// Base URL of the generation backend.
    ///
    /// Recorded and validated; nothing dials it.
    pub endpoint: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            backend: ChannelBackend::Simulated,
            endpoint: "http://localhost:3001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Interval between progress ticks (milliseconds).
    pub tick_ms: u64,
    /// Smallest progress added on a tick.
    pub min_step: f64,
    /// Largest progress added on a tick.
    pub max_step: f64,
    /// Chance per tick that the generation fails instead (0.0 - 1.0).
    pub failure_rate: f64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Prefix of the artifact reference reported on completion.
    pub artifact_base: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            min_step: 0.5,
            max_step: 10.0,
            failure_rate: 0.0,
            seed: None,
            artifact_base: "/api/audio".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Newline-delimited JSON feed (file or named pipe) read by the relay backend.
    pub feed_path: Option<PathBuf>,
    /// File or named pipe the relay backend appends `submitted` messages to,
    /// so the producer learns each generation id.
    pub sink_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Example prompts shown in the empty input, rotated in order.
    pub placeholders: Vec<String>,
    /// How long each placeholder stays up (milliseconds).
    pub placeholder_interval_ms: u64,
    /// Accept a new prompt while another generation is still running.
    pub allow_concurrent: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ Describe it, and cadenza plays it ~ ".to_string(),
            placeholders: vec![
                "A dreamy synthwave track with ethereal vocals".to_string(),
                "Upbeat lo-fi hip hop beat with smooth jazz influences".to_string(),
                "Epic orchestral piece with choir and heavy percussion".to_string(),
                "Chill electronic beats with ambient textures".to_string(),
            ],
            placeholder_interval_ms: 3000,
            allow_concurrent: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Append logs to this file. Defaults to `cadenza.log` under the state
    /// directory (`$XDG_STATE_HOME/cadenza` or `~/.local/state/cadenza`).
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            file: None,
        }
    }
}
