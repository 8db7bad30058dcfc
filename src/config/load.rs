use std::{env, path::PathBuf};

use url::Url;

use super::schema::{ChannelBackend, LoggingSettings, Settings};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `CADENZA__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CADENZA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        let sim = &self.simulation;
        if sim.tick_ms == 0 {
            return Err("simulation.tick_ms must be >= 1".to_string());
        }
        if sim.min_step <= 0.0
            || !sim.min_step.is_finite()
            || !sim.max_step.is_finite()
            || sim.min_step > sim.max_step
        {
            return Err("simulation steps must satisfy 0 < min_step <= max_step".to_string());
        }
        if !(0.0..=1.0).contains(&sim.failure_rate) {
            return Err("simulation.failure_rate must be between 0.0 and 1.0".to_string());
        }
        if let Err(e) = Url::parse(&self.channel.endpoint) {
            return Err(format!("channel.endpoint is not a valid URL: {e}"));
        }
        if self.channel.backend == ChannelBackend::Relay {
            if self.relay.feed_path.is_none() {
                return Err("relay backend requires relay.feed_path".to_string());
            }
            if self.relay.sink_path.is_none() {
                return Err("relay backend requires relay.sink_path".to_string());
            }
        }
        if self.ui.placeholder_interval_ms == 0 {
            return Err("ui.placeholder_interval_ms must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `CADENZA_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CADENZA_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/cadenza/config.toml`
/// or `~/.config/cadenza/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("cadenza").join("config.toml"))
}

/// Compute the default log file, `$XDG_STATE_HOME/cadenza/cadenza.log` or
/// `~/.local/state/cadenza/cadenza.log` when `XDG_STATE_HOME` is not set.
pub fn default_log_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("cadenza").join("cadenza.log"))
}

impl LoggingSettings {
    /// Where log output goes: the configured file, else the default state path.
    pub fn resolve_file(&self) -> Option<PathBuf> {
        self.file.clone().or_else(default_log_path)
    }
}
