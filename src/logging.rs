//! Tracing subscriber setup.

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `logging.filter`. Events are appended without ANSI
/// colours to `logging.file`, or to the default state log. The terminal UI
/// owns stdout and stderr, so when no log path can be resolved events are
/// discarded. Calling this twice leaves the first subscriber in place.
pub fn init(settings: &LoggingSettings) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_ansi(false)
        .with_env_filter(filter);

    match settings.resolve_file() {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_missing_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cadenza").join("cadenza.log");
        let settings = LoggingSettings {
            file: Some(path.clone()),
            ..LoggingSettings::default()
        };

        init(&settings).unwrap();
        assert!(path.is_file());
    }
}
