use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use emg_types::RecorderConfig;

/// Used when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

/// Load the recorder configuration.
///
/// With no explicit path a missing `./config.json` falls back to the built-in
/// defaults. An explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<RecorderConfig> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound && !explicit => {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(RecorderConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Could not read configuration file at '{}'", path.display())
            })
        }
    };

    let config: RecorderConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Could not parse configuration file at '{}'", path.display()))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emg_types::SmoothingKind;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "filter": { "smoothing": { "kind": "exponential", "alpha": 0.5 } } }"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.filter.smoothing, SmoothingKind::Exponential { alpha: 0.5 });
        assert_eq!(config.hub, RecorderConfig::default().hub);
        assert_eq!(config.capture.ticks_per_round, 100);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().starts_with("Could not parse"));
    }
}
