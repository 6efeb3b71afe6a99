// src/config.rs

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::display::DisplayKind;
use crate::error::InitError;
use crate::pipeline::DrainMode;
use crate::timer::DEFAULT_REFRESH_INTERVAL;

/// Player settings. Every field is optional in a config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub refresh_interval_ms: u64,
    pub drain: DrainMode,
    pub exit_at_end: bool,
    pub display: DisplayKind,
    pub backend: BackendKind,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            drain: DrainMode::default(),
            exit_at_end: false,
            display: DisplayKind::default(),
            backend: BackendKind::default(),
        }
    }
}

impl PlayerConfig {
    pub fn load_from_disk(path: &Path) -> Result<Self, InitError> {
        let file = File::open(path)
            .map_err(|e| InitError::Config(format!("{}: {e}", path.display())))?;
        let reader = BufReader::new(file);
        let config: PlayerConfig = serde_json::from_reader(reader)
            .map_err(|e| InitError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn validate(&self) -> Result<(), InitError> {
        if self.refresh_interval_ms == 0 {
            return Err(InitError::Config(
                "refresh interval must be at least 1 ms".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_a_25fps_refresh() {
        let config = PlayerConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_millis(40));
        assert_eq!(config.drain, DrainMode::Exhaustive);
        assert!(!config.exit_at_end);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "drain": "per-frame", "display": "headless" }}"#).unwrap();

        let config = PlayerConfig::load_from_disk(file.path()).unwrap();
        assert_eq!(config.drain, DrainMode::PerFrame);
        assert_eq!(config.display, DisplayKind::Headless);
        assert_eq!(config.refresh_interval_ms, 40);
        assert_eq!(config.backend, BackendKind::Auto);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "refresh_interval_ms": 0 }}"#).unwrap();
        assert!(matches!(
            PlayerConfig::load_from_disk(file.path()),
            Err(InitError::Config(_))
        ));
    }

    #[test]
    fn bad_json_and_missing_files_are_config_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "drain = exhaustive").unwrap();
        assert!(matches!(
            PlayerConfig::load_from_disk(file.path()),
            Err(InitError::Config(_))
        ));
        assert!(matches!(
            PlayerConfig::load_from_disk(Path::new("/nonexistent/player.json")),
            Err(InitError::Config(_))
        ));
    }
}
