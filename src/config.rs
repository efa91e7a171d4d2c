use crate::app_dirs::AppDirs;
use crate::geometry::Position;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Invalid setup detected before a session starts. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column (got {columns}x{rows})")]
    EmptyGrid { columns: usize, rows: usize },
    #[error("grid of {columns}x{rows} cannot be laid out (at most {max} per side)")]
    GridTooLarge {
        columns: usize,
        rows: usize,
        max: usize,
    },
    #[error("dwell threshold must be greater than zero")]
    ZeroDwell,
    #[error("shape catalog is empty")]
    EmptyCatalog,
    #[error("shape catalog has no colors")]
    NoColors,
    #[error("shape {index} has cell {position} outside the {columns}x{rows} grid")]
    ShapeOutOfBounds {
        index: usize,
        position: Position,
        columns: usize,
        rows: usize,
    },
    #[error("board geometry is {got:?} (columns, rows) but the grid is {expected:?}")]
    GeometryMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
}

/// User-facing settings, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rows: usize,
    pub columns: usize,
    pub dwell_ms: u64,
    pub fixation_ms: u64,
    pub exit_hold_ms: u64,
    pub session_limit_secs: u64,
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 5,
            columns: 5,
            dwell_ms: 1200,
            fixation_ms: 1200,
            exit_hold_ms: 2400,
            session_limit_secs: 3600,
            tick_ms: 10,
        }
    }
}

/// Largest row or column count; each tile needs at least one terminal cell.
pub const MAX_GRID_SIDE: usize = 256;

/// Validated timing and grid parameters consumed by the session core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialConfig {
    pub rows: usize,
    pub columns: usize,
    pub dwell_threshold: Duration,
    pub fixation_period: Duration,
    pub exit_hold: Duration,
    pub session_limit: Duration,
}

impl Default for TrialConfig {
    fn default() -> Self {
        // defaults always validate
        Self {
            rows: 5,
            columns: 5,
            dwell_threshold: Duration::from_millis(1200),
            fixation_period: Duration::from_millis(1200),
            exit_hold: Duration::from_millis(2400),
            session_limit: Duration::from_secs(3600),
        }
    }
}

impl TrialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.rows > MAX_GRID_SIDE || self.columns > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge {
                columns: self.columns,
                rows: self.rows,
                max: MAX_GRID_SIDE,
            });
        }
        if self.dwell_threshold.is_zero() {
            return Err(ConfigError::ZeroDwell);
        }
        Ok(())
    }
}

impl TryFrom<&Config> for TrialConfig {
    type Error = ConfigError;

    fn try_from(cfg: &Config) -> Result<Self, Self::Error> {
        let trial = TrialConfig {
            rows: cfg.rows,
            columns: cfg.columns,
            dwell_threshold: Duration::from_millis(cfg.dwell_ms),
            fixation_period: Duration::from_millis(cfg.fixation_ms),
            exit_hold: Duration::from_millis(cfg.exit_hold_ms),
            session_limit: Duration::from_secs(cfg.session_limit_secs),
        };
        trial.validate()?;
        Ok(trial)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config"),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "dwell_ms": 800 }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.dwell_ms, 800);
        assert_eq!(cfg.rows, 5);
        assert_eq!(cfg.exit_hold_ms, 2400);
    }

    #[test]
    fn trial_config_from_default_config() {
        let trial = TrialConfig::try_from(&Config::default()).unwrap();
        assert_eq!(trial, TrialConfig::default());
    }

    #[test]
    fn trial_config_rejects_empty_grid_and_zero_dwell() {
        let cfg = Config {
            rows: 0,
            ..Config::default()
        };
        assert_matches!(
            TrialConfig::try_from(&cfg),
            Err(ConfigError::EmptyGrid { rows: 0, columns: 5 })
        );

        let cfg = Config {
            dwell_ms: 0,
            ..Config::default()
        };
        assert_matches!(TrialConfig::try_from(&cfg), Err(ConfigError::ZeroDwell));
    }

    #[test]
    fn trial_config_rejects_grid_too_large_to_lay_out() {
        let cfg = Config {
            columns: 30000,
            ..Config::default()
        };
        assert_matches!(
            TrialConfig::try_from(&cfg),
            Err(ConfigError::GridTooLarge { columns: 30000, rows: 5, max: MAX_GRID_SIDE })
        );

        let cfg = Config {
            rows: MAX_GRID_SIDE,
            columns: MAX_GRID_SIDE,
            ..Config::default()
        };
        assert!(TrialConfig::try_from(&cfg).is_ok());
    }
}
