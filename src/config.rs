use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::generation::ProviderKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Overrides the default database location
    pub db_path: Option<PathBuf>,
    pub provider: ProviderKind,
    pub default_level: u8,
    /// Quiz targets drawn uniformly instead of by practice weight
    pub random_cards: bool,
    pub window_size: usize,
    pub min_weight: f64,
    pub reuse_stored_probability: f64,
    pub sentence_pool_samples: usize,
    pub shuffle_attempts: usize,
    pub distractor_count: usize,
    pub matching_pairs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            provider: ProviderKind::default(),
            default_level: 1,
            random_cards: false,
            window_size: 10,
            min_weight: 0.1,
            reuse_stored_probability: 0.7,
            sentence_pool_samples: 5,
            shuffle_attempts: 10,
            distractor_count: 3,
            matching_pairs: 4,
        }
    }
}

impl Config {
    /// Replace out-of-range values with their defaults, warning about each.
    pub fn sanitized(mut self) -> Self {
        let d = Config::default();
        if !(0.0..=1.0).contains(&self.reuse_stored_probability) {
            reset("reuse_stored_probability", &mut self.reuse_stored_probability, d.reuse_stored_probability);
        }
        if !(self.min_weight > 0.0 && self.min_weight <= 1.0) {
            reset("min_weight", &mut self.min_weight, d.min_weight);
        }
        for (field, value, default) in [
            ("window_size", &mut self.window_size, d.window_size),
            ("sentence_pool_samples", &mut self.sentence_pool_samples, d.sentence_pool_samples),
            ("shuffle_attempts", &mut self.shuffle_attempts, d.shuffle_attempts),
            ("distractor_count", &mut self.distractor_count, d.distractor_count),
            ("matching_pairs", &mut self.matching_pairs, d.matching_pairs),
        ] {
            if *value == 0 {
                reset(field, value, default);
            }
        }
        self
    }
}

fn reset<T: std::fmt::Debug>(field: &str, value: &mut T, default: T) {
    warn!("config {field} = {value:?} is out of range, using {default:?}");
    *value = default;
}

/// Loads and saves [`Config`].
pub trait ConfigStore {
    /// Never fails: a missing or unreadable file gives the defaults.
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

/// `config.json` in the platform config directory, see [`AppDirs::config_path`].
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self::with_path(AppDirs::config_path())
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
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("no config at {} ({e}), using defaults", self.path.display());
                return Config::default();
            }
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(),
            Err(e) => {
                warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            db_path: Some(dir.path().join("cards.db")),
            provider: ProviderKind::Disabled,
            default_level: 3,
            random_cards: true,
            reuse_stored_probability: 0.5,
            ..Config::default()
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_level": 2, "provider": "disabled"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.default_level, 2);
        assert_eq!(cfg.provider, ProviderKind::Disabled);
        assert_eq!(cfg.window_size, 10);
        assert_eq!(cfg.matching_pairs, 4);
    }

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"reuse_stored_probability": 1.5, "min_weight": 0, "window_size": 0, "matching_pairs": 6}"#,
        )
        .unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        let defaults = Config::default();
        assert_eq!(cfg.reuse_stored_probability, defaults.reuse_stored_probability);
        assert_eq!(cfg.min_weight, defaults.min_weight);
        assert_eq!(cfg.window_size, defaults.window_size);
        assert_eq!(cfg.matching_pairs, 6);
    }

    #[test]
    fn missing_or_garbage_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let missing = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(missing.load(), Config::default());

        let path = dir.path().join("bad.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }
}
