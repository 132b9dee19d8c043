use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::errors::{GestureMatchError, Result};

/// Configuration for gesture matching
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub input_path: String,
    pub output_base_dir: String,

    /// Weight of the horizontal-axis similarity in the coarse pass
    #[serde(default = "default_prob_h")]
    pub prob_h: f64,

    /// Weight of the vertical-vs-wrist similarity ratio in the coarse pass
    #[serde(default = "default_prob_v")]
    pub prob_v: f64,

    /// Weight of the vertical-vs-fingers similarity ratio in the coarse pass
    #[serde(default = "default_prob_v_f")]
    pub prob_v_f: f64,

    /// Weight of the horizontal-axis similarity in the fine (finger-only) pass
    #[serde(default = "default_prob_f_h")]
    pub prob_f_h: f64,

    /// Weight of each regional similarity ratio in the fine pass
    #[serde(default = "default_prob_f_v")]
    pub prob_f_v: f64,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,
}

/// Immutable per-run snapshot of the five matching weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub prob_h: f64,
    pub prob_v: f64,
    pub prob_v_f: f64,
    pub prob_f_h: f64,
    pub prob_f_v: f64,
}

fn default_prob_h() -> f64 {
    0.4
}

fn default_prob_v() -> f64 {
    0.3
}

fn default_prob_v_f() -> f64 {
    0.3
}

fn default_prob_f_h() -> f64 {
    0.5
}

fn default_prob_f_v() -> f64 {
    0.25
}

fn default_parallel() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GestureMatchError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| GestureMatchError::ConfigLoad {
            source: e,
            path: path.to_path_buf(),
        })?;

        Ok(config)
    }

    /// Create default configuration
    pub fn default() -> Self {
        Self {
            input_path: "./input".to_string(),
            output_base_dir: "./output".to_string(),
            prob_h: default_prob_h(),
            prob_v: default_prob_v(),
            prob_v_f: default_prob_v_f(),
            prob_f_h: default_prob_f_h(),
            prob_f_v: default_prob_f_v(),
            use_parallel: default_parallel(),
        }
    }

    /// Extract the weight snapshot handed to a matching run
    pub fn weights(&self) -> Weights {
        Weights {
            prob_h: self.prob_h,
            prob_v: self.prob_v,
            prob_v_f: self.prob_v_f,
            prob_f_h: self.prob_f_h,
            prob_f_v: self.prob_f_v,
        }
    }

    /// Set a weight by its configuration name
    pub fn set_weight(&mut self, name: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(GestureMatchError::Config(format!(
                "weight '{}' must be a finite number, got {}",
                name, value
            )));
        }

        match name {
            "prob_h" => self.prob_h = value,
            "prob_v" => self.prob_v = value,
            "prob_v_f" => self.prob_v_f = value,
            "prob_f_h" => self.prob_f_h = value,
            "prob_f_v" => self.prob_f_v = value,
            _ => {
                return Err(GestureMatchError::Config(format!(
                    "unknown weight '{}'",
                    name
                )))
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("prob_h", self.prob_h),
            ("prob_v", self.prob_v),
            ("prob_v_f", self.prob_v_f),
            ("prob_f_h", self.prob_f_h),
            ("prob_f_v", self.prob_f_v),
        ] {
            if !value.is_finite() {
                return Err(GestureMatchError::Config(format!(
                    "{} must be a finite number",
                    name
                )));
            }
            if value < 0.0 {
                return Err(GestureMatchError::Config(format!(
                    "{} must be >= 0.0",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GestureMatchError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).map_err(GestureMatchError::Io)?;

        Ok(())
    }
}

/// Process-wide configuration store.
///
/// Matching runs read an immutable [`Weights`] snapshot; the administrative
/// update path holds the write lock across the read-modify-persist sequence so
/// no run can observe a partially updated configuration.
pub struct WeightStore {
    inner: RwLock<Config>,
    config_path: PathBuf,
}

impl WeightStore {
    pub fn new<P: AsRef<Path>>(config: Config, config_path: P) -> Self {
        Self {
            inner: RwLock::new(config),
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Snapshot the current weights for one matching run
    pub fn snapshot(&self) -> Weights {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .weights()
    }

    /// Apply named weight overrides, validate, and persist the new
    /// configuration to disk, all under one write lock.
    pub fn update_and_persist(&self, overrides: &[(String, f64)]) -> Result<Weights> {
        let mut config = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut updated = config.clone();
        for (name, value) in overrides {
            updated.set_weight(name, *value)?;
        }
        updated.validate()?;
        updated.save_to_file(&self.config_path)?;

        *config = updated;
        Ok(config.weights())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn set_weight_rejects_unknown_name() {
        let mut config = Config::default();
        assert!(config.set_weight("prob_x", 0.5).is_err());
    }

    #[test]
    fn set_weight_rejects_non_finite() {
        let mut config = Config::default();
        assert!(config.set_weight("prob_h", f64::NAN).is_err());
        assert!(config.set_weight("prob_v", f64::INFINITY).is_err());
    }

    #[test]
    fn negative_weight_fails_validation() {
        let mut config = Config::default();
        config.prob_v = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn store_update_failure_leaves_weights_untouched() {
        let dir = std::env::temp_dir().join("gesture_match_store_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let store = WeightStore::new(Config::default(), &path);
        let before = store.snapshot();

        let result = store.update_and_persist(&[
            ("prob_h".to_string(), 0.9),
            ("bogus".to_string(), 0.1),
        ]);
        assert!(result.is_err());
        assert_eq!(store.snapshot(), before);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn store_update_persists_and_swaps() {
        let dir = std::env::temp_dir().join("gesture_match_store_test2");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let store = WeightStore::new(Config::default(), &path);
        let weights = store
            .update_and_persist(&[("prob_h".to_string(), 0.9)])
            .unwrap();
        assert_eq!(weights.prob_h, 0.9);
        assert_eq!(store.snapshot().prob_h, 0.9);

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded.prob_h, 0.9);

        std::fs::remove_file(&path).ok();
    }
}
