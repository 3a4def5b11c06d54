//! Configuration management for the classification service
//!
//! This module provides runtime configuration loading from JSON files. Only
//! deployment concerns live here (bind address, limits, model location);
//! analysis parameters are pinned constants because the trained model
//! depends on them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/respiro.json";

/// Environment variable overriding `server.bind_addr`
pub const ENV_BIND_ADDR: &str = "RESPIRO_BIND_ADDR";

/// Environment variable overriding `model.path`
pub const ENV_MODEL_PATH: &str = "RESPIRO_MODEL_PATH";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

/// HTTP service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,
    /// Wall-clock budget for one /predict request
    pub request_timeout_ms: u64,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
    /// Requests processed at once; further requests wait
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            request_timeout_ms: 30_000,
            max_upload_bytes: 25 * 1024 * 1024,
            max_concurrent_requests: 4,
        }
    }
}

/// Classifier artifact settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the JSON model artifact
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/respiratory_classifier.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults (with a warning) when the
    /// file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from `path` (or the default location), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::load_from_file(path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH)));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `RESPIRO_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            log::info!("[Config] {} overrides bind address: {}", ENV_BIND_ADDR, addr);
            self.server.bind_addr = addr;
        }
        if let Some(path) = lookup(ENV_MODEL_PATH) {
            log::info!("[Config] {} overrides model path: {}", ENV_MODEL_PATH, path);
            self.model.path = PathBuf::from(path);
        }
    }
}
