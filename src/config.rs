use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Result, ZooErr};

/// Environment variable overriding the checkpoint directory.
pub const WEIGHTS_DIR_VAR: &str = "REID_WEIGHTS_DIR";

const DEFAULT_CACHE_DIR: &str = ".cache/reid-models/checkpoints";
const FALLBACK_DIR: &str = "checkpoints";

/// Process-wide settings of the model zoo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZooConfig {
    /// Directory holding the pretrained checkpoints, one `<name>.safetensors` per architecture.
    #[serde(default = "default_weights_dir")]
    pub weights_dir: PathBuf,
    /// Fail instead of warning when a published ImageNet checkpoint is missing.
    #[serde(default)]
    pub strict_checkpoints: bool,
}

impl Default for ZooConfig {
    fn default() -> Self {
        Self {
            weights_dir: default_weights_dir(),
            strict_checkpoints: false,
        }
    }
}

impl ZooConfig {
    /// Reads the configuration from the environment, falling back to the defaults.
    pub fn from_env() -> Self {
        match env::var_os(WEIGHTS_DIR_VAR) {
            Some(dir) if !dir.is_empty() => Self {
                weights_dir: PathBuf::from(dir),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// Reads the configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or isn't a valid configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;

        if config.weights_dir.as_os_str().is_empty() {
            return Err(ZooErr::Config(format!(
                "weights_dir must not be empty in {}",
                path.display()
            )));
        }

        Ok(config)
    }

    pub fn with_weights_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.weights_dir = dir.into();
        self
    }

    pub fn with_strict_checkpoints(mut self, strict: bool) -> Self {
        self.strict_checkpoints = strict;
        self
    }
}

fn default_weights_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_CACHE_DIR),
        _ => PathBuf::from(FALLBACK_DIR),
    }
}
