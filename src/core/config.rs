//! Optional `gradebook.toml` configuration.

use crate::core::codec::{DecodeOptions, Encoding};
use crate::core::error::GradebookError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "gradebook.toml";
pub const DEFAULT_DATA_FILE: &str = "students.txt";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_file: PathBuf,
    pub encoding: Encoding,
    /// Recompute average/grade on load instead of trusting the file.
    pub recompute_on_load: bool,
    /// Refuse free text containing the flat delimiter instead of warning.
    pub reject_delimiter: bool,
    pub journal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            encoding: Encoding::Flat,
            recompute_on_load: false,
            reject_delimiter: false,
            journal: true,
        }
    }
}

impl Config {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            recompute: self.recompute_on_load,
        }
    }

    /// Relative data paths resolve against `base`.
    pub fn data_path(&self, base: &Path) -> PathBuf {
        if self.data_file.is_absolute() {
            self.data_file.clone()
        } else {
            base.join(&self.data_file)
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config, GradebookError> {
    toml::from_str(content).map_err(|e| GradebookError::ConfigError(e.to_string()))
}

/// Reads `path`. A missing file yields defaults.
pub fn load_config(path: &Path) -> Result<Config, GradebookError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).map_err(GradebookError::IoError)?;
    parse_config(&content)
}
