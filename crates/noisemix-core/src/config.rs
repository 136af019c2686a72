//! Pipeline configuration
//!
//! All paths and numeric knobs for building datasets and loaders, stored as
//! YAML.
//!
//! ```ignore
//! use noisemix_core::config::{load_config, PipelineConfig};
//!
//! let config = load_config(Path::new("noisemix.yaml"));
//! config.validate()?;
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::files::{CLEAN_EXTENSIONS, DIRTY_EXTENSIONS};
use crate::types::DEFAULT_SAMPLE_RATE;

/// Data pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target sample rate every file is resampled to
    pub sample_rate: u32,

    /// Padded batch length must be a multiple of this
    /// (the downstream encoder's window stride)
    pub alignment: usize,

    pub batch_size: usize,

    /// Shuffle dataset order once per loader
    pub shuffle: bool,

    /// Drop a trailing batch smaller than `batch_size`
    pub drop_last: bool,

    /// Seed for mixing and shuffling; `None` draws from OS entropy
    pub seed: Option<u64>,

    pub clean_folder: PathBuf,

    pub dirty_folders: Vec<PathBuf>,

    pub clean_extensions: Vec<String>,

    pub dirty_extensions: Vec<String>,

    /// Decode everything up front and check dirty files are long enough
    pub validate_on_load: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            alignment: 8,
            batch_size: 4,
            shuffle: true,
            drop_last: false,
            seed: None,
            clean_folder: PathBuf::from("datasets/clean"),
            dirty_folders: vec![PathBuf::from("datasets/dirty")],
            clean_extensions: CLEAN_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            dirty_extensions: DIRTY_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            validate_on_load: false,
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> std::result::Result<(), DatasetError> {
        if self.alignment == 0 {
            return Err(DatasetError::InvalidAlignment(self.alignment));
        }
        if self.batch_size == 0 {
            return Err(DatasetError::InvalidBatchSize(self.batch_size));
        }
        if self.sample_rate == 0 {
            return Err(DatasetError::InvalidConfig(
                "sample_rate must be positive".to_string(),
            ));
        }
        if self.dirty_folders.is_empty() {
            return Err(DatasetError::InvalidConfig(
                "at least one dirty folder is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a pipeline config from YAML
///
/// A missing or unparsable file falls back to [`PipelineConfig::default`]
/// with a warning, so a fresh checkout runs without any setup. Relative
/// `clean_folder`/`dirty_folders` entries in a file are resolved against the
/// file's directory, not the working directory.
pub fn load_config(path: &Path) -> PipelineConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("[CONFIG] {:?} not found, using defaults", path);
            return PipelineConfig::default();
        }
        Err(e) => {
            log::warn!("[CONFIG] Cannot read {:?}: {}, using defaults", path, e);
            return PipelineConfig::default();
        }
    };

    let mut config: PipelineConfig = match serde_yaml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("[CONFIG] Invalid YAML in {:?}: {}, using defaults", path, e);
            return PipelineConfig::default();
        }
    };

    if let Some(base) = path.parent() {
        config.clean_folder = resolve_folder(base, &config.clean_folder);
        config.dirty_folders = config
            .dirty_folders
            .iter()
            .map(|folder| resolve_folder(base, folder))
            .collect();
    }

    log::info!(
        "[CONFIG] Loaded {:?}: clean {:?}, {} dirty folder(s) @ {} Hz",
        path,
        config.clean_folder,
        config.dirty_folders.len(),
        config.sample_rate
    );
    config
}

fn resolve_folder(base: &Path, folder: &Path) -> PathBuf {
    if folder.is_absolute() {
        folder.to_path_buf()
    } else {
        base.join(folder)
    }
}

/// Write a pipeline config as YAML, creating parent directories
pub fn save_config(config: &PipelineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize pipeline config")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write {:?}", path))?;

    log::info!("[CONFIG] Saved {:?}", path);
    Ok(())
}
