//! Dataset pipeline error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, mixing, or batching audio
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to open audio file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Failed to write WAV file {path}: {reason}")]
    WavWrite { path: PathBuf, reason: String },

    /// No valid start offset exists for the dirty segment
    #[error("Dirty audio ({dirty_len} samples) is shorter than clean audio ({clean_len} samples)")]
    DirtyTooShort { clean_len: usize, dirty_len: usize },

    #[error("Dirty file {path} ({dirty_len} samples) is shorter than clean audio ({clean_len} samples)")]
    DirtyFileTooShort {
        path: PathBuf,
        clean_len: usize,
        dirty_len: usize,
    },

    #[error("Clean and dirty segments differ in length: clean={clean_len}, dirty={dirty_len}")]
    LengthMismatch { clean_len: usize, dirty_len: usize },

    #[error("Alignment must be a positive integer, got {0}")]
    InvalidAlignment(usize),

    #[error("Batch size must be a positive integer, got {0}")]
    InvalidBatchSize(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No dirty files available for mixing")]
    EmptyDirtySet,

    #[error("No clean files found")]
    EmptyCleanSet,

    #[error("Cannot collate an empty batch")]
    EmptyBatch,

    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Waveform of {len} samples does not fit padded length {target}")]
    PadTooShort { len: usize, target: usize },

    #[error("Split lengths sum to {requested}, dataset has {available} items")]
    SplitMismatch { requested: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, DatasetError>;
