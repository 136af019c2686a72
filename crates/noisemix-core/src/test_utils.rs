//! Shared test helpers

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::audio_file::AudioDecoder;
use crate::error::{DatasetError, Result};
use crate::types::{Sample, Waveform, DEFAULT_SAMPLE_RATE};

/// In-memory decoder that counts how often it is asked to decode
#[derive(Default)]
pub struct MemoryDecoder {
    files: HashMap<PathBuf, Vec<Sample>>,
    calls: AtomicUsize,
}

impl MemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, samples: Vec<Sample>) -> Self {
        self.files.insert(path.into(), samples);
        self
    }

    /// Number of decode calls so far, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AudioDecoder for MemoryDecoder {
    fn decode(&self, path: &Path) -> Result<Waveform> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .map(|samples| Waveform::from_vec(samples.clone()))
            .ok_or_else(|| DatasetError::Decode {
                path: path.to_path_buf(),
                reason: "not registered".to_string(),
            })
    }

    fn sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }
}

/// Deterministic pseudo-noise in [-amplitude, amplitude]
pub fn noise(len: usize, seed: u64, amplitude: Sample) -> Vec<Sample> {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.gen_range(-amplitude..=amplitude))
        .collect()
}
