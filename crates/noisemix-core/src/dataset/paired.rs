//! Clean/dirty mixing dataset

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::PairDataset;
use crate::audio_file::{AudioDecoder, SymphoniaDecoder};
use crate::cache::DecodeCache;
use crate::config::PipelineConfig;
use crate::error::{DatasetError, Result};
use crate::files::{scan_folder, scan_folders, CLEAN_EXTENSIONS, DIRTY_EXTENSIONS};
use crate::mixing;
use crate::types::{Example, Waveform};

/// Synthesizes `(mixed, clean)` pairs from clean and dirty recordings
///
/// `get(i)` always returns clean file `i` as the target. The input mixes it
/// with a window of a uniformly chosen dirty file, so repeated calls with the
/// same index return the same target but different inputs.
///
/// Every dirty file must be at least as long as the longest clean file.
/// This is checked per draw (and up front by [`Self::validate_lengths`]);
/// a short dirty file is an error, never silently skipped.
pub struct PairedMixDataset<D = SymphoniaDecoder> {
    clean_files: Vec<PathBuf>,
    dirty_files: Vec<PathBuf>,
    cache: RefCell<DecodeCache<D>>,
    rng: RefCell<StdRng>,
}

impl PairedMixDataset<SymphoniaDecoder> {
    /// Scan `clean_folder` for `*.wav` and each dirty folder for
    /// `*.wav`/`*.m4a`/`*.mp3`
    pub fn from_folders<P: AsRef<Path>>(
        clean_folder: &Path,
        dirty_folders: &[P],
        sample_rate: u32,
        seed: Option<u64>,
    ) -> Result<Self> {
        let clean_files = scan_folder(clean_folder, CLEAN_EXTENSIONS);
        let dirty_files = scan_folders(dirty_folders, DIRTY_EXTENSIONS);
        Self::new(
            clean_files,
            dirty_files,
            SymphoniaDecoder::new(sample_rate),
            seeded_rng(seed),
        )
    }

    /// Build from a validated [`PipelineConfig`]
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let clean_files = scan_folder(&config.clean_folder, &config.clean_extensions);
        let dirty_files = scan_folders(&config.dirty_folders, &config.dirty_extensions);
        let dataset = Self::new(
            clean_files,
            dirty_files,
            SymphoniaDecoder::new(config.sample_rate),
            seeded_rng(config.seed),
        )?;

        if config.validate_on_load {
            dataset.preload()?;
            dataset.validate_lengths()?;
        }
        Ok(dataset)
    }
}

impl<D: AudioDecoder> PairedMixDataset<D> {
    /// Build from explicit file lists
    ///
    /// Clean order is kept as given and defines the index mapping.
    pub fn new(
        clean_files: Vec<PathBuf>,
        dirty_files: Vec<PathBuf>,
        decoder: D,
        rng: StdRng,
    ) -> Result<Self> {
        if clean_files.is_empty() {
            return Err(DatasetError::EmptyCleanSet);
        }
        if dirty_files.is_empty() {
            return Err(DatasetError::EmptyDirtySet);
        }

        log::info!(
            "PairedMixDataset: {} clean files, {} dirty files @ {} Hz",
            clean_files.len(),
            dirty_files.len(),
            decoder.sample_rate()
        );

        Ok(Self {
            clean_files,
            dirty_files,
            cache: RefCell::new(DecodeCache::new(decoder)),
            rng: RefCell::new(rng),
        })
    }

    pub fn clean_files(&self) -> &[PathBuf] {
        &self.clean_files
    }

    pub fn dirty_files(&self) -> &[PathBuf] {
        &self.dirty_files
    }

    pub fn sample_rate(&self) -> u32 {
        self.cache.borrow().decoder().sample_rate()
    }

    /// Number of files decoded so far
    pub fn cached_files(&self) -> usize {
        self.cache.borrow().len()
    }

    /// The clean waveform at `index`, without mixing
    pub fn clean(&self, index: usize) -> Result<Waveform> {
        let path = self
            .clean_files
            .get(index)
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.clean_files.len(),
            })?;
        self.cache.borrow_mut().get(path)
    }

    /// Decode every file and check the shortest dirty file covers the
    /// longest clean file
    pub fn validate_lengths(&self) -> Result<()> {
        let mut cache = self.cache.borrow_mut();

        let mut longest_clean = 0;
        for path in &self.clean_files {
            longest_clean = longest_clean.max(cache.get(path)?.len());
        }

        let mut shortest_dirty: Option<(&PathBuf, usize)> = None;
        for path in &self.dirty_files {
            let len = cache.get(path)?.len();
            if shortest_dirty.map_or(true, |(_, best)| len < best) {
                shortest_dirty = Some((path, len));
            }
        }

        match shortest_dirty {
            Some((path, dirty_len)) if dirty_len < longest_clean => {
                Err(DatasetError::DirtyFileTooShort {
                    path: path.clone(),
                    clean_len: longest_clean,
                    dirty_len,
                })
            }
            _ => {
                log::info!(
                    "PairedMixDataset: lengths ok (longest clean {}, shortest dirty {})",
                    longest_clean,
                    shortest_dirty.map_or(0, |(_, len)| len)
                );
                Ok(())
            }
        }
    }
}

impl<D: AudioDecoder + Sync> PairedMixDataset<D> {
    /// Decode all clean and dirty files into the cache in parallel
    pub fn preload(&self) -> Result<usize> {
        let paths: Vec<PathBuf> = self
            .clean_files
            .iter()
            .chain(self.dirty_files.iter())
            .cloned()
            .collect();
        self.cache.borrow_mut().preload(&paths)
    }
}

impl<D: AudioDecoder> PairDataset for PairedMixDataset<D> {
    fn len(&self) -> usize {
        self.clean_files.len()
    }

    fn get(&self, index: usize) -> Result<Example> {
        let clean = self.clean(index)?;

        let dirty_path = self
            .dirty_files
            .choose(&mut *self.rng.borrow_mut())
            .ok_or(DatasetError::EmptyDirtySet)?;
        let dirty = self.cache.borrow_mut().get(dirty_path)?;

        if dirty.len() < clean.len() {
            return Err(DatasetError::DirtyFileTooShort {
                path: dirty_path.clone(),
                clean_len: clean.len(),
                dirty_len: dirty.len(),
            });
        }

        let mixed = mixing::mix(&clean, &dirty, &mut *self.rng.borrow_mut())?;
        Ok(Example::new(mixed, clean))
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{noise, MemoryDecoder};

    fn fixture(seed: u64) -> PairedMixDataset<MemoryDecoder> {
        let decoder = MemoryDecoder::new()
            .with_file("clean/0.wav", noise(100, 1, 0.5))
            .with_file("clean/1.wav", noise(250, 2, 0.5))
            .with_file("clean/2.wav", noise(180, 3, 0.5))
            .with_file("dirty/a.wav", noise(400, 4, 0.8))
            .with_file("dirty/b.mp3", noise(300, 5, 0.8));

        PairedMixDataset::new(
            ["clean/0.wav", "clean/1.wav", "clean/2.wav"]
                .iter()
                .map(PathBuf::from)
                .collect(),
            vec![PathBuf::from("dirty/a.wav"), PathBuf::from("dirty/b.mp3")],
            decoder,
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn test_len_is_clean_count() {
        let dataset = fixture(0);
        assert_eq!(dataset.len(), 3);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn test_get_returns_stable_clean_target() {
        let dataset = fixture(0);

        let first = dataset.get(1).unwrap();
        let second = dataset.get(1).unwrap();

        assert_eq!(first.target, second.target);
        assert_eq!(first.target.len(), 250);
        assert_eq!(first.input.len(), 250);
        assert_ne!(first.input, second.input);
    }

    #[test]
    fn test_get_output_stays_in_range() {
        let dataset = fixture(9);
        for round in 0..50 {
            let example = dataset.get(round % 3).unwrap();
            assert!(example.input.peak() <= 1.0);
        }
    }

    #[test]
    fn test_each_file_decoded_once() {
        let dataset = fixture(1);
        for round in 0..30 {
            dataset.get(round % 3).unwrap();
        }
        assert_eq!(dataset.cache.borrow().decoder().calls(), 5);
        assert_eq!(dataset.cached_files(), 5);
    }

    #[test]
    fn test_index_out_of_range() {
        let dataset = fixture(0);
        assert!(matches!(
            dataset.get(3),
            Err(DatasetError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_same_seed_same_mixes() {
        let a = fixture(11);
        let b = fixture(11);
        for index in [0, 2, 1, 1] {
            assert_eq!(a.get(index).unwrap(), b.get(index).unwrap());
        }
    }

    #[test]
    fn test_empty_dirty_set_is_rejected() {
        let result = PairedMixDataset::new(
            vec![PathBuf::from("clean/0.wav")],
            vec![],
            MemoryDecoder::new(),
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(DatasetError::EmptyDirtySet)));
    }

    #[test]
    fn test_empty_clean_set_is_rejected() {
        let result = PairedMixDataset::new(
            vec![],
            vec![PathBuf::from("dirty/a.wav")],
            MemoryDecoder::new(),
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(DatasetError::EmptyCleanSet)));
    }

    #[test]
    fn test_short_dirty_file_fails_draw_and_validation() {
        let decoder = MemoryDecoder::new()
            .with_file("clean.wav", noise(100, 1, 0.5))
            .with_file("short.wav", noise(50, 2, 0.5));
        let dataset = PairedMixDataset::new(
            vec![PathBuf::from("clean.wav")],
            vec![PathBuf::from("short.wav")],
            decoder,
            StdRng::seed_from_u64(0),
        )
        .unwrap();

        assert!(matches!(
            dataset.get(0),
            Err(DatasetError::DirtyFileTooShort {
                clean_len: 100,
                dirty_len: 50,
                ..
            })
        ));
        assert!(matches!(
            dataset.validate_lengths(),
            Err(DatasetError::DirtyFileTooShort { .. })
        ));
    }

    #[test]
    fn test_validate_lengths_ok() {
        let dataset = fixture(0);
        dataset.validate_lengths().unwrap();
        assert_eq!(dataset.cached_files(), 5);
    }

    #[test]
    fn test_preload_fills_cache() {
        let dataset = fixture(0);
        assert_eq!(dataset.preload().unwrap(), 5);
        dataset.get(0).unwrap();
        assert_eq!(dataset.cache.borrow().decoder().calls(), 5);
    }

    #[test]
    fn test_decode_error_propagates() {
        let decoder = MemoryDecoder::new().with_file("dirty.wav", noise(10, 0, 0.1));
        let dataset = PairedMixDataset::new(
            vec![PathBuf::from("corrupt.wav")],
            vec![PathBuf::from("dirty.wav")],
            decoder,
            StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert!(matches!(dataset.get(0), Err(DatasetError::Decode { .. })));
    }
}
