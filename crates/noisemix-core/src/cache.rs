//! Decoded waveform cache
//!
//! Memoizes [`AudioDecoder`] results by file path. The same clean and dirty
//! files are drawn over and over while sampling mixes, so each file is
//! decoded and resampled once per cache instance and then served from memory.
//!
//! Entries are never evicted or recomputed. The cache is owned by a single
//! dataset instance; parallel data loading gives every worker its own
//! dataset and therefore its own cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::audio_file::AudioDecoder;
use crate::error::Result;
use crate::types::Waveform;

/// Path-keyed memo of decoded waveforms
pub struct DecodeCache<D> {
    decoder: D,
    entries: HashMap<PathBuf, Waveform>,
}

impl<D: AudioDecoder> DecodeCache<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            entries: HashMap::new(),
        }
    }

    /// Return the cached waveform for `path`, decoding it on first access
    ///
    /// Decode failures are not cached; the error goes straight to the caller.
    pub fn get(&mut self, path: &Path) -> Result<Waveform> {
        if let Some(wav) = self.entries.get(path) {
            log::trace!("[DECODE_CACHE] Hit for {:?}", path);
            return Ok(wav.clone());
        }

        log::debug!("[DECODE_CACHE] Miss, decoding {:?}", path);
        let wav = self.decoder.decode(path)?;
        self.entries.insert(path.to_path_buf(), wav.clone());
        Ok(wav)
    }

    /// Whether `path` has already been decoded
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of cached files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: AudioDecoder + Sync> DecodeCache<D> {
    /// Decode every uncached path in parallel and insert the results
    ///
    /// Decoding runs on the rayon pool; insertion happens afterwards on the
    /// calling thread. If any file fails, nothing from this call is inserted.
    pub fn preload(&mut self, paths: &[PathBuf]) -> Result<usize> {
        let mut missing: Vec<&PathBuf> = paths.iter().filter(|p| !self.contains(p)).collect();
        missing.sort();
        missing.dedup();

        if missing.is_empty() {
            return Ok(0);
        }

        log::info!("[DECODE_CACHE] Preloading {} files", missing.len());

        let decoder = &self.decoder;
        let decoded: Vec<(PathBuf, Waveform)> = missing
            .par_iter()
            .map(|path| decoder.decode(path).map(|wav| ((*path).clone(), wav)))
            .collect::<Result<_>>()?;

        let count = decoded.len();
        self.entries.extend(decoded);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;
    use crate::test_utils::MemoryDecoder;

    #[test]
    fn test_second_get_is_served_from_cache() {
        let decoder = MemoryDecoder::new().with_file("a.wav", vec![0.1, 0.2, 0.3]);
        let mut cache = DecodeCache::new(decoder);

        let first = cache.get(Path::new("a.wav")).unwrap();
        let second = cache.get(Path::new("a.wav")).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.decoder().calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_paths_decode_separately() {
        let decoder = MemoryDecoder::new()
            .with_file("a.wav", vec![0.1; 4])
            .with_file("b.wav", vec![0.2; 8]);
        let mut cache = DecodeCache::new(decoder);

        assert_eq!(cache.get(Path::new("a.wav")).unwrap().len(), 4);
        assert_eq!(cache.get(Path::new("b.wav")).unwrap().len(), 8);
        cache.get(Path::new("a.wav")).unwrap();

        assert_eq!(cache.decoder().calls(), 2);
        assert!(cache.contains(Path::new("b.wav")));
    }

    #[test]
    fn test_failed_decode_is_not_cached() {
        let mut cache = DecodeCache::new(MemoryDecoder::new());

        let err = cache.get(Path::new("missing.wav")).unwrap_err();
        assert!(matches!(err, DatasetError::Decode { .. }));
        assert!(cache.is_empty());

        cache.get(Path::new("missing.wav")).unwrap_err();
        assert_eq!(cache.decoder().calls(), 2);
    }

    #[test]
    fn test_preload_skips_cached_and_duplicates() {
        let decoder = MemoryDecoder::new()
            .with_file("a.wav", vec![0.0; 2])
            .with_file("b.wav", vec![0.0; 3])
            .with_file("c.wav", vec![0.0; 4]);
        let mut cache = DecodeCache::new(decoder);
        cache.get(Path::new("a.wav")).unwrap();

        let paths: Vec<PathBuf> = ["a.wav", "b.wav", "c.wav", "b.wav"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let loaded = cache.preload(&paths).unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.decoder().calls(), 3);

        cache.get(Path::new("c.wav")).unwrap();
        assert_eq!(cache.decoder().calls(), 3);
    }

    #[test]
    fn test_preload_failure_inserts_nothing() {
        let decoder = MemoryDecoder::new().with_file("a.wav", vec![0.0; 2]);
        let mut cache = DecodeCache::new(decoder);

        let paths = vec![PathBuf::from("a.wav"), PathBuf::from("gone.wav")];
        assert!(cache.preload(&paths).is_err());
        assert!(cache.is_empty());
    }
}
