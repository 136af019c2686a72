//! Common types for Noisemix
//!
//! A [`Waveform`] is a single-channel `1 x T` sample array at the pipeline's
//! target sample rate. It is immutable once loaded and cheap to clone, so the
//! decode cache can hand out the same buffer to every draw.

use std::path::Path;
use std::sync::Arc;

use ndarray::{s, Array1, Array2, ArrayView1, Axis};

use crate::error::{DatasetError, Result};

/// Default target sample rate for every decoded waveform
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Audio sample type
pub type Sample = f32;

/// Mono waveform stored as a `1 x T` array
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Arc<Array2<Sample>>,
}

impl Waveform {
    /// Wrap a vector of mono samples
    pub fn from_vec(samples: Vec<Sample>) -> Self {
        Self::from_array(Array1::from_vec(samples))
    }

    /// Wrap an existing 1-D sample array
    pub fn from_array(samples: Array1<Sample>) -> Self {
        Self {
            samples: Arc::new(samples.insert_axis(Axis(0))),
        }
    }

    /// A silent waveform of `len` samples
    pub fn zeros(len: usize) -> Self {
        Self {
            samples: Arc::new(Array2::zeros((1, len))),
        }
    }

    /// Number of samples (T)
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.ncols()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single channel as a 1-D view
    pub fn samples(&self) -> ArrayView1<'_, Sample> {
        self.samples.row(0)
    }

    /// The underlying `1 x T` array
    pub fn as_array(&self) -> &Array2<Sample> {
        &self.samples
    }

    /// Copy out `len` samples starting at `start`
    ///
    /// Panics if the range exceeds the waveform; callers check bounds first.
    pub fn segment(&self, start: usize, len: usize) -> Array1<Sample> {
        self.samples.slice(s![0, start..start + len]).to_owned()
    }

    /// Largest absolute sample value (0.0 for an empty waveform)
    pub fn peak(&self) -> Sample {
        self.samples.iter().fold(0.0, |acc: Sample, &x| acc.max(x.abs()))
    }

    /// Write the waveform as a 32-bit float mono WAV file
    pub fn write_wav(&self, path: &Path, sample_rate: u32) -> Result<()> {
        use hound::{SampleFormat, WavSpec, WavWriter};

        let wav_err = |e: hound::Error| DatasetError::WavWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let mut writer = WavWriter::create(path, spec).map_err(wav_err)?;
        for &sample in self.samples.iter() {
            writer.write_sample(sample).map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;

        log::debug!("Wrote {} samples to {:?}", self.len(), path);
        Ok(())
    }
}

/// One dataset item: a model input and its training target
///
/// For [`crate::PairedMixDataset`] this is `(mixed, clean)`; for
/// [`crate::SelfPairedDataset`] both sides are independent noisy mixes.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub input: Waveform,
    pub target: Waveform,
}

impl Example {
    pub fn new(input: Waveform, target: Waveform) -> Self {
        Self { input, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_shape_is_one_by_t() {
        let wav = Waveform::from_vec(vec![0.1, -0.2, 0.3]);
        assert_eq!(wav.as_array().dim(), (1, 3));
        assert_eq!(wav.len(), 3);
        assert_eq!(wav.samples()[1], -0.2);
    }

    #[test]
    fn test_segment_copies_range() {
        let wav = Waveform::from_vec((0..10).map(|i| i as f32).collect());
        let seg = wav.segment(3, 4);
        assert_eq!(seg.to_vec(), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let wav = Waveform::from_vec(vec![0.5; 4]);
        let other = wav.clone();
        assert!(Arc::ptr_eq(&wav.samples, &other.samples));
    }

    #[test]
    fn test_peak() {
        assert_eq!(Waveform::zeros(0).peak(), 0.0);
        assert_eq!(Waveform::from_vec(vec![0.2, -0.7, 0.4]).peak(), 0.7);
    }
}
