//! Batch collation with alignment padding
//!
//! Variable-length examples are zero-padded at the end to a common length and
//! stacked into `B x L` arrays. `L` is the longest input in the batch rounded
//! up to a multiple of the alignment, which the downstream encoder needs for
//! its fixed-stride windowing.

use ndarray::{s, Array2};

use crate::error::{DatasetError, Result};
use crate::types::{Example, Sample, Waveform};

/// Stacked, padded batch tensors
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `B x L` model inputs (mixed audio)
    pub input: Array2<Sample>,
    /// `B x L` targets (clean audio, or a second mix for noise2noise)
    pub target: Array2<Sample>,
}

impl Batch {
    /// Number of examples (B)
    pub fn len(&self) -> usize {
        self.input.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Padded sample length (L)
    pub fn padded_len(&self) -> usize {
        self.input.ncols()
    }
}

/// Round `len` up to the next multiple of `alignment`
///
/// Already-aligned lengths are returned unchanged.
pub fn padded_length(len: usize, alignment: usize) -> Result<usize> {
    if alignment == 0 {
        return Err(DatasetError::InvalidAlignment(alignment));
    }
    Ok(len + (alignment - len % alignment) % alignment)
}

/// Zero-pad each waveform to `target_len` and stack into `len(wavs) x target_len`
pub fn pad_and_stack<'a, I>(wavs: I, target_len: usize) -> Result<Array2<Sample>>
where
    I: IntoIterator<Item = &'a Waveform>,
    I::IntoIter: ExactSizeIterator,
{
    let wavs = wavs.into_iter();
    let mut out = Array2::<Sample>::zeros((wavs.len(), target_len));

    for (row, wav) in wavs.enumerate() {
        if wav.len() > target_len {
            return Err(DatasetError::PadTooShort {
                len: wav.len(),
                target: target_len,
            });
        }
        out.slice_mut(s![row, ..wav.len()]).assign(&wav.samples());
    }

    Ok(out)
}

/// Pad and stack a batch of examples
///
/// The padded length comes from the longest *input*; inputs and targets of
/// one example always share a length, so targets fit too.
pub fn collate(alignment: usize, batch: &[Example]) -> Result<Batch> {
    if alignment == 0 {
        return Err(DatasetError::InvalidAlignment(alignment));
    }

    let longest = batch
        .iter()
        .map(|example| example.input.len())
        .max()
        .ok_or(DatasetError::EmptyBatch)?;
    let pad_length = padded_length(longest, alignment)?;

    log::trace!(
        "collate: {} examples, longest {} -> padded {}",
        batch.len(),
        longest,
        pad_length
    );

    Ok(Batch {
        input: pad_and_stack(batch.iter().map(|e| &e.input), pad_length)?,
        target: pad_and_stack(batch.iter().map(|e| &e.target), pad_length)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Axis;

    fn example(len: usize, value: Sample) -> Example {
        Example::new(
            Waveform::from_vec(vec![value; len]),
            Waveform::from_vec(vec![-value; len]),
        )
    }

    #[test]
    fn test_padded_length() {
        assert_eq!(padded_length(250, 8).unwrap(), 256);
        assert_eq!(padded_length(256, 8).unwrap(), 256);
        assert_eq!(padded_length(0, 8).unwrap(), 0);
        assert_eq!(padded_length(1, 1).unwrap(), 1);
        assert!(matches!(padded_length(5, 0), Err(DatasetError::InvalidAlignment(0))));
    }

    #[test]
    fn test_collate_pads_to_aligned_max() {
        let batch = vec![example(100, 0.1), example(250, 0.2), example(180, 0.3)];
        let out = collate(8, &batch).unwrap();

        assert_eq!(out.input.dim(), (3, 256));
        assert_eq!(out.target.dim(), (3, 256));
        assert_eq!(out.len(), 3);
        assert_eq!(out.padded_len(), 256);

        for (row, (len, value)) in [(100, 0.1), (250, 0.2), (180, 0.3)].iter().enumerate() {
            let input = out.input.index_axis(Axis(0), row);
            let target = out.target.index_axis(Axis(0), row);
            assert!(input.iter().take(*len).all(|&x| x == *value));
            assert!(input.iter().skip(*len).all(|&x| x == 0.0));
            assert!(target.iter().take(*len).all(|&x| x == -*value));
            assert!(target.iter().skip(*len).all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_collate_aligned_length_adds_no_padding() {
        let out = collate(8, &[example(64, 0.5)]).unwrap();
        assert_eq!(out.input.dim(), (1, 64));
        assert!(out.input.iter().all(|&x| x == 0.5));
    }

    #[test]
    fn test_collate_preserves_original_samples() {
        let input = Waveform::from_vec(vec![0.1, -0.2, 0.3]);
        let target = Waveform::from_vec(vec![0.0, 0.5, -0.5]);
        let out = collate(4, &[Example::new(input, target)]).unwrap();

        assert_eq!(out.input.row(0).to_vec(), vec![0.1, -0.2, 0.3, 0.0]);
        assert_eq!(out.target.row(0).to_vec(), vec![0.0, 0.5, -0.5, 0.0]);
    }

    #[test]
    fn test_collate_rejects_zero_alignment() {
        assert!(matches!(
            collate(0, &[example(4, 0.0)]),
            Err(DatasetError::InvalidAlignment(0))
        ));
    }

    #[test]
    fn test_collate_rejects_empty_batch() {
        assert!(matches!(collate(8, &[]), Err(DatasetError::EmptyBatch)));
    }

    #[test]
    fn test_pad_and_stack_rejects_long_waveform() {
        let wavs = [Waveform::zeros(10)];
        assert!(matches!(
            pad_and_stack(wavs.iter(), 8),
            Err(DatasetError::PadTooShort { len: 10, target: 8 })
        ));
    }
}
