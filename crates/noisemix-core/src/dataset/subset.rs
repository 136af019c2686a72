//! Restricted index views

use rand::seq::SliceRandom;
use rand::Rng;

use super::PairDataset;
use crate::error::{DatasetError, Result};
use crate::types::Example;

/// A dataset view exposing only `indices` of the parent
///
/// Subset position `i` maps to parent index `indices[i]`.
pub struct Subset<D> {
    dataset: D,
    indices: Vec<usize>,
}

impl<D: PairDataset> Subset<D> {
    /// Every index must be valid for `dataset`
    pub fn new(dataset: D, indices: Vec<usize>) -> Result<Self> {
        let len = dataset.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(DatasetError::IndexOutOfRange { index, len });
        }
        Ok(Self { dataset, indices })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: PairDataset> PairDataset for Subset<D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<Example> {
        let parent = *self.indices.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.indices.len(),
        })?;
        self.dataset.get(parent)
    }
}

/// Split `dataset` into non-overlapping random subsets of the given lengths
///
/// `lengths` must sum to the dataset length. Subsets borrow the dataset, so
/// they share its decode cache.
pub fn random_split<'a, D, R>(dataset: &'a D, lengths: &[usize], rng: &mut R) -> Result<Vec<Subset<&'a D>>>
where
    D: PairDataset,
    R: Rng + ?Sized,
{
    let requested: usize = lengths.iter().sum();
    if requested != dataset.len() {
        return Err(DatasetError::SplitMismatch {
            requested,
            available: dataset.len(),
        });
    }

    let mut order: Vec<usize> = (0..dataset.len()).collect();
    order.shuffle(rng);

    let mut start = 0;
    let subsets = lengths
        .iter()
        .map(|&len| {
            let indices = order[start..start + len].to_vec();
            start += len;
            Subset { dataset, indices }
        })
        .collect();

    Ok(subsets)
}
