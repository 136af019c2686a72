//! Noise2noise pairing

use super::PairDataset;
use crate::error::Result;
use crate::types::Example;

/// Two independent noisy realizations of the same clean file
///
/// `get(i)` calls the wrapped dataset twice and returns
/// `(first mixed, second mixed)`. Both clean references are discarded, so
/// the ground truth never reaches the training loop.
pub struct SelfPairedDataset<D> {
    inner: D,
}

impl<D: PairDataset> SelfPairedDataset<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: PairDataset> PairDataset for SelfPairedDataset<D> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Result<Example> {
        let first = self.inner.get(index)?;
        let second = self.inner.get(index)?;
        Ok(Example::new(first.input, second.input))
    }
}
