//! Indexable datasets of training examples
//!
//! - [`PairedMixDataset`]: `(mixed, clean)` pairs built from clean and dirty
//!   folders. One item per clean file; each access draws a fresh dirty file,
//!   offset, and intensity.
//! - [`SelfPairedDataset`]: two independent mixes of the same clean file,
//!   for noise2noise-style training without a clean target.
//! - [`Subset`]: a restricted index view over another dataset, e.g. a
//!   train/validation split from [`random_split`].
//!
//! Access goes through `&self`. The decode cache and RNG sit behind
//! `RefCell`, which keeps datasets single-threaded (`!Sync`): parallel loaders
//! build one dataset per worker instead of sharing one.

mod paired;
mod self_paired;
mod subset;

pub use paired::PairedMixDataset;
pub use self_paired::SelfPairedDataset;
pub use subset::{random_split, Subset};

use crate::error::Result;
use crate::types::Example;

/// A length-bounded, indexable source of examples
pub trait PairDataset {
    /// Number of examples
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce the example at `index`
    ///
    /// Implementations may be randomized: repeated calls with the same index
    /// are allowed to return different inputs.
    fn get(&self, index: usize) -> Result<Example>;
}

impl<T: PairDataset + ?Sized> PairDataset for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<Example> {
        (**self).get(index)
    }
}
