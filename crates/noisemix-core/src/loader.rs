//! Batching data loader
//!
//! Walks a [`PairDataset`] in (optionally shuffled) order, fetches
//! `batch_size` examples at a time and collates them with a fixed alignment.
//! Each batch is produced synchronously on the calling thread.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::collate::{collate, Batch};
use crate::config::PipelineConfig;
use crate::dataset::PairDataset;
use crate::error::{DatasetError, Result};

/// Batching parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    pub batch_size: usize,
    /// Padded length multiple passed to [`collate`]
    pub alignment: usize,
    pub shuffle: bool,
    /// Skip a final batch smaller than `batch_size`
    pub drop_last: bool,
    pub seed: Option<u64>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: 4,
            alignment: 8,
            shuffle: false,
            drop_last: false,
            seed: None,
        }
    }
}

impl From<&PipelineConfig> for LoaderOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            alignment: config.alignment,
            shuffle: config.shuffle,
            drop_last: config.drop_last,
            seed: config.seed,
        }
    }
}

/// Iterator over collated batches of a dataset
///
/// Yields `Result<Batch>`; a failed example fails its batch, and iteration
/// continues with the next batch.
pub struct DataLoader<'a, D: PairDataset> {
    dataset: &'a D,
    options: LoaderOptions,
    order: Vec<usize>,
    cursor: usize,
}

impl<'a, D: PairDataset> DataLoader<'a, D> {
    pub fn new(dataset: &'a D, options: LoaderOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(DatasetError::InvalidBatchSize(options.batch_size));
        }
        if options.alignment == 0 {
            return Err(DatasetError::InvalidAlignment(options.alignment));
        }

        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if options.shuffle {
            let mut rng = match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            order.shuffle(&mut rng);
        }

        Ok(Self {
            dataset,
            options,
            order,
            cursor: 0,
        })
    }

    /// Number of batches this loader yields in total
    pub fn num_batches(&self) -> usize {
        let n = self.order.len();
        if self.options.drop_last {
            n / self.options.batch_size
        } else {
            n.div_ceil(self.options.batch_size)
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }
}

impl<D: PairDataset> Iterator for DataLoader<'_, D> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.order.len() - self.cursor;
        if remaining == 0 || (self.options.drop_last && remaining < self.options.batch_size) {
            return None;
        }

        let end = (self.cursor + self.options.batch_size).min(self.order.len());
        let indices = &self.order[self.cursor..end];
        self.cursor = end;

        let examples = indices
            .iter()
            .map(|&index| self.dataset.get(index))
            .collect::<Result<Vec<_>>>();

        Some(examples.and_then(|examples| collate(self.options.alignment, &examples)))
    }
}
