//! Noisemix Core - Synthetic training pairs for audio denoising
//!
//! Decodes clean and dirty recordings, mixes them without clipping, and
//! assembles zero-padded batches whose length is a multiple of the
//! downstream model's window alignment.

pub mod audio_file;
pub mod cache;
pub mod collate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod files;
pub mod loader;
pub mod mixing;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use collate::{collate, Batch};
pub use dataset::{PairDataset, PairedMixDataset, SelfPairedDataset, Subset};
pub use error::{DatasetError, Result};
pub use loader::{DataLoader, LoaderOptions};
pub use types::*;
