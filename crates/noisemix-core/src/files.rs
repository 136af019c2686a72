//! Clean/dirty file discovery
//!
//! Only files directly inside each folder are considered; extensions match
//! case-insensitively. Results are sorted so that a clean index always maps to
//! the same file.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions recognized in the clean folder
pub const CLEAN_EXTENSIONS: &[&str] = &["wav"];

/// Extensions recognized in dirty folders
pub const DIRTY_EXTENSIONS: &[&str] = &["wav", "m4a", "mp3"];

/// List audio files in `folder` whose extension is in `extensions`
///
/// A missing or unreadable folder yields an empty list and a warning.
pub fn scan_folder<S: AsRef<str>>(folder: &Path, extensions: &[S]) -> Vec<PathBuf> {
    if !folder.is_dir() {
        log::warn!("scan_folder: {:?} is not a directory", folder);
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_extension(e.path(), extensions))
        .map(|e| e.path().to_owned())
        .collect();

    files.sort();
    log::debug!("scan_folder: {} files in {:?}", files.len(), folder);
    files
}

/// Flatten [`scan_folder`] over several folders
pub fn scan_folders<P: AsRef<Path>, S: AsRef<str>>(folders: &[P], extensions: &[S]) -> Vec<PathBuf> {
    folders
        .iter()
        .flat_map(|folder| scan_folder(folder.as_ref(), extensions))
        .collect()
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want.as_ref())))
        .unwrap_or(false)
}
