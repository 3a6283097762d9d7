//! Image sample discovery
//!
//! Walks a data directory and produces the ordered sample list. Traversal
//! is deterministic: inside each directory, files are visited before
//! subdirectories and both are sorted by name. When two images share a
//! stem anywhere in the tree, the first one visited wins and later ones
//! are skipped. The final list is sorted by relative path, so a sample's
//! index is stable across restarts as long as the file set is unchanged.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::keys;
use crate::store::LOCK_KEY;

/// Accepted image extensions (compared lowercase)
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Image sample scanner
pub struct SampleScanner;

impl SampleScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan `root` for image samples
    ///
    /// Returns root-relative, `/`-separated paths, deduplicated by stem and
    /// sorted. An empty directory yields an empty list.
    pub fn scan(&self, root: &Path) -> Result<Vec<String>, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            });

        let mut seen_stems = HashSet::new();
        let mut samples = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Unreadable entries are skipped, not fatal
                    tracing::warn!("Error accessing entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_image(&entry) {
                continue;
            }
            let Some(rel_path) = relative_posix(root, entry.path()) else {
                tracing::warn!("Skipping non UTF-8 path: {}", entry.path().display());
                continue;
            };
            if keys::stem(&rel_path) == LOCK_KEY {
                tracing::warn!("Skipping {}: its name is reserved in the output file", rel_path);
                continue;
            }
            if seen_stems.insert(keys::stem(&rel_path).to_string()) {
                samples.push(rel_path);
            } else {
                tracing::debug!("Skipping duplicate stem: {}", rel_path);
            }
        }

        samples.sort();
        tracing::debug!("Scan complete: {} samples under {}", samples.len(), root.display());
        Ok(samples)
    }
}

impl Default for SampleScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether an entry has an accepted image extension
fn is_image(entry: &DirEntry) -> bool {
    entry
        .path()
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Root-relative path joined with `/`, or None if not valid UTF-8
fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}
