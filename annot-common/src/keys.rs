//! Lookup key derivation for sample paths
//!
//! Every metadata resolver matches a sample through the same three keys,
//! tried in a fixed order: the full relative path, the base filename, and
//! the filename stem. Side-file authors may therefore key entries at any
//! of those granularities.

use std::path::Path;

/// Key derivation function: borrows a slice of the input path
pub type KeyDerivation = fn(&str) -> &str;

/// Derivations in lookup priority order
pub const KEY_DERIVATIONS: [KeyDerivation; 3] = [full_path, base_name, stem];

/// The path exactly as given
pub fn full_path(path: &str) -> &str {
    path
}

/// Final `/`-separated segment of the path
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Base filename with its last extension removed
///
/// Leading dots are not treated as extension separators, so `.hidden`
/// keeps its full name.
pub fn stem(path: &str) -> &str {
    let base = base_name(path);
    Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base)
}

/// All lookup keys for `path`, in priority order
pub fn lookup_keys(path: &str) -> [&str; 3] {
    KEY_DERIVATIONS.map(|derive| derive(path))
}

/// Episode identifier of a sample: its filename stem
pub fn episode_id(path: &str) -> &str {
    stem(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_path_keys() {
        assert_eq!(
            lookup_keys("sub/dir/img.png"),
            ["sub/dir/img.png", "img.png", "img"]
        );
    }

    #[test]
    fn test_flat_filename_keys() {
        assert_eq!(lookup_keys("a.jpg"), ["a.jpg", "a.jpg", "a"]);
    }

    #[test]
    fn test_stem_without_extension() {
        assert_eq!(stem("dir/episode_42"), "episode_42");
    }

    #[test]
    fn test_stem_strips_only_last_extension() {
        assert_eq!(stem("x/frame.0001.webp"), "frame.0001");
    }

    #[test]
    fn test_hidden_file_stem() {
        assert_eq!(stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_episode_id_matches_stem() {
        assert_eq!(episode_id("cam/ep_7.jpeg"), "ep_7");
    }
}
