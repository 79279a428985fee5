//! Storage path validation.
//!
//! Every key handed to a backend is relative to that backend's root. Keys are
//! built from content hashes and route names, and route names come from user
//! configuration, so they are validated before they touch the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path for security and correctness, ensuring it can't
/// escape the storage root (no `..` traversal past the root).
///
/// > **Note:** This does **not** normalize backslashes or non-UTF8 bytes.
/// >           Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mergebot_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("ab/abcdef").is_ok());
/// assert!(validate_path("route/ovpn/0123.bin").is_ok());
/// assert!(validate_path("a/../blob").is_ok()); // (never leaves the root)
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("wrong/../latest/./route//route_uri.txt/").unwrap(),
///     Path::new("latest/route/route_uri.txt")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ab/abcdef", "ab/abcdef")]
    #[case("route/ovpn/hash.bin", "route/ovpn/hash.bin")]
    #[case("a//b//c", "a/b/c")]
    #[case("a/./b/./c", "a/b/c")]
    #[case("a/b/..", "a")]
    #[case("latest/", "latest")]
    #[case("latest///", "latest")]
    fn test_valid_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(Path::new(input)).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("..")]
    #[case("../..")]
    #[case("a\0b")]
    #[case("\0")]
    fn test_rejected_paths(#[case] input: &str) {
        assert!(validate(Path::new(input)).is_err());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("./")]
    #[case("./.")]
    #[case("//")]
    fn test_empty_paths(#[case] input: &str) {
        assert!(validate(Path::new(input)).is_err());
    }
}
