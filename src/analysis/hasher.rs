//! Content Fingerprints
//!
//! SHA-256 over a length-prefixed header followed by the raw bytes
//! (`blob <len>\0<bytes>`). The prefix makes the fingerprint cover the size
//! explicitly; it does not need to match any VCS object id.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::types::Result;

pub struct ContentHasher;

impl ContentHasher {
    pub fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    pub async fn hash_file(path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::hash_bytes(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_is_stable_hex() {
        let a = ContentHasher::hash_bytes(b"fn main() {}\n");
        let b = ContentHasher::hash_bytes(b"fn main() {}\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_changes_with_content() {
        assert_ne!(
            ContentHasher::hash_bytes(b"a"),
            ContentHasher::hash_bytes(b"b")
        );
        assert_ne!(ContentHasher::hash_bytes(b""), ContentHasher::hash_bytes(b"\0"));
    }

    #[tokio::test]
    async fn test_hash_file_matches_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "hello").unwrap();
        assert_eq!(
            ContentHasher::hash_file(&path).await.unwrap(),
            ContentHasher::hash_bytes(b"hello")
        );
    }

    #[tokio::test]
    async fn test_hash_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(ContentHasher::hash_file(&dir.path().join("nope")).await.is_err());
    }
}
