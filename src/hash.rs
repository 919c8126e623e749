use sha2::{Digest, Sha256};
use std::fmt;

use crate::Error;

/// number of hex characters kept from the sha-256 digest
pub const SHORT_HASH_LEN: usize = 10;

/// truncated SHA-256 digest of packed file content
///
/// stored as the first ten lowercase hex characters, which is what the
/// toc records and what builds are compared by.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// hash text content
    pub fn of(content: &str) -> Self {
        Self::of_bytes(content.as_bytes())
    }

    /// hash raw bytes
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let hex = hex::encode(digest);
        Self(hex[..SHORT_HASH_LEN].to_string())
    }

    /// parse from the ten-character hex form found in a toc
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        if s.len() != SHORT_HASH_LEN || hex::decode(s).is_err() {
            return Err(Error::TocParse {
                line: 0,
                message: format!("invalid content hash: {}", s),
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.0)
    }
}

/// order-insensitive hash over a set of file hashes
///
/// hashes are sorted before concatenation so the result only depends on
/// which contents are present, not on the order files were visited.
pub fn combine_hashes<'a, I>(hashes: I) -> ContentHash
where
    I: IntoIterator<Item = &'a ContentHash>,
{
    let mut sorted: Vec<&str> = hashes.into_iter().map(|h| h.as_str()).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for h in sorted {
        hasher.update(h.as_bytes());
    }
    let hex = hex::encode(hasher.finalize());
    ContentHash(hex[..SHORT_HASH_LEN].to_string())
}
