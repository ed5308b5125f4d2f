//! Content hashing for generated scenes.
//!
//! Produces a SHA-256 digest over the numeric content of a scene so that
//! identical stimuli can be detected across runs and seeds.

use sha2::{Digest, Sha256};

/// A content hash digest (SHA-256, 32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 32],
}

impl ContentHash {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Incremental hasher over the primitive fields of a scene.
#[derive(Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_f64(&mut self, v: f64) -> &mut Self {
        self.inner.update(v.to_le_bytes());
        self
    }

    pub fn update_u64(&mut self, v: u64) -> &mut Self {
        self.inner.update(v.to_le_bytes());
        self
    }

    pub fn update_str(&mut self, s: &str) -> &mut Self {
        // Length prefix keeps ("ab", "c") distinct from ("a", "bc").
        self.update_u64(s.len() as u64);
        self.inner.update(s.as_bytes());
        self
    }

    pub fn finish(self) -> ContentHash {
        let result = self.inner.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        ContentHash::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(values: &[f64], name: &str) -> ContentHash {
        let mut h = ContentHasher::new();
        for v in values {
            h.update_f64(*v);
        }
        h.update_str(name);
        h.finish()
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_of(&[1.0, 2.0], "chair"), hash_of(&[1.0, 2.0], "chair"));
    }

    #[test]
    fn test_hash_different_content() {
        assert_ne!(hash_of(&[1.0, 2.0], "chair"), hash_of(&[1.0, 2.5], "chair"));
        assert_ne!(hash_of(&[1.0], "chair"), hash_of(&[1.0], "table"));
    }

    #[test]
    fn test_hash_hex_format() {
        let hex = hash_of(&[0.0], "").to_hex();
        assert_eq!(hex.len(), 64); // SHA-256 = 64 hex chars
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_display() {
        let hash = hash_of(&[3.0], "x");
        assert_eq!(format!("{}", hash), hash.to_hex());
    }
}
