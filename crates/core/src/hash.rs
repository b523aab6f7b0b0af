//! Blake3 hashing utilities for block sealing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// A wrapper type for H256 with hex Display and Debug formatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub H256);

impl Hash {
    /// Create a new Hash from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Convert to a lowercase hex string (64 chars, no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Number of leading `'0'` characters in the hex representation.
    pub fn leading_zeros(&self) -> u32 {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
                continue;
            }
            if byte >> 4 == 0 {
                count += 1;
            }
            break;
        }
        count
    }

    /// Whether the hex form starts with at least `difficulty` zeros.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zeros() >= difficulty
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash arbitrary data using Blake3.
pub fn hash(data: &[u8]) -> Hash {
    Hash(blake3::hash(data).into())
}

/// Hash a fixed-order sequence of fields.
///
/// Each field is prefixed with its length as a little-endian u64, so the
/// encoding is injective for a given number of fields.
pub fn hash_fields(fields: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for field in fields {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field);
    }
    Hash(hasher.finalize().into())
}

/// Deterministically choose one of `values` from the digest of `seed`.
///
/// The digest is read as a big-endian integer and reduced modulo the number
/// of values. Returns `None` only when `values` is empty.
pub fn pick<'a, T>(seed: &str, values: &'a [T]) -> Option<&'a T> {
    if values.is_empty() {
        return None;
    }
    let modulus = values.len() as u128;
    let digest = hash(seed.as_bytes());
    let index = digest
        .0
        .iter()
        .fold(0u128, |acc, &b| (acc * 256 + b as u128) % modulus);
    values.get(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let h1 = hash(b"hello world");
        let h2 = hash(b"hello world");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = hash(b"test data");
        let parsed = Hash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("0").is_err());
    }

    #[test]
    fn test_display_is_plain_hex() {
        let h = hash(b"test");
        let display = format!("{}", h);
        assert_eq!(display.len(), 64);
        assert_eq!(display, h.to_hex());
    }

    #[test]
    fn test_leading_zeros() {
        let mut bytes = [0xffu8; 32];
        assert_eq!(Hash(bytes).leading_zeros(), 0);

        bytes[0] = 0x0f;
        assert_eq!(Hash(bytes).leading_zeros(), 1);

        bytes[0] = 0x00;
        bytes[1] = 0x01;
        assert_eq!(Hash(bytes).leading_zeros(), 3);

        assert_eq!(Hash([0u8; 32]).leading_zeros(), 64);
    }

    #[test]
    fn test_leading_zeros_matches_hex() {
        let h = hash(b"count me");
        let from_hex = h.to_hex().chars().take_while(|c| *c == '0').count() as u32;
        assert_eq!(h.leading_zeros(), from_hex);
    }

    #[test]
    fn test_field_boundaries_matter() {
        let a = hash_fields(&[b"ab", b"c"]);
        let b = hash_fields(&[b"a", b"bc"]);
        assert_ne!(a, b);

        let a = hash_fields(&[b"P", b"3", b"1\x1fO"]);
        let b = hash_fields(&[b"P\x1f3", b"1", b"O"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_pick_is_deterministic() {
        let glyphs = ['.', '-', '+', 'o'];
        let first = pick("3,4", &glyphs);
        let second = pick("3,4", &glyphs);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn test_pick_empty_values() {
        let empty: [char; 0] = [];
        assert_eq!(pick("seed", &empty), None);
    }
}
