//! Block hash type and its hex codec
//!
//! A hash is the SHA-256 digest of a block's canonical JSON encoding. The
//! zero value is reserved: it marks "no parent" on the first block and is
//! the cursor peers send to request a chain from genesis.

use data_encoding::HEXLOWER;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const HASH_LENGTH: usize = 32;

/// 32-byte block digest, printable as 64 lowercase hex chars.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// The reserved "no parent" / genesis-root value.
    pub const ZERO: Hash = Hash([0u8; HASH_LENGTH]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Option<Hash> {
        if s.len() != HASH_LENGTH * 2 {
            return None;
        }
        let bytes = HEXLOWER.decode(s.as_bytes()).ok()?;
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(&bytes);
        Some(Hash(out))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).ok_or_else(|| D::Error::custom(format!("invalid hash hex: '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_hash() {
        assert!(Hash::ZERO.is_zero());
        assert!(Hash::default().is_zero());

        let mut nonzero = Hash::ZERO;
        nonzero.0[31] = 1;
        assert!(!nonzero.is_zero());
    }

    #[test]
    fn test_hex_round_trip() {
        let mut h = Hash::ZERO;
        h.0[0] = 0xab;
        h.0[31] = 0x01;

        let hex = h.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ab"));
        assert_eq!(Hash::from_hex(&hex), Some(h));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert_eq!(Hash::from_hex("ab"), None);
        assert_eq!(Hash::from_hex(&"zz".repeat(32)), None);
        // Uppercase is not part of the codec.
        assert_eq!(Hash::from_hex(&"AB".repeat(32)), None);
    }

    #[test]
    fn test_json_codec() {
        let h =
            Hash::from_hex("000000fa04f8160395c387277f8b2f14837603383d33809a4db586086168edfa")
                .unwrap();
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(
            json,
            "\"000000fa04f8160395c387277f8b2f14837603383d33809a4db586086168edfa\""
        );
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
