//! Proof-of-work difficulty predicate
//!
//! A block hash is acceptable when its first three bytes are zero and the
//! fourth byte is not. The fourth-byte check keeps a degenerate all-zero
//! digest from counting as trivially valid.

use crate::core::hash::Hash;

/// Static difficulty setting for mining and block validation.
///
/// `Disabled` accepts any digest; it exists for tests and local
/// experimentation where a real nonce search would take minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Standard,
    Disabled,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Standard
    }
}

impl Difficulty {
    pub fn is_met(&self, hash: &Hash) -> bool {
        match self {
            Difficulty::Standard => is_valid_hash(hash),
            Difficulty::Disabled => true,
        }
    }
}

/// The standard predicate: three leading zero bytes, non-zero fourth byte.
pub fn is_valid_hash(hash: &Hash) -> bool {
    hash.0[0] == 0 && hash.0[1] == 0 && hash.0[2] == 0 && hash.0[3] != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_block_hash() {
        let hash =
            Hash::from_hex("000000fa04f8160395c387277f8b2f14837603383d33809a4db586086168edfa")
                .unwrap();
        assert!(is_valid_hash(&hash));
    }

    #[test]
    fn test_invalid_block_hash() {
        let hash =
            Hash::from_hex("000001fa04f8160395c387277f8b2f14837603383d33809a4db586086168edfa")
                .unwrap();
        assert!(!is_valid_hash(&hash));
    }

    #[test]
    fn test_all_zero_hash_is_invalid() {
        assert!(!is_valid_hash(&Hash::ZERO));
    }

    #[test]
    fn test_disabled_difficulty_accepts_anything() {
        assert!(Difficulty::Disabled.is_met(&Hash::ZERO));

        let mut any = Hash::ZERO;
        any.0[0] = 0xff;
        assert!(Difficulty::Disabled.is_met(&any));
        assert!(!Difficulty::Standard.is_met(&any));
    }
}
