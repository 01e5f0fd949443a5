//! Utility functions shared across the node

use crate::error::{NodeError, Result};
use ring::digest::{Context, SHA256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in unix seconds.
pub fn current_timestamp() -> Result<u64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| NodeError::Io(format!("system time error: {e}")))?;

    Ok(duration.as_secs())
}

pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();

    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_digest_is_deterministic() {
        assert_eq!(sha256_digest(b"tinychain"), sha256_digest(b"tinychain"));
        assert_ne!(sha256_digest(b"a"), sha256_digest(b"b"));
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        let ts = current_timestamp().unwrap();
        // Some time after 2020-01-01.
        assert!(ts > 1_577_836_800);
    }
}
