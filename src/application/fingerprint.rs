//! Change fingerprint over observed identity keys.
//!
//! The controller compares consecutive fingerprints to tell rendering churn
//! (the visible window moved, nothing net-new yet) from a view that is truly
//! standing still.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::domain::models::IdentityKey;

/// Order-sensitive digest of a sequence of identity keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for log lines
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

/// SHA-256 over length-prefixed speaker/timestamp pairs, lowercase hex.
///
/// Length prefixes keep `("ab", "c")` and `("a", "bc")` apart.
pub fn fingerprint<'a, I>(keys: I) -> Fingerprint
where
    I: IntoIterator<Item = &'a IdentityKey>,
{
    let mut hasher = Sha256::new();
    for key in keys {
        for part in [&key.speaker, &key.timestamp] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
    }
    Fingerprint(hex::encode(hasher.finalize()))
}
