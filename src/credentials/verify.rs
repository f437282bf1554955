//! Password verification with plaintext fallback.

use super::{
    CredentialError,
    format::{StoredFormat, classify},
    hasher::PasswordHasher,
};
use tracing::debug;

/// Result of checking a supplied secret against a stored one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verification {
    pub matched: bool,
    /// The stored value was plaintext and should be replaced by `new_hash`.
    pub rehash_needed: bool,
    pub new_hash: Option<String>,
}

impl Verification {
    #[must_use]
    pub const fn mismatch() -> Self {
        Self {
            matched: false,
            rehash_needed: false,
            new_hash: None,
        }
    }

    const fn hashed_match() -> Self {
        Self {
            matched: true,
            rehash_needed: false,
            new_hash: None,
        }
    }
}

/// Check `supplied` against `stored`.
///
/// 1. A stored bcrypt digest is verified with bcrypt. Parse failures count as
///    a mismatch and are never returned.
/// 2. Without a bcrypt match, the stored value is compared byte for byte with
///    `supplied`, without normalization. This covers plaintext and malformed
///    rows, and a client that submits the stored digest verbatim.
/// 3. A plaintext match carries a freshly computed `new_hash`; persisting it
///    is left to the caller.
///
/// An empty `supplied` secret never matches.
///
/// # Errors
/// Only fails if computing `new_hash` fails.
pub fn verify(
    supplied: &str,
    stored: Option<&str>,
    hasher: &PasswordHasher,
) -> Result<Verification, CredentialError> {
    if supplied.is_empty() {
        return Ok(Verification::mismatch());
    }

    let format = classify(stored);
    let stored = stored.unwrap_or_default();

    if format == StoredFormat::Hashed {
        match bcrypt::verify(supplied, stored) {
            Ok(true) => return Ok(Verification::hashed_match()),
            Ok(false) => {}
            Err(e) => debug!("stored digest rejected by bcrypt: {e}"),
        }
    }

    if supplied.as_bytes() != stored.as_bytes() {
        return Ok(Verification::mismatch());
    }

    debug!("legacy {format} credential matched, rehash required");

    Ok(Verification {
        matched: true,
        rehash_needed: true,
        new_hash: Some(hasher.hash(supplied)?),
    })
}
