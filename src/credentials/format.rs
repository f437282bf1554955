//! Classification of stored secrets.
//!
//! The `Customer_Password` column is an opaque string. Before comparing
//! anything we decide what it is, so that a value which merely looks like a
//! digest never reaches the bcrypt parser unchecked.

use regex::Regex;
use std::sync::LazyLock;

/// Prefixes of the bcrypt family accepted as stored digests.
pub const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// What a stored secret turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredFormat {
    /// A well-formed bcrypt digest.
    Hashed,
    /// No bcrypt prefix: a legacy plaintext password (also NULL and empty).
    Plaintext,
    /// Carries a bcrypt prefix but is not a parseable digest.
    Malformed,
}

impl StoredFormat {
    /// Whether the migration sweep should rewrite a record in this state.
    #[must_use]
    pub const fn needs_migration(self) -> bool {
        !matches!(self, Self::Hashed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hashed => "hashed",
            Self::Plaintext => "plaintext",
            Self::Malformed => "malformed",
        }
    }
}

impl std::fmt::Display for StoredFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
pub fn has_bcrypt_prefix(stored: &str) -> bool {
    BCRYPT_PREFIXES
        .iter()
        .any(|prefix| stored.starts_with(prefix))
}

/// `$2x$` + two digit cost (04..=31) + `$` + 22 chars salt + 31 chars digest.
static BCRYPT_DIGEST: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\$2[aby]\$(0[4-9]|[12][0-9]|3[01])\$[./A-Za-z0-9]{53}$").ok()
});

fn is_bcrypt_digest(stored: &str) -> bool {
    BCRYPT_DIGEST
        .as_ref()
        .is_some_and(|re| re.is_match(stored))
}

/// Classify a stored secret.
#[must_use]
pub fn classify(stored: Option<&str>) -> StoredFormat {
    match stored {
        Some(value) if has_bcrypt_prefix(value) => {
            if is_bcrypt_digest(value) {
                StoredFormat::Hashed
            } else {
                StoredFormat::Malformed
            }
        }
        _ => StoredFormat::Plaintext,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-formed cost 10 digest in the shape bcryptjs emits
    const DIGEST: &str = "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

    #[test]
    fn classify_bcrypt_variants() {
        assert_eq!(classify(Some(DIGEST)), StoredFormat::Hashed);
        let b = DIGEST.replacen("$2a$", "$2b$", 1);
        assert_eq!(classify(Some(&b)), StoredFormat::Hashed);
        let y = DIGEST.replacen("$2a$", "$2y$", 1);
        assert_eq!(classify(Some(&y)), StoredFormat::Hashed);
    }

    #[test]
    fn classify_plaintext() {
        assert_eq!(classify(Some("hunter2")), StoredFormat::Plaintext);
        assert_eq!(classify(Some("")), StoredFormat::Plaintext);
        assert_eq!(classify(None), StoredFormat::Plaintext);
        // $2x$ is not part of the accepted family
        let x = DIGEST.replacen("$2a$", "$2x$", 1);
        assert_eq!(classify(Some(&x)), StoredFormat::Plaintext);
    }

    #[test]
    fn classify_malformed() {
        assert_eq!(classify(Some("$2b$")), StoredFormat::Malformed);
        assert_eq!(classify(Some("$2b$10$short")), StoredFormat::Malformed);
        let bad_cost = DIGEST.replacen("$10$", "$99$", 1);
        assert_eq!(classify(Some(&bad_cost)), StoredFormat::Malformed);
        let truncated = &DIGEST[..DIGEST.len() - 1];
        assert_eq!(classify(Some(truncated)), StoredFormat::Malformed);
    }

    #[test]
    fn needs_migration() {
        assert!(!StoredFormat::Hashed.needs_migration());
        assert!(StoredFormat::Plaintext.needs_migration());
        assert!(StoredFormat::Malformed.needs_migration());
    }
}
