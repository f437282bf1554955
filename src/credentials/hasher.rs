//! bcrypt hashing with a bounded cost factor.

use super::CredentialError;
use bcrypt::Version;

/// Work factor used when nothing else is configured.
pub const DEFAULT_COST: u32 = 10;
/// Lowest accepted work factor.
pub const MIN_COST: u32 = 10;
/// Highest accepted work factor; above this a login takes well over a second.
pub const MAX_COST: u32 = 14;

/// Hash `secret` with bcrypt at `cost`.
///
/// The output is salted, so two calls never return the same string. It
/// encodes version (`$2b$`), cost, salt and digest and is accepted by
/// [`super::verify::verify`].
///
/// # Errors
/// Returns [`CredentialError::Cost`] if `cost` is outside
/// [`MIN_COST`]`..=`[`MAX_COST`] and [`CredentialError::Hash`] if bcrypt fails.
pub fn hash(secret: &str, cost: u32) -> Result<String, CredentialError> {
    check_cost(cost)?;
    let parts = bcrypt::hash_with_result(secret, cost)?;
    Ok(parts.format_for_version(Version::TwoB))
}

fn check_cost(cost: u32) -> Result<(), CredentialError> {
    if (MIN_COST..=MAX_COST).contains(&cost) {
        Ok(())
    } else {
        Err(CredentialError::Cost { cost })
    }
}

/// A validated cost factor, passed by value into blocking tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// # Errors
    /// Returns [`CredentialError::Cost`] for a cost outside the accepted range.
    pub fn new(cost: u32) -> Result<Self, CredentialError> {
        check_cost(cost)?;
        Ok(Self { cost })
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// # Errors
    /// Returns [`CredentialError::Hash`] if bcrypt fails.
    pub fn hash(&self, secret: &str) -> Result<String, CredentialError> {
        hash(secret, self.cost)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::format::{StoredFormat, classify};

    #[test]
    fn hash_is_salted_bcrypt() {
        let first = hash("hunter2", DEFAULT_COST).unwrap();
        let second = hash("hunter2", DEFAULT_COST).unwrap();

        assert!(first.starts_with("$2b$10$"));
        assert_eq!(first.len(), 60);
        assert_ne!(first, second);
        assert_eq!(classify(Some(&first)), StoredFormat::Hashed);
    }

    #[test]
    fn hash_rejects_cost_out_of_range() {
        assert!(matches!(
            hash("hunter2", 4),
            Err(CredentialError::Cost { cost: 4 })
        ));
        assert!(matches!(
            hash("hunter2", MAX_COST + 1),
            Err(CredentialError::Cost { .. })
        ));
    }

    #[test]
    fn hasher_new() {
        assert!(PasswordHasher::new(MIN_COST - 1).is_err());
        assert_eq!(PasswordHasher::new(12).map(|h| h.cost()).ok(), Some(12));
        assert_eq!(PasswordHasher::default().cost(), DEFAULT_COST);
    }

    #[test]
    fn hasher_hash_embeds_cost() {
        let hasher = PasswordHasher::new(11).unwrap();
        let digest = hasher.hash("s3cret").unwrap();
        assert!(digest.starts_with("$2b$11$"));
    }
}
