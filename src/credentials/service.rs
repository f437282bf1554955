//! Customer authentication flows on top of a [`CredentialStore`].

use super::{
    AccountId, CredentialError, Customer, CustomerDraft,
    hasher::PasswordHasher,
    store::{CredentialStore, StoreError},
    verify::{Verification, verify},
};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info, instrument, warn};

/// Minimum length of a new password, as enforced by the storefront.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown account or wrong secret.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(&'static str),
    /// Wrong current password on a password change.
    #[error("current password is incorrect")]
    IncorrectPassword,
    /// The email belongs to another customer.
    #[error("{0}")]
    Conflict(&'static str),
    #[error("account not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("hashing task failed: {0}")]
    Task(#[from] JoinError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict("Email already registered"),
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    hasher: PasswordHasher,
}

impl AuthConfig {
    #[must_use]
    pub const fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }

    #[must_use]
    pub const fn hasher(&self) -> PasswordHasher {
        self.hasher
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(PasswordHasher::default())
    }
}

/// Login, registration and password change for customers.
///
/// bcrypt runs on the blocking pool.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    config: AuthConfig,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CredentialService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate a customer by email and password.
    ///
    /// A match against a legacy plaintext row rewrites it with a bcrypt
    /// digest. That write is best effort and never changes the outcome.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] for an unknown email or a wrong
    /// password, [`AuthError::Storage`] if the lookup itself fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Customer, AuthError> {
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::Validation("Email and password are required"));
        }

        let Some((customer, record)) = self
            .store
            .find_by_email(email)
            .await
            .map_err(AuthError::Storage)?
        else {
            debug!("Unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        let verification = self.check(password, record.secret).await?;
        if !verification.matched {
            debug!(account_id = customer.customer_id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(new_hash) = verification.new_hash {
            self.heal(customer.customer_id, &new_hash).await;
        }

        Ok(customer)
    }

    /// Register a new customer, storing only the bcrypt digest.
    ///
    /// # Errors
    /// [`AuthError::Validation`] for missing fields, [`AuthError::Conflict`]
    /// if the email is taken, [`AuthError::Storage`] on database failure.
    #[instrument(skip(self, draft, password), fields(email = %draft.email))]
    pub async fn register(
        &self,
        draft: CustomerDraft,
        password: &SecretString,
    ) -> Result<Customer, AuthError> {
        if draft.first_name.is_empty()
            || draft.last_name.is_empty()
            || draft.email.is_empty()
            || password.expose_secret().is_empty()
        {
            return Err(AuthError::Validation("All required fields must be provided"));
        }

        if !valid_email(&draft.email) {
            return Err(AuthError::Validation("Invalid email"));
        }

        let digest = self.hash(password).await?;
        let customer = self.store.insert_customer(&draft, &digest).await?;

        info!(account_id = customer.customer_id, "Customer registered");

        Ok(customer)
    }

    /// Replace a customer's password after checking the current one.
    ///
    /// The current password may still be a legacy plaintext value; the new one
    /// is always stored hashed.
    ///
    /// # Errors
    /// [`AuthError::Validation`], [`AuthError::NotFound`],
    /// [`AuthError::IncorrectPassword`] or [`AuthError::Storage`].
    #[instrument(skip(self, current, new))]
    pub async fn change_password(
        &self,
        account_id: AccountId,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), AuthError> {
        if current.expose_secret().is_empty() || new.expose_secret().is_empty() {
            return Err(AuthError::Validation(
                "Current and new password are required",
            ));
        }

        if new.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(
                "New password must be at least 6 characters",
            ));
        }

        let record = self
            .store
            .find_secret(account_id)
            .await
            .map_err(AuthError::Storage)?
            .ok_or(AuthError::NotFound)?;

        if !self.check(current, record.secret).await?.matched {
            return Err(AuthError::IncorrectPassword);
        }

        let digest = self.hash(new).await?;
        self.store.update_secret(account_id, &digest).await?;

        info!(account_id, "Password changed");

        Ok(())
    }

    /// Replace a customer's name, email and phone.
    ///
    /// # Errors
    /// [`AuthError::Validation`] for missing fields, [`AuthError::Conflict`]
    /// if another customer has the email, [`AuthError::NotFound`] or
    /// [`AuthError::Storage`].
    #[instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn update_profile(
        &self,
        account_id: AccountId,
        draft: CustomerDraft,
    ) -> Result<Customer, AuthError> {
        if draft.first_name.is_empty() || draft.last_name.is_empty() || draft.email.is_empty() {
            return Err(AuthError::Validation(
                "First name, last name, and email are required",
            ));
        }

        if !valid_email(&draft.email) {
            return Err(AuthError::Validation("Invalid email"));
        }

        let customer = self
            .store
            .update_customer(account_id, &draft)
            .await
            .map_err(|err| match err {
                StoreError::Conflict => {
                    AuthError::Conflict("Email already in use by another account")
                }
                other => other.into(),
            })?;

        info!(account_id, "Profile updated");

        Ok(customer)
    }

    /// # Errors
    /// [`AuthError::NotFound`] or [`AuthError::Storage`].
    #[instrument(skip(self))]
    pub async fn profile(&self, account_id: AccountId) -> Result<Customer, AuthError> {
        self.store
            .find_customer(account_id)
            .await
            .map_err(AuthError::Storage)?
            .ok_or(AuthError::NotFound)
    }

    async fn check(
        &self,
        supplied: &SecretString,
        stored: Option<String>,
    ) -> Result<Verification, AuthError> {
        let hasher = self.config.hasher;
        let supplied = SecretString::from(supplied.expose_secret().to_owned());

        let verification = tokio::task::spawn_blocking(move || {
            verify(supplied.expose_secret(), stored.as_deref(), &hasher)
        })
        .await??;

        Ok(verification)
    }

    async fn hash(&self, secret: &SecretString) -> Result<String, AuthError> {
        let hasher = self.config.hasher;
        let secret = SecretString::from(secret.expose_secret().to_owned());

        let digest =
            tokio::task::spawn_blocking(move || hasher.hash(secret.expose_secret())).await??;

        Ok(digest)
    }

    /// Persist a rehashed legacy credential. Failures are logged only.
    async fn heal(&self, account_id: AccountId, new_hash: &str) {
        match self.store.update_secret(account_id, new_hash).await {
            Ok(()) => info!(account_id, "Rehashed legacy plaintext password"),
            Err(err) => warn!(account_id, "Failed to rehash legacy plaintext password: {err}"),
        }
    }
}

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

fn valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}
