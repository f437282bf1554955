//! Customer credentials: classification, hashing, verification and storage.

pub mod format;
pub mod hasher;
pub mod memory;
pub mod mysql;
pub mod service;
pub mod store;
pub mod verify;

pub use self::hasher::{DEFAULT_COST, MAX_COST, MIN_COST, PasswordHasher, hash};
pub use self::service::{AuthConfig, AuthError, CredentialService};
pub use self::store::{CredentialStore, StoreError, open};
pub use self::verify::{Verification, verify};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// `Customer.Customer_ID`
pub type AccountId = i32;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("bcrypt cost {cost} outside allowed range {min}..={max}", min = MIN_COST, max = MAX_COST)]
    Cost { cost: u32 },
    #[error("failed to hash secret: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// The stored secret of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub account_id: AccountId,
    /// bcrypt digest, or the raw password for rows not migrated yet.
    pub secret: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Public view of a customer. Never carries the secret.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    #[serde(rename = "Customer_ID")]
    pub customer_id: AccountId,
    #[serde(rename = "First_Name")]
    pub first_name: String,
    #[serde(rename = "Last_Name")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: Option<String>,
}

/// Profile fields of a customer about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}
