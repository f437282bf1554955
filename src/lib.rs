//! # zoo-auth (Customer credential verification & migration)
//!
//! `zoo-auth` owns the customer password path of the zoo management backend:
//! registration, login, password change and the administrative sweep that
//! upgrades legacy plaintext passwords to bcrypt.
//!
//! ## Stored secrets
//!
//! The `Customer_Password` column is expected to hold a bcrypt digest
//! (`$2a$`, `$2b$` or `$2y$`). Older rows may still hold the raw password.
//! Every stored value is classified by [`credentials::format::classify`] into
//! hashed, plaintext or malformed before it is compared.
//!
//! ## Self-healing rehash
//!
//! A login that matches a plaintext row succeeds and the row is rewritten with
//! a fresh bcrypt digest. The rewrite is best effort: a failed write is logged
//! and the login still succeeds.
//!
//! ## Batch migration
//!
//! `zoo-auth migrate [--dry-run]` walks every customer row and rehashes the
//! ones that are not bcrypt yet. See [`migration`].

pub mod api;
pub mod cli;
pub mod credentials;
pub mod migration;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
