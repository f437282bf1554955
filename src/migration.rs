//! Batch migration of legacy plaintext passwords to bcrypt.
//!
//! The sweep walks every credential record once, in account order:
//!
//! - bcrypt digests are skipped,
//! - anything else (plaintext, NULL, malformed) is hashed and written back,
//! - in dry-run mode candidates are only reported.
//!
//! A failure on one record is recorded and the sweep moves on. Running it
//! again after a complete run finds nothing to do. Writes are conditional on
//! the value read at listing time, so a password changed mid-sweep is left
//! alone and reported as [`Outcome::Changed`].

use crate::credentials::{
    AccountId, CredentialRecord, CredentialStore, PasswordHasher, StoreError,
    format::{StoredFormat, classify},
};
use std::fmt;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOptions {
    /// Report candidates without writing anything.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Already a bcrypt digest.
    Skipped,
    /// Would be rehashed (dry run).
    WouldMigrate,
    Migrated,
    /// The stored value changed after listing; nothing was written.
    Changed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub account_id: AccountId,
    pub format: StoredFormat,
    pub outcome: Outcome,
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.account_id;
        match &self.outcome {
            Outcome::Skipped => write!(f, "Skipped Customer_ID={id} (already hashed)"),
            Outcome::WouldMigrate => {
                write!(f, "Would re-hash Customer_ID={id} ({})", self.format)
            }
            Outcome::Migrated => write!(f, "Re-hashed Customer_ID={id} ({})", self.format),
            Outcome::Changed => {
                write!(f, "Left Customer_ID={id} alone (password changed during sweep)")
            }
            Outcome::Failed(reason) => write!(f, "Failed to migrate Customer_ID={id}: {reason}"),
        }
    }
}

/// Per-record outcomes of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub dry_run: bool,
    pub records: Vec<RecordOutcome>,
}

impl SweepReport {
    #[must_use]
    pub fn checked(&self) -> usize {
        self.records.len()
    }

    /// Records that are not bcrypt yet, whether or not they were written.
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.format.needs_migration())
            .count()
    }

    #[must_use]
    pub fn migrated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Migrated))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    #[must_use]
    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Changed))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{record}")?;
        }

        writeln!(
            f,
            "Checked {} customers. Found {} plaintext passwords.",
            self.checked(),
            self.candidates()
        )?;

        if self.dry_run {
            write!(f, "Dry run enabled, no updates were written.")
        } else {
            write!(
                f,
                "Migration complete. Re-hashed {} / {} accounts ({} failed, {} already hashed).",
                self.migrated(),
                self.candidates(),
                self.failed(),
                self.skipped()
            )?;
            if self.changed() > 0 {
                write!(
                    f,
                    " {} changed during the sweep and were left alone.",
                    self.changed()
                )?;
            }
            Ok(())
        }
    }
}

/// Run the migration sweep.
///
/// # Errors
/// Returns an error only if the records cannot be listed. Per-record failures
/// are reported in the [`SweepReport`].
#[instrument(skip(store))]
pub async fn sweep(
    store: &dyn CredentialStore,
    hasher: PasswordHasher,
    options: SweepOptions,
) -> Result<SweepReport, StoreError> {
    let records = store.list_secrets().await?;

    info!(
        "Checking {} customers (dry run: {})",
        records.len(),
        options.dry_run
    );

    let mut report = SweepReport {
        dry_run: options.dry_run,
        records: Vec::with_capacity(records.len()),
    };

    for record in records {
        let format = classify(record.secret.as_deref());

        let outcome = if !format.needs_migration() {
            Outcome::Skipped
        } else if options.dry_run {
            Outcome::WouldMigrate
        } else {
            migrate_one(store, hasher, record.clone()).await
        };

        if let Outcome::Failed(reason) = &outcome {
            error!(account_id = record.account_id, "Failed to migrate: {reason}");
        }

        report.records.push(RecordOutcome {
            account_id: record.account_id,
            format,
            outcome,
        });
    }

    Ok(report)
}

async fn migrate_one(
    store: &dyn CredentialStore,
    hasher: PasswordHasher,
    record: CredentialRecord,
) -> Outcome {
    // NULL is migrated as the empty string, which can never log in.
    let secret = record.secret.clone().unwrap_or_default();

    let digest = match tokio::task::spawn_blocking(move || hasher.hash(&secret)).await {
        Ok(Ok(digest)) => digest,
        Ok(Err(e)) => return Outcome::Failed(e.to_string()),
        Err(e) => return Outcome::Failed(format!("hashing task failed: {e}")),
    };

    match store
        .replace_secret(record.account_id, record.secret.as_deref(), &digest)
        .await
    {
        Ok(true) => Outcome::Migrated,
        Ok(false) => Outcome::Changed,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}
