use crate::{
    credentials::{self, PasswordHasher},
    migration::{self, SweepOptions},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub dsn: SecretString,
    pub bcrypt_cost: u32,
    pub dry_run: bool,
}

/// Execute the migration sweep and print its report to stdout.
///
/// Per-record failures are part of the report and do not fail the command.
/// # Errors
/// Returns an error if the cost is invalid or the store cannot be reached or listed.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Migrate args: {:?}", args);

    let hasher = PasswordHasher::new(args.bcrypt_cost).context("invalid --bcrypt-cost")?;

    println!("Starting password migration (plaintext -> bcrypt)...");

    let store = credentials::open(args.dsn.expose_secret())
        .await
        .context("Database connection failed, check --dsn/ZOO_AUTH_DSN and that MySQL is running")?;

    let report = migration::sweep(
        store.as_ref(),
        hasher,
        SweepOptions {
            dry_run: args.dry_run,
        },
    )
    .await
    .context("Failed to read customer credentials")?;

    println!("{report}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_memory_store() {
        let args = Args {
            dsn: SecretString::from("memory://".to_string()),
            bcrypt_cost: 10,
            dry_run: true,
        };
        assert!(execute(args).await.is_ok());
    }

    #[tokio::test]
    async fn migrate_rejects_bad_cost() {
        let args = Args {
            dsn: SecretString::from("memory://".to_string()),
            bcrypt_cost: 3,
            dry_run: false,
        };
        assert!(execute(args).await.is_err());
    }

    #[tokio::test]
    async fn migrate_fails_on_unreachable_store() {
        let args = Args {
            dsn: SecretString::from("ftp://nowhere".to_string()),
            bcrypt_cost: 10,
            dry_run: false,
        };
        assert!(execute(args).await.is_err());
    }
}
