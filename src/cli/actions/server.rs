use crate::{
    api,
    credentials::{self, AuthConfig, CredentialService, PasswordHasher},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub bcrypt_cost: u32,
    pub init_schema: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the cost is invalid, the store is unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let hasher = PasswordHasher::new(args.bcrypt_cost).context("invalid --bcrypt-cost")?;

    let store = credentials::open(args.dsn.expose_secret()).await?;

    if args.init_schema {
        store
            .ensure_schema()
            .await
            .context("Failed to create Customer table")?;
        info!("Customer table ready");
    }

    let service = Arc::new(CredentialService::new(store, AuthConfig::new(hasher)));

    api::new(args.port, service).await
}
