//! MySQL backend for the `Customer` table.

use super::{
    AccountId, CredentialRecord, Customer, CustomerDraft,
    store::{CredentialStore, StoreError},
};
use async_trait::async_trait;
use sqlx::{
    Connection, MySqlPool, Row,
    mysql::{MySqlPoolOptions, MySqlRow},
};
use std::time::Duration;
use tracing::{Instrument, debug};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

fn db_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "mysql",
        db.operation = operation,
        db.statement = statement
    )
}

fn customer_from_row(row: &MySqlRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        customer_id: row.try_get("Customer_ID")?,
        first_name: row.try_get("First_Name")?,
        last_name: row.try_get("Last_Name")?,
        email: row.try_get("Email")?,
        phone: row.try_get("Phone")?,
    })
}

fn record_from_row(row: &MySqlRow) -> Result<CredentialRecord, sqlx::Error> {
    Ok(CredentialRecord {
        account_id: row.try_get("Customer_ID")?,
        secret: row.try_get("Customer_Password")?,
        updated_at: row.try_get("Updated_At")?,
    })
}

#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect a small pool to `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .acquire_timeout(Duration::from_secs(10))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        Ok(Self { pool })
    }

    async fn exists(&self, account_id: AccountId) -> Result<bool, StoreError> {
        let query = "SELECT Customer_ID FROM Customer WHERE Customer_ID = ?";
        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(row.is_some())
    }
}

#[async_trait]
impl CredentialStore for MySqlStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(db_span("CREATE", "CREATE TABLE IF NOT EXISTS Customer"))
            .await?;

        Ok(())
    }

    async fn find_secret(
        &self,
        account_id: AccountId,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let query = r"
            SELECT Customer_ID, Customer_Password, Updated_At
            FROM Customer WHERE Customer_ID = ?
        ";
        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(row.as_ref().map(record_from_row).transpose()?)
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(Customer, CredentialRecord)>, StoreError> {
        let query = r"
            SELECT Customer_ID, First_Name, Last_Name, Email, Phone, Customer_Password, Updated_At
            FROM Customer WHERE Email = ?
        ";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        match row {
            Some(row) => Ok(Some((customer_from_row(&row)?, record_from_row(&row)?))),
            None => Ok(None),
        }
    }

    async fn find_customer(&self, account_id: AccountId) -> Result<Option<Customer>, StoreError> {
        let query = r"
            SELECT Customer_ID, First_Name, Last_Name, Email, Phone
            FROM Customer WHERE Customer_ID = ?
        ";
        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(row.as_ref().map(customer_from_row).transpose()?)
    }

    async fn insert_customer(
        &self,
        draft: &CustomerDraft,
        digest: &str,
    ) -> Result<Customer, StoreError> {
        let exists = "SELECT Customer_ID FROM Customer WHERE Email = ?";
        let taken = sqlx::query(exists)
            .bind(&draft.email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", exists))
            .await?;
        if taken.is_some() {
            return Err(StoreError::Conflict);
        }

        let insert = r"
            INSERT INTO Customer (First_Name, Last_Name, Email, Customer_Password, Phone)
            VALUES (?, ?, ?, ?, ?)
        ";
        let result = sqlx::query(insert)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.email)
            .bind(digest)
            .bind(draft.phone.as_deref())
            .execute(&self.pool)
            .instrument(db_span("INSERT", insert))
            .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(StoreError::Conflict);
            }
            Err(err) => return Err(err.into()),
        };

        let customer_id = AccountId::try_from(result.last_insert_id())
            .map_err(|_| StoreError::Invalid(format!("id {}", result.last_insert_id())))?;

        Ok(Customer {
            customer_id,
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
        })
    }

    async fn update_secret(&self, account_id: AccountId, digest: &str) -> Result<(), StoreError> {
        let query = "UPDATE Customer SET Customer_Password = ? WHERE Customer_ID = ?";
        let result = sqlx::query(query)
            .bind(digest)
            .bind(account_id)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await?;

        // 0 affected rows is also what MySQL reports for an unchanged value.
        if result.rows_affected() == 0 && !self.exists(account_id).await? {
            return Err(StoreError::NotFound(account_id));
        }

        Ok(())
    }

    async fn replace_secret(
        &self,
        account_id: AccountId,
        expected: Option<&str>,
        digest: &str,
    ) -> Result<bool, StoreError> {
        let query = r"
            UPDATE Customer SET Customer_Password = ?
            WHERE Customer_ID = ? AND Customer_Password <=> ?
        ";
        let result = sqlx::query(query)
            .bind(digest)
            .bind(account_id)
            .bind(expected)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.exists(account_id).await? {
            debug!(account_id, "stored secret changed, not replaced");
            Ok(false)
        } else {
            Err(StoreError::NotFound(account_id))
        }
    }

    async fn update_customer(
        &self,
        account_id: AccountId,
        draft: &CustomerDraft,
    ) -> Result<Customer, StoreError> {
        let taken = "SELECT Customer_ID FROM Customer WHERE Email = ? AND Customer_ID != ?";
        let other = sqlx::query(taken)
            .bind(&draft.email)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", taken))
            .await?;
        if other.is_some() {
            return Err(StoreError::Conflict);
        }

        let update = r"
            UPDATE Customer SET First_Name = ?, Last_Name = ?, Email = ?, Phone = ?
            WHERE Customer_ID = ?
        ";
        let result = sqlx::query(update)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.email)
            .bind(draft.phone.as_deref())
            .bind(account_id)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", update))
            .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(StoreError::Conflict);
            }
            Err(err) => return Err(err.into()),
        }

        self.find_customer(account_id)
            .await?
            .ok_or(StoreError::NotFound(account_id))
    }

    async fn list_secrets(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        let query = r"
            SELECT Customer_ID, Customer_Password, Updated_At
            FROM Customer ORDER BY Customer_ID
        ";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
