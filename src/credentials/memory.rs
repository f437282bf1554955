//! In-process credential store.

use super::{
    AccountId, CredentialRecord, Customer, CustomerDraft,
    store::{CredentialStore, StoreError},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Row {
    customer: Customer,
    record: CredentialRecord,
}

#[derive(Debug, Default)]
struct State {
    next_id: AccountId,
    rows: BTreeMap<AccountId, Row>,
}

/// Keeps customer rows in a map. Selected with the `memory://` DSN.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a customer with a raw stored value, bypassing hashing.
    /// Used to stage legacy plaintext rows.
    pub async fn insert_raw(&self, draft: &CustomerDraft, secret: Option<&str>) -> Customer {
        let mut state = self.state.write().await;
        state.insert(draft, secret)
    }
}

impl State {
    fn insert(&mut self, draft: &CustomerDraft, secret: Option<&str>) -> Customer {
        self.next_id += 1;
        let id = self.next_id;

        let customer = Customer {
            customer_id: id,
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
        };
        let record = CredentialRecord {
            account_id: id,
            secret: secret.map(ToString::to_string),
            updated_at: Some(Utc::now()),
        };
        self.rows.insert(
            id,
            Row {
                customer: customer.clone(),
                record,
            },
        );

        customer
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_secret(
        &self,
        account_id: AccountId,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.rows.get(&account_id).map(|row| row.record.clone()))
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(Customer, CredentialRecord)>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .values()
            .find(|row| row.customer.email == email)
            .map(|row| (row.customer.clone(), row.record.clone())))
    }

    async fn find_customer(&self, account_id: AccountId) -> Result<Option<Customer>, StoreError> {
        let state = self.state.read().await;
        Ok(state.rows.get(&account_id).map(|row| row.customer.clone()))
    }

    async fn insert_customer(
        &self,
        draft: &CustomerDraft,
        digest: &str,
    ) -> Result<Customer, StoreError> {
        let mut state = self.state.write().await;
        if state.rows.values().any(|row| row.customer.email == draft.email) {
            return Err(StoreError::Conflict);
        }

        Ok(state.insert(draft, Some(digest)))
    }

    async fn update_customer(
        &self,
        account_id: AccountId,
        draft: &CustomerDraft,
    ) -> Result<Customer, StoreError> {
        let mut state = self.state.write().await;
        if state
            .rows
            .values()
            .any(|row| row.customer.email == draft.email && row.customer.customer_id != account_id)
        {
            return Err(StoreError::Conflict);
        }

        let row = state
            .rows
            .get_mut(&account_id)
            .ok_or(StoreError::NotFound(account_id))?;

        row.customer.first_name.clone_from(&draft.first_name);
        row.customer.last_name.clone_from(&draft.last_name);
        row.customer.email.clone_from(&draft.email);
        row.customer.phone.clone_from(&draft.phone);
        row.record.updated_at = Some(Utc::now());

        Ok(row.customer.clone())
    }

    async fn replace_secret(
        &self,
        account_id: AccountId,
        expected: Option<&str>,
        digest: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let row = state
            .rows
            .get_mut(&account_id)
            .ok_or(StoreError::NotFound(account_id))?;

        if row.record.secret.as_deref() != expected {
            return Ok(false);
        }

        row.record.secret = Some(digest.to_string());
        row.record.updated_at = Some(Utc::now());

        Ok(true)
    }

    async fn update_secret(&self, account_id: AccountId, digest: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let row = state
            .rows
            .get_mut(&account_id)
            .ok_or(StoreError::NotFound(account_id))?;

        row.record.secret = Some(digest.to_string());
        row.record.updated_at = Some(Utc::now());

        Ok(())
    }

    async fn list_secrets(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.rows.values().map(|row| row.record.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(email: &str) -> CustomerDraft {
        CustomerDraft {
            first_name: "Ada".to_string(),
            last_name: "Keeper".to_string(),
            email: email.to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn insert_and_lookup() {
        let store = MemoryStore::new();
        let customer = store
            .insert_customer(&draft("ada@zoo.test"), "digest")
            .await
            .unwrap();
        assert_eq!(customer.customer_id, 1);

        let (found, record) = store.find_by_email("ada@zoo.test").await.unwrap().unwrap();
        assert_eq!(found, customer);
        assert_eq!(record.secret.as_deref(), Some("digest"));

        assert!(store.find_by_email("nobody@zoo.test").await.unwrap().is_none());
        assert_eq!(store.find_customer(1).await.unwrap(), Some(customer));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store
            .insert_customer(&draft("ada@zoo.test"), "digest")
            .await
            .unwrap();
        let err = store
            .insert_customer(&draft("ada@zoo.test"), "digest")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn update_secret_replaces_value() {
        let store = MemoryStore::new();
        let customer = store.insert_raw(&draft("ada@zoo.test"), Some("plain")).await;

        store
            .update_secret(customer.customer_id, "digest")
            .await
            .unwrap();
        let record = store
            .find_secret(customer.customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.secret.as_deref(), Some("digest"));

        let err = store.update_secret(99, "digest").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(99)));
    }

    #[tokio::test]
    async fn replace_secret_only_when_unchanged() {
        let store = MemoryStore::new();
        let plain = store.insert_raw(&draft("a@zoo.test"), Some("plain")).await;
        let empty = store.insert_raw(&draft("b@zoo.test"), None).await;

        assert!(!store
            .replace_secret(plain.customer_id, Some("stale"), "digest")
            .await
            .unwrap());
        let record = store.find_secret(plain.customer_id).await.unwrap().unwrap();
        assert_eq!(record.secret.as_deref(), Some("plain"));

        assert!(store
            .replace_secret(plain.customer_id, Some("plain"), "digest")
            .await
            .unwrap());
        assert!(store
            .replace_secret(empty.customer_id, None, "digest")
            .await
            .unwrap());

        let err = store.replace_secret(99, None, "digest").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(99)));
    }

    #[tokio::test]
    async fn update_customer_fields() {
        let store = MemoryStore::new();
        let ada = store.insert_raw(&draft("ada@zoo.test"), Some("plain")).await;
        store.insert_raw(&draft("bob@zoo.test"), Some("plain")).await;

        let mut changed = draft("ada.keeper@zoo.test");
        changed.phone = Some("555-0199".to_string());
        let updated = store
            .update_customer(ada.customer_id, &changed)
            .await
            .unwrap();
        assert_eq!(updated.email, "ada.keeper@zoo.test");
        assert_eq!(updated.phone.as_deref(), Some("555-0199"));

        // Keeping one's own email is not a conflict.
        assert!(store.update_customer(ada.customer_id, &changed).await.is_ok());

        let record = store.find_secret(ada.customer_id).await.unwrap().unwrap();
        assert_eq!(record.secret.as_deref(), Some("plain"));

        let err = store
            .update_customer(ada.customer_id, &draft("bob@zoo.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let err = store
            .update_customer(99, &draft("carol@zoo.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(99)));
    }

    #[tokio::test]
    async fn list_secrets_in_id_order() {
        let store = MemoryStore::new();
        store.insert_raw(&draft("a@zoo.test"), Some("a")).await;
        store.insert_raw(&draft("b@zoo.test"), None).await;

        let ids: Vec<_> = store
            .list_secrets()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.account_id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
