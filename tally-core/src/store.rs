//! The persistence seam: find/insert/update/delete by owner + id.
//!
//! Real deployments put a database behind [`TransactionStore`]; the
//! in-memory implementation backs the CLI and tests.

use chrono::Utc;
use thiserror::Error;

use crate::query::TransactionQuery;
use crate::transaction::{NewTransaction, StoredTransaction, ValidationError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("transaction not found: {id}")]
    NotFound { id: String },
}

pub trait TransactionStore {
    fn insert(&mut self, owner: &str, new: NewTransaction) -> Result<StoredTransaction, StoreError>;

    fn find(&self, query: &TransactionQuery) -> Vec<StoredTransaction>;

    /// Replace the editable fields of `id`. Records of other owners are invisible.
    fn update(
        &mut self,
        owner: &str,
        id: &str,
        new: NewTransaction,
    ) -> Result<StoredTransaction, StoreError>;

    fn delete(&mut self, owner: &str, id: &str) -> Result<StoredTransaction, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<StoredTransaction>,
    next_id: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with already-stored records (e.g. loaded from a file).
    pub fn with_records(records: Vec<StoredTransaction>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|r| r.id.strip_prefix("txn-")?.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        Self { records, next_id }
    }

    pub fn records(&self) -> &[StoredTransaction] {
        &self.records
    }

    fn position(&self, owner: &str, id: &str) -> Result<usize, StoreError> {
        self.records
            .iter()
            .position(|r| r.owner == owner && r.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}

impl TransactionStore for MemoryStore {
    fn insert(
        &mut self,
        owner: &str,
        new: NewTransaction,
    ) -> Result<StoredTransaction, StoreError> {
        let now = Utc::now();
        let valid = new.validate(now)?;
        self.next_id += 1;
        let record = valid.into_stored(format!("txn-{:04}", self.next_id), owner, now);
        log::debug!("inserted {} for {}", record.id, owner);
        self.records.push(record.clone());
        Ok(record)
    }

    fn find(&self, query: &TransactionQuery) -> Vec<StoredTransaction> {
        self.records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect()
    }

    fn update(
        &mut self,
        owner: &str,
        id: &str,
        new: NewTransaction,
    ) -> Result<StoredTransaction, StoreError> {
        let idx = self.position(owner, id)?;
        let valid = new.validate(Utc::now())?;
        let record = &mut self.records[idx];
        valid.apply_to(record);
        Ok(record.clone())
    }

    fn delete(&mut self, owner: &str, id: &str) -> Result<StoredTransaction, StoreError> {
        let idx = self.position(owner, id)?;
        Ok(self.records.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Category, TypeTag};

    fn coffee() -> NewTransaction {
        NewTransaction {
            amount: Some(5.5),
            description: Some("Coffee".to_string()),
            category: Some("Food".to_string()),
            kind: Some("expense".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut store = MemoryStore::new();
        let a = store.insert("u1", coffee()).unwrap();
        let b = store.insert("u1", coffee()).unwrap();
        assert_eq!(a.id, "txn-0001");
        assert_eq!(b.id, "txn-0002");
        assert_eq!(a.kind, TypeTag::Expense);
        assert!(a.created_at.is_some());
    }

    #[test]
    fn test_seeded_store_continues_after_highest_id() {
        let mut seed = MemoryStore::new();
        let first = seed.insert("u1", coffee()).unwrap();
        let mut sparse = first.clone();
        sparse.id = "txn-0007".to_string();
        let mut foreign = first.clone();
        foreign.id = "csv-0042".to_string();

        let mut store = MemoryStore::with_records(vec![first, sparse, foreign]);
        let next = store.insert("u1", coffee()).unwrap();
        assert_eq!(next.id, "txn-0008");
    }

    #[test]
    fn test_insert_rejects_invalid_payload() {
        let mut store = MemoryStore::new();
        let mut bad = coffee();
        bad.kind = Some("transfer".to_string());
        assert!(matches!(
            store.insert("u1", bad),
            Err(StoreError::Validation(ValidationError::InvalidType(_)))
        ));
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_update_and_delete_are_owner_scoped() {
        let mut store = MemoryStore::new();
        let rec = store.insert("u1", coffee()).unwrap();

        let mut edit = coffee();
        edit.category = Some("Entertainment".to_string());
        assert_eq!(
            store.update("u2", &rec.id, edit.clone()),
            Err(StoreError::NotFound { id: rec.id.clone() })
        );
        let updated = store.update("u1", &rec.id, edit).unwrap();
        assert_eq!(updated.category, Some(Category::Entertainment));

        assert!(store.delete("u2", &rec.id).is_err());
        assert_eq!(store.delete("u1", &rec.id).unwrap().id, rec.id);
        assert!(store.find(&TransactionQuery::for_owner("u1")).is_empty());
    }
}
