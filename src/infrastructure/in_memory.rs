use crate::domain::loan::{BorrowerId, LoanRecord};
use crate::domain::ports::{LoanStore, VersionedRecord};
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory loan store.
///
/// Uses `Arc<RwLock<HashMap<BorrowerId, VersionedRecord>>>` for shared
/// concurrent access. The write lock makes each `put`'s read-compare-write
/// atomic, which is what gives the compare-and-swap its meaning.
#[derive(Default, Clone)]
pub struct InMemoryLoanStore {
    records: Arc<RwLock<HashMap<BorrowerId, VersionedRecord>>>,
}

impl InMemoryLoanStore {
    /// Creates a new, empty in-memory loan store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn get(&self, borrower: &BorrowerId) -> Result<Option<VersionedRecord>> {
        let records = self.records.read().await;
        Ok(records.get(borrower).cloned())
    }

    async fn put(&self, record: LoanRecord, expected: Option<u64>) -> Result<u64> {
        let mut records = self.records.write().await;
        let current = records.get(&record.borrower).map(|v| v.version);
        if current != expected {
            return Err(LoanError::Conflict(format!(
                "Version mismatch for {}: expected {expected:?}, found {current:?}",
                record.borrower
            )));
        }
        let version = expected.unwrap_or(0) + 1;
        records.insert(record.borrower.clone(), VersionedRecord { version, record });
        Ok(version)
    }

    async fn all_records(&self) -> Result<Vec<LoanRecord>> {
        let records = self.records.read().await;
        Ok(records.values().map(|v| v.record.clone()).collect())
    }
}
