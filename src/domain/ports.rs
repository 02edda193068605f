use super::loan::{BorrowerId, LoanRecord};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A loan record together with its compare-and-swap token.
///
/// The version increments on every successful `put`; writers key their update
/// on the version they observed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct VersionedRecord {
    pub version: u64,
    pub record: LoanRecord,
}

/// The engine's storage port: one record per borrower, written through an
/// optimistic compare-and-swap.
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn get(&self, borrower: &BorrowerId) -> Result<Option<VersionedRecord>>;

    /// Stores the record if the current version matches `expected`.
    ///
    /// `None` asserts no record exists for the borrower yet. On a mismatch
    /// nothing is written and the call fails with `Conflict`; on success the
    /// new version is returned.
    async fn put(&self, record: LoanRecord, expected: Option<u64>) -> Result<u64>;

    async fn all_records(&self) -> Result<Vec<LoanRecord>>;
}

pub type LoanStoreBox = Box<dyn LoanStore>;
