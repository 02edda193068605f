use crate::domain::loan::{BorrowerId, LoanRecord};
use crate::domain::ports::{LoanStore, VersionedRecord};
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing versioned loan records.
pub const CF_LOANS: &str = "loans";

/// A persistent loan store backed by RocksDB.
///
/// Records are stored as serde_json-encoded `VersionedRecord`s keyed by the
/// borrower id bytes. RocksDB has no native compare-and-swap, so all `put`s
/// serialize on one async mutex to keep the read-compare-write atomic; reads
/// go straight to the database.
///
/// `Clone` shares the underlying `Arc<DB>` and the write lock.
#[derive(Clone)]
pub struct RocksDbLoanStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbLoanStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the loans column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_loans = ColumnFamilyDescriptor::new(CF_LOANS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_loans])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf_handle(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_LOANS).ok_or_else(|| {
            LoanError::Storage(Box::new(std::io::Error::other(
                "Loans column family not found",
            )))
        })
    }

    fn read(&self, borrower: &BorrowerId) -> Result<Option<VersionedRecord>> {
        let cf = self.cf_handle()?;
        match self.db.get_cf(cf, borrower.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LoanStore for RocksDbLoanStore {
    async fn get(&self, borrower: &BorrowerId) -> Result<Option<VersionedRecord>> {
        self.read(borrower)
    }

    async fn put(&self, record: LoanRecord, expected: Option<u64>) -> Result<u64> {
        let _guard = self.write_lock.lock().await;

        let current = self.read(&record.borrower)?.map(|v| v.version);
        if current != expected {
            return Err(LoanError::Conflict(format!(
                "Version mismatch for {}: expected {expected:?}, found {current:?}",
                record.borrower
            )));
        }

        let version = expected.unwrap_or(0) + 1;
        let key = record.borrower.as_str().as_bytes().to_vec();
        let value = serde_json::to_vec(&VersionedRecord { version, record })?;
        let cf = self.cf_handle()?;
        self.db.put_cf(cf, key, value)?;

        Ok(version)
    }

    async fn all_records(&self) -> Result<Vec<LoanRecord>> {
        let cf = self.cf_handle()?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let versioned: VersionedRecord = serde_json::from_slice(&value)?;
            records.push(versioned.record);
        }
        Ok(records)
    }
}
