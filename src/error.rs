use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoanError>;

/// Structured failure kinds for lifecycle operations.
///
/// Every business failure is local to a single call and recoverable by the
/// caller: `Conflict` by retrying from a fresh read, the rest by correcting
/// the input or re-querying state first.
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No loan record for borrower: {0}")]
    NotFound(String),
    #[error("Operation not valid in current state: {0}")]
    InvalidState(String),
    #[error("Borrower already has a loan in progress: {0}")]
    AlreadyActive(String),
    #[error("Ineligible: {0}")]
    Ineligible(String),
    #[error("Insufficient payment: {0}")]
    InsufficientPayment(String),
    #[error("No penalty due: {0}")]
    NoPenaltyDue(String),
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LoanError {
    fn from(e: rocksdb::Error) -> Self {
        Self::Storage(Box::new(e))
    }
}
