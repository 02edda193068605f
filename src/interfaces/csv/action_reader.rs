use crate::error::{LoanError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Request,
    Approve,
    Payment,
    Penalty,
}

/// One row of the loan-actions input.
///
/// Columns not used by an action are left empty: `request` carries amount,
/// income and credit score; `payment` carries amount and the delinquency
/// oracle's `late` verdict; `approve` and `penalty` carry only the borrower.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct LoanAction {
    pub action: ActionType,
    pub borrower: String,
    pub amount: Option<i64>,
    pub income: Option<i64>,
    pub credit_score: Option<u16>,
    pub late: Option<bool>,
}

/// Reads loan actions from a CSV source.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<LoanAction>`,
/// trimming whitespace and tolerating short rows so large inputs stream
/// without loading into memory.
pub struct ActionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ActionReader<R> {
    /// Creates a new `ActionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes actions.
    pub fn actions(self) -> impl Iterator<Item = Result<LoanAction>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LoanError::from))
    }
}
