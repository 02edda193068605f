use crate::domain::loan::{LoanRecord, LoanStatus};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// The loan-book row emitted per borrower. Audit-only fields such as the
/// rejection reason stay out of the tabular output.
#[derive(Serialize)]
struct LoanRow<'a> {
    borrower: &'a str,
    status: LoanStatus,
    principal: u64,
    remaining_balance: u64,
    monthly_payment: u64,
    payments_made: u32,
    last_payment_late: bool,
}

impl<'a> From<&'a LoanRecord> for LoanRow<'a> {
    fn from(record: &'a LoanRecord) -> Self {
        Self {
            borrower: record.borrower.as_str(),
            status: record.status,
            principal: record.principal,
            remaining_balance: record.remaining_balance,
            monthly_payment: record.monthly_payment,
            payments_made: record.payments_made,
            last_payment_late: record.last_payment_late,
        }
    }
}

/// Writes the final loan book as CSV.
pub struct LoanBookWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LoanBookWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_records(&mut self, records: Vec<LoanRecord>) -> Result<()> {
        for record in &records {
            self.writer.serialize(LoanRow::from(record))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
