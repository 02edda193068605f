use crate::error::{LoanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity token for a loan applicant.
///
/// The engine never interprets the token; it is the natural key for loan
/// records and whatever identity scheme the caller uses (account address,
/// customer number) fits behind it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowerId(String);

impl BorrowerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BorrowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BorrowerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A positive monetary amount in the smallest currency unit.
///
/// All money in this crate is integer minor units; `Amount` enforces
/// positivity at the boundary so the arithmetic below never sees zero or
/// negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value as u64))
        } else {
            Err(LoanError::InvalidInput(format!(
                "Amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = LoanError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Requested,
    Approved,
    Rejected,
    Active,
    PenaltyPending,
    Closed,
}

impl LoanStatus {
    /// Terminal records are retained for audit and may be overwritten by a
    /// fresh request; everything else blocks a new loan.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Closed)
    }
}

/// The durable state of one borrower's loan.
///
/// Created on request, priced at approval, then mutated only by payments and
/// penalty assessments until a terminal state is reached.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LoanRecord {
    /// The borrower this record belongs to.
    pub borrower: BorrowerId,
    /// Requested amount, minor units.
    pub principal: u64,
    /// Income declared at request time, minor units.
    pub declared_income: u64,
    /// Credit score as declared at request time.
    pub credit_score: u16,
    pub status: LoanStatus,
    /// Principal plus accrued penalties minus payments; never negative.
    pub remaining_balance: u64,
    /// Fixed at approval, recomputed only by penalty re-amortization.
    pub monthly_payment: u64,
    pub payments_made: u32,
    /// Delinquency-oracle input recorded at the last payment; cleared once a
    /// penalty for it has been assessed.
    pub last_payment_late: bool,
    /// Underwriting reason, populated only on rejected records.
    pub rejection_reason: Option<String>,
}

impl LoanRecord {
    pub fn new(
        borrower: BorrowerId,
        principal: Amount,
        declared_income: Amount,
        credit_score: u16,
    ) -> Self {
        Self {
            borrower,
            principal: principal.value(),
            declared_income: declared_income.value(),
            credit_score,
            status: LoanStatus::Requested,
            remaining_balance: 0,
            monthly_payment: 0,
            payments_made: 0,
            last_payment_late: false,
            rejection_reason: None,
        }
    }

    /// Activates the loan terms decided by underwriting.
    pub fn approve(&mut self, monthly_payment: u64) {
        self.status = LoanStatus::Approved;
        self.remaining_balance = self.principal;
        self.monthly_payment = monthly_payment;
    }

    /// Marks the record rejected, keeping the underwriting reason for audit.
    pub fn reject(&mut self, reason: String) {
        self.status = LoanStatus::Rejected;
        self.rejection_reason = Some(reason);
    }

    /// Deducts a payment and records the delinquency signal.
    ///
    /// A payment must cover the monthly installment, except that the final
    /// payment may equal the remaining balance exactly. Payments above the
    /// remaining balance are rejected so the balance never goes negative.
    pub fn record_payment(&mut self, amount: Amount, is_late: bool) -> Result<()> {
        let amount = amount.value();
        if amount > self.remaining_balance {
            return Err(LoanError::InvalidInput(format!(
                "Payment of {amount} exceeds remaining balance of {}",
                self.remaining_balance
            )));
        }
        if amount < self.monthly_payment && amount != self.remaining_balance {
            return Err(LoanError::InsufficientPayment(format!(
                "Payment of {amount} is below the monthly payment of {}",
                self.monthly_payment
            )));
        }

        self.remaining_balance -= amount;
        self.payments_made += 1;
        self.last_payment_late = is_late;
        self.status = if self.remaining_balance == 0 {
            LoanStatus::Closed
        } else {
            LoanStatus::Active
        };
        Ok(())
    }

    /// Adds a penalty to the balance and re-amortizes the monthly payment
    /// over the installments still outstanding.
    pub fn penalize(&mut self, increment: u64, total_installments: u32) {
        self.remaining_balance = self.remaining_balance.saturating_add(increment);
        let remaining_installments = total_installments.saturating_sub(self.payments_made);
        self.monthly_payment =
            crate::domain::policy::amortize(self.remaining_balance, remaining_installments);
        self.status = LoanStatus::PenaltyPending;
        self.last_payment_late = false;
    }
}
