use crate::domain::loan::{Amount, BorrowerId, LoanRecord, LoanStatus};
use crate::domain::policy::{Decision, UnderwritingConfig};
use crate::domain::ports::LoanStoreBox;
use crate::error::{LoanError, Result};

/// Attempts per operation before a CAS conflict is surfaced to the caller.
const CAS_ATTEMPTS: usize = 3;

/// The loan lifecycle state machine.
///
/// `LoanEngine` validates transitions, applies the underwriting policy and
/// the monetary rules, and writes each new record back through the store's
/// compare-and-swap. It holds no record state across calls, never reads a
/// clock (delinquency arrives as an `is_late` input), and never logs; all
/// failures are structured values returned to the caller.
pub struct LoanEngine {
    store: LoanStoreBox,
    config: UnderwritingConfig,
}

impl LoanEngine {
    /// Creates an engine over the given store. The underwriting configuration
    /// is immutable for the engine's lifetime.
    pub fn new(store: LoanStoreBox, config: UnderwritingConfig) -> Self {
        Self { store, config }
    }

    /// Creates a `Requested` record for the borrower.
    ///
    /// Eligibility is NOT decided here; request and approval are separate
    /// operations matching the two-party protocol (borrower requests, owner
    /// approves). A record in any non-terminal state blocks a new request;
    /// a `Closed` or `Rejected` record is overwritten by the fresh one.
    pub async fn request_loan(
        &self,
        borrower: BorrowerId,
        principal: i64,
        declared_income: i64,
        credit_score: u16,
    ) -> Result<LoanRecord> {
        let principal = Amount::new(principal)?;
        let declared_income = Amount::new(declared_income)?;
        self.config.validate_score(credit_score)?;

        for _ in 0..CAS_ATTEMPTS {
            let current = self.store.get(&borrower).await?;
            if let Some(versioned) = &current
                && !versioned.record.status.is_terminal()
            {
                return Err(LoanError::AlreadyActive(borrower.to_string()));
            }

            let record = LoanRecord::new(
                borrower.clone(),
                principal,
                declared_income,
                credit_score,
            );
            match self
                .store
                .put(record.clone(), current.map(|v| v.version))
                .await
            {
                Ok(_) => return Ok(record),
                Err(LoanError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(LoanError::Conflict(format!(
            "Gave up requesting a loan for {borrower} after {CAS_ATTEMPTS} attempts"
        )))
    }

    /// Runs underwriting on a `Requested` record.
    ///
    /// An ineligible applicant transitions to `Rejected` and the record is
    /// returned as a normal outcome, carrying the reason; only malformed
    /// state or input surfaces as an error.
    pub async fn approve_loan(&self, borrower: &BorrowerId) -> Result<LoanRecord> {
        self.transition(borrower, |record| {
            if record.status != LoanStatus::Requested {
                return Err(LoanError::InvalidState(format!(
                    "Cannot approve a loan in {:?} state",
                    record.status
                )));
            }
            match self.config.evaluate(
                record.principal,
                record.declared_income,
                record.credit_score,
            )? {
                Decision::Eligible { monthly_payment } => record.approve(monthly_payment),
                Decision::Ineligible { reason } => record.reject(reason),
            }
            Ok(())
        })
        .await
    }

    /// Deducts a payment from the outstanding balance.
    ///
    /// Valid from `Approved` (first payment), `Active`, and `PenaltyPending`
    /// (which it clears back to `Active`). Closes the loan when the balance
    /// reaches zero. `is_late` is the delinquency oracle's verdict for this
    /// payment and is recorded for a later penalty assessment.
    pub async fn make_payment(
        &self,
        borrower: &BorrowerId,
        amount: i64,
        is_late: bool,
    ) -> Result<LoanRecord> {
        let amount = Amount::new(amount)?;
        self.transition(borrower, |record| {
            if !matches!(
                record.status,
                LoanStatus::Approved | LoanStatus::Active | LoanStatus::PenaltyPending
            ) {
                return Err(LoanError::InvalidState(format!(
                    "Cannot take a payment on a loan in {:?} state",
                    record.status
                )));
            }
            record.record_payment(amount, is_late)
        })
        .await
    }

    /// Assesses the configured penalty against a delinquent loan.
    ///
    /// Requires a recorded late payment; assessing twice without a new late
    /// payment in between fails with `NoPenaltyDue`, so penalties never
    /// stack. The balance increases and the monthly payment is re-amortized
    /// over the remaining installments.
    pub async fn apply_penalty(&self, borrower: &BorrowerId) -> Result<LoanRecord> {
        self.transition(borrower, |record| {
            if !matches!(
                record.status,
                LoanStatus::Active | LoanStatus::PenaltyPending
            ) {
                return Err(LoanError::InvalidState(format!(
                    "Cannot penalize a loan in {:?} state",
                    record.status
                )));
            }
            if !record.last_payment_late {
                return Err(LoanError::NoPenaltyDue(format!(
                    "Last payment by {} was not late",
                    record.borrower
                )));
            }
            let increment = self.config.penalty.assess(record.remaining_balance);
            record.penalize(increment, self.config.installments);
            Ok(())
        })
        .await
    }

    pub async fn get_loan(&self, borrower: &BorrowerId) -> Result<LoanRecord> {
        self.store
            .get(borrower)
            .await?
            .map(|versioned| versioned.record)
            .ok_or_else(|| LoanError::NotFound(borrower.to_string()))
    }

    /// Consumes the engine and returns the loan book, sorted by borrower.
    pub async fn into_results(self) -> Result<Vec<LoanRecord>> {
        let mut records = self.store.all_records().await?;
        records.sort_by(|a, b| a.borrower.cmp(&b.borrower));
        Ok(records)
    }

    /// One read-validate-write transaction over an existing record, retried
    /// from a fresh read when the store reports a concurrent modification.
    async fn transition<F>(&self, borrower: &BorrowerId, mut apply: F) -> Result<LoanRecord>
    where
        F: FnMut(&mut LoanRecord) -> Result<()>,
    {
        for _ in 0..CAS_ATTEMPTS {
            let Some(versioned) = self.store.get(borrower).await? else {
                return Err(LoanError::NotFound(borrower.to_string()));
            };
            let mut record = versioned.record;
            apply(&mut record)?;

            match self.store.put(record.clone(), Some(versioned.version)).await {
                Ok(_) => return Ok(record),
                Err(LoanError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(LoanError::Conflict(format!(
            "Gave up updating the loan for {borrower} after {CAS_ATTEMPTS} attempts"
        )))
    }
}
