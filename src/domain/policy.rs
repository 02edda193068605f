use crate::error::{LoanError, Result};
use serde::Deserialize;

/// How a late-payment penalty is sized.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyRule {
    /// A flat amount in minor units.
    Fixed { amount: u64 },
    /// Basis points of the outstanding balance at assessment time.
    BalanceRate { bps: u32 },
}

impl PenaltyRule {
    /// The increment added to the balance when a penalty is assessed.
    pub fn assess(&self, balance: u64) -> u64 {
        match self {
            Self::Fixed { amount } => *amount,
            Self::BalanceRate { bps } => balance.saturating_mul(*bps as u64) / 10_000,
        }
    }
}

/// Underwriting thresholds and amortization terms.
///
/// Supplied at engine construction and immutable thereafter. Deserializable
/// so the CLI can load a policy file; missing fields fall back to the
/// defaults below.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UnderwritingConfig {
    /// Lowest credit score considered well-formed, inclusive.
    pub score_floor: u16,
    /// Highest credit score considered well-formed, inclusive.
    pub score_ceiling: u16,
    /// Eligibility threshold, inclusive: a score equal to it qualifies.
    pub min_credit_score: u16,
    /// Maximum principal as basis points of declared income.
    pub max_loan_to_income_bps: u32,
    /// Number of installments the principal is amortized across.
    pub installments: u32,
    pub penalty: PenaltyRule,
}

impl Default for UnderwritingConfig {
    fn default() -> Self {
        Self {
            score_floor: 300,
            score_ceiling: 850,
            min_credit_score: 600,
            max_loan_to_income_bps: 10_000,
            installments: 4,
            penalty: PenaltyRule::BalanceRate { bps: 1_000 },
        }
    }
}

/// Outcome of an underwriting evaluation. Ineligibility is a normal business
/// outcome, not an error.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Decision {
    Eligible { monthly_payment: u64 },
    Ineligible { reason: String },
}

impl UnderwritingConfig {
    /// Rejects credit scores outside the well-formed range.
    pub fn validate_score(&self, credit_score: u16) -> Result<()> {
        if (self.score_floor..=self.score_ceiling).contains(&credit_score) {
            Ok(())
        } else {
            Err(LoanError::InvalidInput(format!(
                "Credit score {credit_score} outside valid range {}-{}",
                self.score_floor, self.score_ceiling
            )))
        }
    }

    /// Decides eligibility and computes the monthly payment.
    ///
    /// Pure and deterministic: the same inputs always produce the same
    /// decision.
    pub fn evaluate(
        &self,
        principal: u64,
        declared_income: u64,
        credit_score: u16,
    ) -> Result<Decision> {
        if principal == 0 {
            return Err(LoanError::InvalidInput(
                "Principal must be positive".to_string(),
            ));
        }
        if declared_income == 0 {
            return Err(LoanError::InvalidInput(
                "Declared income must be positive".to_string(),
            ));
        }
        self.validate_score(credit_score)?;

        if credit_score < self.min_credit_score {
            return Ok(Decision::Ineligible {
                reason: format!(
                    "Credit score {credit_score} below minimum {}",
                    self.min_credit_score
                ),
            });
        }

        let max_principal =
            declared_income.saturating_mul(self.max_loan_to_income_bps as u64) / 10_000;
        if principal > max_principal {
            return Ok(Decision::Ineligible {
                reason: format!(
                    "Principal {principal} exceeds {max_principal} allowed for declared income {declared_income}"
                ),
            });
        }

        Ok(Decision::Eligible {
            monthly_payment: amortize(principal, self.installments),
        })
    }
}

/// Ceiling division of the balance across the installments left, so the loan
/// fully amortizes with no sub-unit residual on the final installment.
///
/// Floors the installment count at 1 and never returns more than the balance.
pub fn amortize(balance: u64, remaining_installments: u32) -> u64 {
    if balance == 0 {
        return 0;
    }
    balance.div_ceil(remaining_installments.max(1) as u64)
}
