//! End-to-end lifecycle scenarios against the public engine API.

use loanbook::application::engine::LoanEngine;
use loanbook::domain::loan::{BorrowerId, LoanStatus};
use loanbook::domain::policy::UnderwritingConfig;
use loanbook::error::LoanError;
use loanbook::infrastructure::in_memory::InMemoryLoanStore;

fn engine() -> LoanEngine {
    // Min score 600, 1.0x income cap, 4 installments, 10% balance penalty.
    LoanEngine::new(
        Box::new(InMemoryLoanStore::new()),
        UnderwritingConfig::default(),
    )
}

#[tokio::test]
async fn test_request_and_approval() {
    let engine = engine();
    let bob = BorrowerId::new("bob");

    let record = engine
        .request_loan(bob.clone(), 1000, 5000, 720)
        .await
        .unwrap();
    assert_eq!(record.status, LoanStatus::Requested);

    let record = engine.approve_loan(&bob).await.unwrap();
    assert_eq!(record.status, LoanStatus::Approved);
    assert_eq!(record.monthly_payment, 250);
    assert_eq!(record.remaining_balance, 1000);
}

#[tokio::test]
async fn test_full_repayment_with_late_final_payment() {
    let engine = engine();
    let bob = BorrowerId::new("bob");
    engine
        .request_loan(bob.clone(), 1000, 5000, 720)
        .await
        .unwrap();
    engine.approve_loan(&bob).await.unwrap();

    for expected in [750, 500, 250] {
        let record = engine.make_payment(&bob, 250, false).await.unwrap();
        assert_eq!(record.status, LoanStatus::Active);
        assert_eq!(record.remaining_balance, expected);
    }

    // The final payment closes the loan even when the oracle marks it late;
    // the late flag survives for audit but no penalty can follow closure.
    let record = engine.make_payment(&bob, 250, true).await.unwrap();
    assert_eq!(record.status, LoanStatus::Closed);
    assert_eq!(record.remaining_balance, 0);
    assert!(record.last_payment_late);

    assert!(matches!(
        engine.apply_penalty(&bob).await,
        Err(LoanError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_late_payment_penalty_and_recovery() {
    let engine = engine();
    let bob = BorrowerId::new("bob");
    engine
        .request_loan(bob.clone(), 1000, 5000, 720)
        .await
        .unwrap();
    engine.approve_loan(&bob).await.unwrap();

    engine.make_payment(&bob, 250, false).await.unwrap();
    let record = engine.make_payment(&bob, 250, true).await.unwrap();
    assert_eq!(record.remaining_balance, 500);
    assert_eq!(record.status, LoanStatus::Active);

    let record = engine.apply_penalty(&bob).await.unwrap();
    assert_eq!(record.status, LoanStatus::PenaltyPending);
    assert_eq!(record.remaining_balance, 550);
    assert_eq!(record.monthly_payment, 275);

    let record = engine.make_payment(&bob, 275, false).await.unwrap();
    assert_eq!(record.status, LoanStatus::Active);
    assert_eq!(record.remaining_balance, 275);
}

#[tokio::test]
async fn test_penalty_never_stacks() {
    let engine = engine();
    let bob = BorrowerId::new("bob");
    engine
        .request_loan(bob.clone(), 1000, 5000, 720)
        .await
        .unwrap();
    engine.approve_loan(&bob).await.unwrap();
    engine.make_payment(&bob, 250, true).await.unwrap();

    engine.apply_penalty(&bob).await.unwrap();
    assert!(matches!(
        engine.apply_penalty(&bob).await,
        Err(LoanError::NoPenaltyDue(_))
    ));
}

#[tokio::test]
async fn test_underwriting_rejection_is_terminal() {
    let engine = engine();
    let bob = BorrowerId::new("bob");
    engine
        .request_loan(bob.clone(), 1000, 5000, 550)
        .await
        .unwrap();

    let record = engine.approve_loan(&bob).await.unwrap();
    assert_eq!(record.status, LoanStatus::Rejected);
    assert_eq!(record.remaining_balance, 0);
    assert!(record.rejection_reason.is_some());

    assert!(matches!(
        engine.make_payment(&bob, 250, false).await,
        Err(LoanError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_duplicate_request_rejected_until_terminal() {
    let engine = engine();
    let bob = BorrowerId::new("bob");
    engine
        .request_loan(bob.clone(), 1000, 5000, 720)
        .await
        .unwrap();
    assert!(matches!(
        engine.request_loan(bob.clone(), 1000, 5000, 720).await,
        Err(LoanError::AlreadyActive(_))
    ));

    engine.approve_loan(&bob).await.unwrap();
    assert!(matches!(
        engine.request_loan(bob.clone(), 1000, 5000, 720).await,
        Err(LoanError::AlreadyActive(_))
    ));

    // Repay in full, then a fresh request starts a new record.
    engine.make_payment(&bob, 1000, false).await.unwrap();
    let record = engine
        .request_loan(bob.clone(), 500, 5000, 720)
        .await
        .unwrap();
    assert_eq!(record.status, LoanStatus::Requested);
    assert_eq!(record.principal, 500);
    assert_eq!(record.payments_made, 0);
}

#[tokio::test]
async fn test_loan_book_is_sorted_by_borrower() {
    let engine = engine();
    for name in ["dave", "alice", "carol"] {
        engine
            .request_loan(BorrowerId::new(name), 1000, 5000, 720)
            .await
            .unwrap();
    }

    let records = engine.into_results().await.unwrap();
    let borrowers: Vec<&str> = records.iter().map(|r| r.borrower.as_str()).collect();
    assert_eq!(borrowers, vec!["alice", "carol", "dave"]);
}
