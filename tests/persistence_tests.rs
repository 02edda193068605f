#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("loans_db");

    // 1. First run: request and approve.
    let csv1 = common::actions_csv(&[
        "request, bob, 1000, 5000, 720,",
        "approve, bob, , , ,",
    ]);
    let mut cmd1 = Command::new(cargo_bin!("loanbook"));
    cmd1.arg(csv1.path()).arg("--db-path").arg(&db_path);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("bob,approved,1000,1000,250,0,false"));

    // 2. Second run: the approved loan is recovered and takes a payment.
    let csv2 = common::actions_csv(&["payment, bob, 250, , , false"]);
    let mut cmd2 = Command::new(cargo_bin!("loanbook"));
    cmd2.arg(csv2.path()).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("bob,active,1000,750,250,1,false"));
}
