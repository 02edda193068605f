use std::io::Write;
use tempfile::NamedTempFile;

/// Writes a loan-actions CSV with the standard header and the given rows.
pub fn actions_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "action, borrower, amount, income, credit_score, late").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}
