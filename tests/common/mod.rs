use std::io::Write;
use tempfile::NamedTempFile;

/// Roster seeding three members: 1 = plain member, 2 = treasurer,
/// 3 = loan officer. Ids follow insertion order.
pub fn default_roster() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
  {{"name": "Nomsa Dlamini", "email": "nomsa@example.com", "phone": "0820000001", "tier": 2}},
  {{"name": "Treasurer User", "email": "treasurer@example.com", "phone": "0820000002", "tier": 2, "role": "treasurer"}},
  {{"name": "Loan Officer", "email": "officer@example.com", "phone": "0820000003", "tier": 1, "role": "loan-officer"}}
]"#
    )
    .unwrap();
    file.flush().unwrap();
    file
}

/// Writes an event log with the standard header plus the given rows.
pub fn event_log(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "event, actor, payment, loan, amount, term, method, date, note").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}
