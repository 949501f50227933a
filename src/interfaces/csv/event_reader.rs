use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A member submits a contribution payment.
    Submit,
    /// A reviewer confirms a pending payment.
    Approve,
    /// A reviewer rejects a pending payment.
    Reject,
    /// A member applies for a loan.
    Loan,
    ApproveLoan,
    RejectLoan,
    /// A reviewer records a loan repayment.
    Repay,
}

/// One row of the batch event log.
///
/// `actor` is the credential token presented to the access gate. The other
/// columns are optional and event-specific; the replay loop validates that
/// the ones an event needs are present.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LedgerEvent {
    pub event: EventKind,
    pub actor: String,
    pub payment: Option<u64>,
    pub loan: Option<u64>,
    pub amount: Option<Decimal>,
    pub term: Option<u32>,
    pub method: Option<String>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Reads ledger events from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding events lazily so large logs stream without loading fully into
/// memory.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn events(self) -> impl Iterator<Item = Result<LedgerEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
