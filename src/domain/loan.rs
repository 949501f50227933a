use crate::domain::member::MemberId;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type LoanId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    Repaid,
}

/// A member loan.
///
/// Loan arithmetic runs on f64: the repayment schedule quotes IEEE-double
/// figures and settlement compares against exactly those figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub member_id: MemberId,
    pub amount: f64,
    pub term_weeks: u32,
    /// Annual interest rate in percent, snapshotted at application time.
    pub interest_rate: f64,
    pub outstanding: f64,
    pub next_payment: Option<NaiveDate>,
    pub status: LoanStatus,
    pub application_date: NaiveDate,
    pub application_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Application input, before the ledger assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApplication {
    pub amount: f64,
    pub term_weeks: u32,
    pub details: Option<serde_json::Value>,
}

impl Loan {
    /// Total owed at issue: simple interest pro-rated over the term.
    pub fn schedule(amount: f64, rate: f64, term_weeks: u32) -> f64 {
        amount * (1.0 + (rate / 100.0) * (term_weeks as f64 / 52.0))
    }

    pub fn apply(
        member_id: MemberId,
        application: LoanApplication,
        rate: f64,
        applied_on: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        if application.amount <= 0.0 {
            return Err(LedgerError::Validation(
                "loan amount must be positive".to_string(),
            ));
        }
        if application.term_weeks == 0 {
            return Err(LedgerError::Validation(
                "loan term must be at least one week".to_string(),
            ));
        }
        Ok(Self {
            id: 0,
            member_id,
            amount: application.amount,
            term_weeks: application.term_weeks,
            interest_rate: rate,
            outstanding: Self::schedule(application.amount, rate, application.term_weeks),
            next_payment: None,
            status: LoanStatus::Pending,
            application_date: applied_on,
            application_details: application.details,
            created_at: at,
        })
    }

    fn guard_pending(&self) -> Result<()> {
        if self.status != LoanStatus::Pending {
            return Err(LedgerError::InvalidStateTransition(format!(
                "loan {} is already {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// `pending -> approved`; schedules the first repayment.
    pub fn approve(&mut self, first_payment: NaiveDate) -> Result<()> {
        self.guard_pending()?;
        self.status = LoanStatus::Approved;
        self.next_payment = Some(first_payment);
        Ok(())
    }

    /// `pending -> rejected`.
    pub fn reject(&mut self) -> Result<()> {
        self.guard_pending()?;
        self.status = LoanStatus::Rejected;
        Ok(())
    }

    /// Applies a repayment against the outstanding balance. The first
    /// repayment moves an approved loan to `Active`; settling the full
    /// outstanding derives `Repaid`.
    pub fn record_repayment(&mut self, amount: f64) -> Result<()> {
        match self.status {
            LoanStatus::Approved | LoanStatus::Active => {}
            _ => {
                return Err(LedgerError::InvalidStateTransition(format!(
                    "loan {} is {:?}, not open for repayment",
                    self.id, self.status
                )));
            }
        }
        if amount <= 0.0 {
            return Err(LedgerError::Validation(
                "repayment must be positive".to_string(),
            ));
        }
        if amount > self.outstanding {
            return Err(LedgerError::Validation(format!(
                "repayment {} exceeds outstanding {}",
                amount, self.outstanding
            )));
        }
        self.outstanding -= amount;
        self.status = if self.outstanding == 0.0 {
            LoanStatus::Repaid
        } else {
            LoanStatus::Active
        };
        Ok(())
    }
}
