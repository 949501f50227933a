use crate::domain::member::MemberId;
use crate::domain::money::Amount;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type PaymentId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// A member's claim that a contribution was paid, awaiting review.
///
/// Submission is the only way a record enters the queue; once it reaches
/// `Confirmed` or `Rejected` it never changes again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub id: PaymentId,
    pub member_id: MemberId,
    /// Member name at submission time, kept on the record for review lists.
    pub member_name: String,
    pub amount: Amount,
    pub method: String,
    pub reference: Option<String>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// Reference to an uploaded proof artifact; the transport that produced
    /// it is outside this crate.
    pub proof_path: Option<String>,
    pub status: PaymentStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Submission input, before the ledger assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSubmission {
    pub amount: Amount,
    pub method: String,
    pub reference: Option<String>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub proof_path: Option<String>,
}

impl PendingPayment {
    pub fn new(
        member_id: MemberId,
        member_name: String,
        submission: PaymentSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self> {
        if submission.method.trim().is_empty() {
            return Err(LedgerError::Validation(
                "payment method must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: 0,
            member_id,
            member_name,
            amount: submission.amount,
            method: submission.method,
            reference: submission.reference,
            date: submission.date,
            notes: submission.notes,
            proof_path: submission.proof_path,
            status: PaymentStatus::Pending,
            submitted_at,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
        })
    }

    fn guard_pending(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(LedgerError::InvalidStateTransition(format!(
                "payment {} is already {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// `pending -> confirmed`. Fails on terminal records without touching
    /// anything.
    pub fn confirm(&mut self, approver: &str, at: DateTime<Utc>) -> Result<()> {
        self.guard_pending()?;
        self.status = PaymentStatus::Confirmed;
        self.reviewed_by = Some(approver.to_string());
        self.reviewed_at = Some(at);
        Ok(())
    }

    /// `pending -> rejected`. No ledger effect beyond the status itself.
    pub fn reject(&mut self, approver: &str, reason: Option<String>, at: DateTime<Utc>) -> Result<()> {
        self.guard_pending()?;
        self.status = PaymentStatus::Rejected;
        self.reviewed_by = Some(approver.to_string());
        self.reviewed_at = Some(at);
        self.rejection_reason = reason;
        Ok(())
    }
}
