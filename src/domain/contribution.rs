use crate::domain::member::MemberId;
use crate::domain::money::Amount;
use crate::domain::payment::{PaymentId, PendingPayment};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type ContributionId = u64;

/// An immutable ledger entry: one per confirmed payment, append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub member_id: MemberId,
    pub amount: Amount,
    pub method: String,
    pub reference: Option<String>,
    pub proof_path: Option<String>,
    pub date: NaiveDate,
    pub recorded_by: String,
    /// The pending payment this entry was derived from.
    pub payment_id: PaymentId,
    pub created_at: DateTime<Utc>,
}

impl Contribution {
    /// Copies the monetary facts out of a payment under review. The id is a
    /// placeholder until the store assigns one.
    pub fn from_payment(payment: &PendingPayment, approver: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            member_id: payment.member_id,
            amount: payment.amount,
            method: payment.method.clone(),
            reference: payment.reference.clone(),
            proof_path: payment.proof_path.clone(),
            date: payment.date,
            recorded_by: approver.to_string(),
            payment_id: payment.id,
            created_at: at,
        }
    }
}
