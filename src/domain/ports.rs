use crate::domain::contribution::Contribution;
use crate::domain::loan::{Loan, LoanId};
use crate::domain::member::{Member, MemberId, Role};
use crate::domain::payment::{PaymentId, PaymentStatus, PendingPayment};
use crate::domain::transaction::LedgerOp;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type AccessGateRef = Arc<dyn AccessGate>;

/// An authenticated caller, as resolved by the access gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub member_id: MemberId,
    pub role: Role,
}

/// Authenticates an opaque credential token.
///
/// Token issuance is someone else's problem; this port only resolves a token
/// to an identity and role, or refuses.
#[async_trait]
pub trait AccessGate: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Caller>;
}

/// Durable keyed storage for the four ledger tables.
///
/// Insert methods assign ids; the id on the passed record is ignored.
/// Single-record reads and inserts need no coordination, but every
/// multi-record mutation goes through [`LedgerStore::commit`], which applies
/// its ops under one exclusive section: all of them, or none.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // members
    async fn insert_member(&self, member: Member) -> Result<Member>;
    async fn member(&self, id: MemberId) -> Result<Option<Member>>;
    /// Looks a member up by email or phone, for registration uniqueness.
    async fn member_by_contact(&self, needle: &str) -> Result<Option<Member>>;
    async fn members(&self) -> Result<Vec<Member>>;
    /// Plain single-record upsert for membership administration. Balance
    /// mutation must go through `commit` instead.
    async fn update_member(&self, member: Member) -> Result<()>;

    // pending payments
    async fn insert_payment(&self, payment: PendingPayment) -> Result<PendingPayment>;
    async fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>>;
    async fn payments_with_status(&self, status: PaymentStatus) -> Result<Vec<PendingPayment>>;

    // contributions
    async fn contributions(&self) -> Result<Vec<Contribution>>;
    async fn contributions_for_member(&self, member: MemberId) -> Result<Vec<Contribution>>;

    // loans
    async fn insert_loan(&self, loan: Loan) -> Result<Loan>;
    async fn loan(&self, id: LoanId) -> Result<Option<Loan>>;
    async fn loans(&self) -> Result<Vec<Loan>>;
    async fn loans_for_member(&self, member: MemberId) -> Result<Vec<Loan>>;

    /// Atomic multi-write. Guards are re-validated inside the exclusive
    /// section; any failure rolls the whole batch back.
    async fn commit(&self, ops: Vec<LedgerOp>) -> Result<()>;
}
