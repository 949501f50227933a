use crate::domain::contribution::Contribution;
use crate::domain::member::{Member, MemberId};
use crate::domain::payment::{PaymentId, PaymentStatus, PaymentSubmission, PendingPayment};
use crate::domain::ports::{Caller, LedgerStore, LedgerStoreRef};
use crate::domain::transaction::LedgerOp;
use crate::error::{LedgerError, Result};
use chrono::Utc;
use tracing::{debug, info};

/// The payment confirmation workflow.
///
/// Submissions queue up as pending payments; an approver either confirms one
/// (payment, contribution and member balance move together in one store
/// commit) or rejects it (terminal, no ledger effect).
pub struct PaymentWorkflow {
    store: LedgerStoreRef,
}

impl PaymentWorkflow {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    async fn approved_member(&self, id: MemberId) -> Result<Member> {
        let member = self
            .store
            .member(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("member", id))?;
        if !member.approved {
            return Err(LedgerError::Forbidden("account pending approval".into()));
        }
        Ok(member)
    }

    /// Queues a payment claim for review. Never touches the member's balance
    /// or the contribution ledger. Duplicate submissions are allowed;
    /// approvers are expected to weed them out.
    pub async fn submit(
        &self,
        caller: &Caller,
        payer: Option<MemberId>,
        submission: PaymentSubmission,
    ) -> Result<PendingPayment> {
        let payer_id = payer.unwrap_or(caller.member_id);
        if payer_id != caller.member_id && !caller.role.reviews_payments() {
            return Err(LedgerError::Forbidden(
                "only treasurers may submit on another member's behalf".into(),
            ));
        }
        let member = self.approved_member(payer_id).await?;
        let payment =
            PendingPayment::new(member.id, member.name.clone(), submission, Utc::now())?;
        let payment = self.store.insert_payment(payment).await?;
        info!(
            payment = payment.id,
            member = payment.member_id,
            amount = %payment.amount,
            "payment submitted"
        );
        Ok(payment)
    }

    /// The review queue, oldest submission first. Treasurer/admin only.
    pub async fn pending(&self, caller: &Caller) -> Result<Vec<PendingPayment>> {
        if !caller.role.reviews_payments() {
            return Err(LedgerError::Forbidden(
                "payment review requires treasurer or admin".into(),
            ));
        }
        let mut queue = self
            .store
            .payments_with_status(PaymentStatus::Pending)
            .await?;
        queue.sort_by(|a, b| (a.submitted_at, a.id).cmp(&(b.submitted_at, b.id)));
        Ok(queue)
    }

    /// Confirms a pending payment: the payment turns terminal, a
    /// contribution entry is appended and the member is credited, all in one
    /// commit. A payment that already reached a terminal state fails with
    /// `InvalidStateTransition` and nothing moves.
    pub async fn approve(&self, caller: &Caller, id: PaymentId) -> Result<PendingPayment> {
        if !caller.role.reviews_payments() {
            return Err(LedgerError::Forbidden(
                "payment review requires treasurer or admin".into(),
            ));
        }
        let approver = self.approved_member(caller.member_id).await?;
        let payment = self
            .store
            .payment(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("payment", id))?;
        // Early exit on terminal records. The commit re-checks this under
        // the store's exclusive section, which is what makes racing
        // approvals safe.
        if payment.status.is_terminal() {
            return Err(LedgerError::InvalidStateTransition(format!(
                "payment {} is already {:?}",
                payment.id, payment.status
            )));
        }

        let now = Utc::now();
        self.store
            .commit(vec![
                LedgerOp::ConfirmPayment {
                    id: payment.id,
                    approver: approver.name.clone(),
                    at: now,
                },
                LedgerOp::AppendContribution(Contribution::from_payment(
                    &payment,
                    &approver.name,
                    now,
                )),
                LedgerOp::CreditMember {
                    id: payment.member_id,
                    amount: payment.amount,
                    paid_on: payment.date,
                },
            ])
            .await?;

        info!(
            payment = payment.id,
            member = payment.member_id,
            amount = %payment.amount,
            approver = %approver.name,
            "payment confirmed"
        );
        self.store
            .payment(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("payment", id))
    }

    /// Rejects a pending payment: terminal, no contribution, no balance
    /// effect.
    pub async fn reject(
        &self,
        caller: &Caller,
        id: PaymentId,
        reason: Option<String>,
    ) -> Result<PendingPayment> {
        if !caller.role.reviews_payments() {
            return Err(LedgerError::Forbidden(
                "payment review requires treasurer or admin".into(),
            ));
        }
        let approver = self.approved_member(caller.member_id).await?;
        let payment = self
            .store
            .payment(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("payment", id))?;
        if payment.status.is_terminal() {
            return Err(LedgerError::InvalidStateTransition(format!(
                "payment {} is already {:?}",
                payment.id, payment.status
            )));
        }

        self.store
            .commit(vec![LedgerOp::RejectPayment {
                id: payment.id,
                approver: approver.name.clone(),
                reason,
                at: Utc::now(),
            }])
            .await?;

        debug!(payment = payment.id, "payment rejected");
        self.store
            .payment(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("payment", id))
    }
}
