use crate::domain::contribution::Contribution;
use crate::domain::loan::{Loan, LoanId};
use crate::domain::member::{Member, MemberId};
use crate::domain::payment::{PaymentId, PaymentStatus, PendingPayment};
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::LedgerOp;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default, Clone)]
struct Tables {
    members: HashMap<MemberId, Member>,
    payments: HashMap<PaymentId, PendingPayment>,
    contributions: HashMap<u64, Contribution>,
    loans: HashMap<LoanId, Loan>,
    next_member_id: u64,
    next_payment_id: u64,
    next_contribution_id: u64,
    next_loan_id: u64,
}

impl Tables {
    fn apply(&mut self, op: LedgerOp) -> Result<()> {
        match op {
            LedgerOp::ConfirmPayment { id, approver, at } => {
                let payment = self
                    .payments
                    .get_mut(&id)
                    .ok_or_else(|| LedgerError::not_found("payment", id))?;
                payment.confirm(&approver, at)
            }
            LedgerOp::RejectPayment {
                id,
                approver,
                reason,
                at,
            } => {
                let payment = self
                    .payments
                    .get_mut(&id)
                    .ok_or_else(|| LedgerError::not_found("payment", id))?;
                payment.reject(&approver, reason, at)
            }
            LedgerOp::AppendContribution(mut entry) => {
                self.next_contribution_id += 1;
                entry.id = self.next_contribution_id;
                self.contributions.insert(entry.id, entry);
                Ok(())
            }
            LedgerOp::CreditMember {
                id,
                amount,
                paid_on,
            } => {
                let member = self
                    .members
                    .get_mut(&id)
                    .ok_or_else(|| LedgerError::not_found("member", id))?;
                member.credit(amount, paid_on);
                Ok(())
            }
            LedgerOp::ApproveLoan { id, first_payment } => {
                let loan = self
                    .loans
                    .get_mut(&id)
                    .ok_or_else(|| LedgerError::not_found("loan", id))?;
                loan.approve(first_payment)
            }
            LedgerOp::RejectLoan { id } => {
                let loan = self
                    .loans
                    .get_mut(&id)
                    .ok_or_else(|| LedgerError::not_found("loan", id))?;
                loan.reject()
            }
            LedgerOp::RecordRepayment { id, amount } => {
                let loan = self
                    .loans
                    .get_mut(&id)
                    .ok_or_else(|| LedgerError::not_found("loan", id))?;
                loan.record_repayment(amount)
            }
        }
    }
}

/// A thread-safe in-memory ledger.
///
/// All four tables live behind one `RwLock`, so a commit holds the single
/// write guard while it validates and applies its ops: concurrent readers
/// never observe a half-applied batch. A failing op aborts the batch before
/// anything is published.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn insert_member(&self, mut member: Member) -> Result<Member> {
        let mut tables = self.tables.write().await;
        tables.next_member_id += 1;
        member.id = tables.next_member_id;
        tables.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn member(&self, id: MemberId) -> Result<Option<Member>> {
        let tables = self.tables.read().await;
        Ok(tables.members.get(&id).cloned())
    }

    async fn member_by_contact(&self, needle: &str) -> Result<Option<Member>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .find(|m| m.email == needle || m.phone == needle)
            .cloned())
    }

    async fn members(&self) -> Result<Vec<Member>> {
        let tables = self.tables.read().await;
        Ok(tables.members.values().cloned().collect())
    }

    async fn update_member(&self, member: Member) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.members.contains_key(&member.id) {
            return Err(LedgerError::not_found("member", member.id));
        }
        tables.members.insert(member.id, member);
        Ok(())
    }

    async fn insert_payment(&self, mut payment: PendingPayment) -> Result<PendingPayment> {
        let mut tables = self.tables.write().await;
        tables.next_payment_id += 1;
        payment.id = tables.next_payment_id;
        tables.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn payments_with_status(&self, status: PaymentStatus) -> Result<Vec<PendingPayment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    async fn contributions(&self) -> Result<Vec<Contribution>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<_> = tables.contributions.values().cloned().collect();
        entries.sort_by_key(|c| c.id);
        Ok(entries)
    }

    async fn contributions_for_member(&self, member: MemberId) -> Result<Vec<Contribution>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<_> = tables
            .contributions
            .values()
            .filter(|c| c.member_id == member)
            .cloned()
            .collect();
        entries.sort_by_key(|c| c.id);
        Ok(entries)
    }

    async fn insert_loan(&self, mut loan: Loan) -> Result<Loan> {
        let mut tables = self.tables.write().await;
        tables.next_loan_id += 1;
        loan.id = tables.next_loan_id;
        tables.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn loan(&self, id: LoanId) -> Result<Option<Loan>> {
        let tables = self.tables.read().await;
        Ok(tables.loans.get(&id).cloned())
    }

    async fn loans(&self) -> Result<Vec<Loan>> {
        let tables = self.tables.read().await;
        let mut loans: Vec<_> = tables.loans.values().cloned().collect();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn loans_for_member(&self, member: MemberId) -> Result<Vec<Loan>> {
        let tables = self.tables.read().await;
        let mut loans: Vec<_> = tables
            .loans
            .values()
            .filter(|l| l.member_id == member)
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn commit(&self, ops: Vec<LedgerOp>) -> Result<()> {
        let mut tables = self.tables.write().await;
        // Apply against a scratch copy; publish only if every op passed its
        // guard. Readers hold the same lock, so no intermediate state leaks.
        let mut next = tables.clone();
        for op in ops {
            next.apply(op)?;
        }
        *tables = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::NewMember;
    use crate::domain::money::{Amount, Balance};
    use crate::domain::payment::PaymentSubmission;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    async fn seed(store: &InMemoryLedger) -> (Member, PendingPayment) {
        let mut member = Member::register(
            NewMember {
                name: "Nomsa Dlamini".to_string(),
                email: "nomsa@example.com".to_string(),
                phone: "0829998888".to_string(),
                tier: 1,
                role: None,
            },
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
        .unwrap();
        member.approve();
        let member = store.insert_member(member).await.unwrap();

        let payment = PendingPayment::new(
            member.id,
            member.name.clone(),
            PaymentSubmission {
                amount: Amount::new(dec!(800)).unwrap(),
                method: "eft".to_string(),
                reference: None,
                date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                notes: None,
                proof_path: None,
            },
            Utc::now(),
        )
        .unwrap();
        let payment = store.insert_payment(payment).await.unwrap();
        (member, payment)
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryLedger::new();
        let (member, payment) = seed(&store).await;
        assert_eq!(member.id, 1);
        assert_eq!(payment.id, 1);

        let (_, second) = seed(&store).await;
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_member_by_contact() {
        let store = InMemoryLedger::new();
        let (member, _) = seed(&store).await;
        assert_eq!(
            store
                .member_by_contact("nomsa@example.com")
                .await
                .unwrap()
                .map(|m| m.id),
            Some(member.id)
        );
        assert_eq!(
            store
                .member_by_contact("0829998888")
                .await
                .unwrap()
                .map(|m| m.id),
            Some(member.id)
        );
        assert!(
            store
                .member_by_contact("nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_commit_applies_batch() {
        let store = InMemoryLedger::new();
        let (member, payment) = seed(&store).await;
        let now = Utc::now();

        store
            .commit(vec![
                LedgerOp::ConfirmPayment {
                    id: payment.id,
                    approver: "Treasurer User".to_string(),
                    at: now,
                },
                LedgerOp::AppendContribution(Contribution::from_payment(
                    &payment,
                    "Treasurer User",
                    now,
                )),
                LedgerOp::CreditMember {
                    id: member.id,
                    amount: payment.amount,
                    paid_on: payment.date,
                },
            ])
            .await
            .unwrap();

        let stored = store.member(member.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, Balance::new(dec!(800)));
        let entries = store.contributions().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 1);
    }

    #[tokio::test]
    async fn test_commit_rolls_back_wholesale() {
        let store = InMemoryLedger::new();
        let (member, payment) = seed(&store).await;
        let now = Utc::now();

        // second op targets a member that does not exist, so the confirm in
        // the first op must not stick either
        let result = store
            .commit(vec![
                LedgerOp::ConfirmPayment {
                    id: payment.id,
                    approver: "Treasurer User".to_string(),
                    at: now,
                },
                LedgerOp::CreditMember {
                    id: 999,
                    amount: payment.amount,
                    paid_on: payment.date,
                },
            ])
            .await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));

        let stored = store.payment(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
        let stored = store.member(member.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_commit_guard_refuses_second_confirm() {
        let store = InMemoryLedger::new();
        let (_, payment) = seed(&store).await;
        let now = Utc::now();

        store
            .commit(vec![LedgerOp::ConfirmPayment {
                id: payment.id,
                approver: "Treasurer User".to_string(),
                at: now,
            }])
            .await
            .unwrap();
        let second = store
            .commit(vec![LedgerOp::ConfirmPayment {
                id: payment.id,
                approver: "Treasurer User".to_string(),
                at: now,
            }])
            .await;
        assert!(matches!(
            second,
            Err(LedgerError::InvalidStateTransition(_))
        ));
    }
}
