use crate::config::Settings;
use crate::domain::loan::{Loan, LoanApplication, LoanId};
use crate::domain::ports::{Caller, LedgerStore, LedgerStoreRef};
use crate::domain::transaction::LedgerOp;
use crate::error::{LedgerError, Result};
use chrono::{Duration, Utc};
use tracing::info;

/// Loan issuance and repayment tracking.
///
/// Applications snapshot the configured interest rate; decisions and
/// repayments move through the same guarded store commits as the payment
/// workflow.
pub struct LoanEngine {
    store: LedgerStoreRef,
    /// Annual rate in percent, snapshotted onto each application.
    interest_rate: f64,
}

impl LoanEngine {
    pub fn new(store: LedgerStoreRef, settings: &Settings) -> Self {
        Self {
            store,
            interest_rate: settings.loan_interest_rate,
        }
    }

    fn require_loan_reviewer(&self, caller: &Caller) -> Result<()> {
        if !caller.role.reviews_loans() {
            return Err(LedgerError::Forbidden(
                "loan review requires admin or loan-officer".into(),
            ));
        }
        Ok(())
    }

    pub async fn apply(&self, caller: &Caller, application: LoanApplication) -> Result<Loan> {
        let member = self
            .store
            .member(caller.member_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("member", caller.member_id))?;
        if !member.approved {
            return Err(LedgerError::Forbidden("account pending approval".into()));
        }
        let now = Utc::now();
        let loan = Loan::apply(
            member.id,
            application,
            self.interest_rate,
            now.date_naive(),
            now,
        )?;
        let loan = self.store.insert_loan(loan).await?;
        info!(
            loan = loan.id,
            member = loan.member_id,
            amount = loan.amount,
            outstanding = loan.outstanding,
            "loan application received"
        );
        Ok(loan)
    }

    /// Admin and loan-officer see the whole book; everyone else only their
    /// own loans.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Loan>> {
        if caller.role.reviews_loans() {
            self.store.loans().await
        } else {
            self.store.loans_for_member(caller.member_id).await
        }
    }

    pub async fn approve(&self, caller: &Caller, id: LoanId) -> Result<Loan> {
        self.require_loan_reviewer(caller)?;
        let loan = self
            .store
            .loan(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("loan", id))?;
        // weekly cadence: first repayment one week after approval
        let first_payment = Utc::now().date_naive() + Duration::weeks(1);
        self.store
            .commit(vec![LedgerOp::ApproveLoan {
                id: loan.id,
                first_payment,
            }])
            .await?;
        info!(loan = loan.id, "loan approved");
        self.store
            .loan(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("loan", id))
    }

    pub async fn reject(&self, caller: &Caller, id: LoanId) -> Result<Loan> {
        self.require_loan_reviewer(caller)?;
        let loan = self
            .store
            .loan(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("loan", id))?;
        self.store
            .commit(vec![LedgerOp::RejectLoan { id: loan.id }])
            .await?;
        info!(loan = loan.id, "loan rejected");
        self.store
            .loan(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("loan", id))
    }

    pub async fn record_repayment(&self, caller: &Caller, id: LoanId, amount: f64) -> Result<Loan> {
        self.require_loan_reviewer(caller)?;
        let loan = self
            .store
            .loan(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("loan", id))?;
        self.store
            .commit(vec![LedgerOp::RecordRepayment {
                id: loan.id,
                amount,
            }])
            .await?;
        let loan = self
            .store
            .loan(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("loan", id))?;
        info!(
            loan = loan.id,
            amount,
            outstanding = loan.outstanding,
            status = ?loan.status,
            "repayment recorded"
        );
        Ok(loan)
    }
}
