use crate::domain::contribution::Contribution;
use crate::domain::loan::LoanId;
use crate::domain::member::MemberId;
use crate::domain::money::Amount;
use crate::domain::payment::PaymentId;
use chrono::{DateTime, NaiveDate, Utc};

/// One mutation inside an atomic ledger commit.
///
/// A store validates every op's guard and applies the whole batch under a
/// single exclusive section, or applies nothing. Ops that carry state guards
/// (`ConfirmPayment` on a terminal record, `RecordRepayment` on a closed
/// loan) fail the commit with `InvalidStateTransition`; the guard is
/// authoritative here, not in the application layer, so racing committers
/// cannot both pass it.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOp {
    /// `pending -> confirmed`, recording the approver.
    ConfirmPayment {
        id: PaymentId,
        approver: String,
        at: DateTime<Utc>,
    },
    /// `pending -> rejected`, with no ledger effect.
    RejectPayment {
        id: PaymentId,
        approver: String,
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    /// Appends an immutable contribution entry; the store assigns the id.
    AppendContribution(Contribution),
    /// `balance = balance + amount`, applied by the store itself so
    /// concurrent commits against one member never lose an update. Also
    /// refreshes the member's last-payment date and standing.
    CreditMember {
        id: MemberId,
        amount: Amount,
        paid_on: NaiveDate,
    },
    /// `pending -> approved`, scheduling the first repayment.
    ApproveLoan { id: LoanId, first_payment: NaiveDate },
    /// `pending -> rejected`.
    RejectLoan { id: LoanId },
    /// Decrements the outstanding balance; derives `repaid` at zero.
    RecordRepayment { id: LoanId, amount: f64 },
}
