use crate::domain::contribution::Contribution;
use crate::domain::loan::{Loan, LoanId};
use crate::domain::member::{Member, MemberId};
use crate::domain::payment::{PaymentId, PaymentStatus, PendingPayment};
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::LedgerOp;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family per ledger table.
pub const CF_MEMBERS: &str = "members";
pub const CF_PAYMENTS: &str = "payments";
pub const CF_CONTRIBUTIONS: &str = "contributions";
pub const CF_LOANS: &str = "loans";
/// Id sequences live here, keyed by table name.
pub const CF_META: &str = "meta";

/// A persistent ledger backed by RocksDB.
///
/// Records are serde_json values keyed by big-endian id, one column family
/// per table. Mutations serialize through a commit mutex; the batch itself
/// is applied with a single `WriteBatch`, so a crash or a failed guard never
/// leaves a partial commit behind.
///
/// `Clone` shares the underlying `Arc<DB>` and the commit mutex.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| LedgerError::Internal(Box::new(e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::Internal(Box::new(e)))
}

impl RocksDbLedger {
    /// Opens or creates the database, ensuring all column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_MEMBERS, CF_PAYMENTS, CF_CONTRIBUTIONS, CF_LOANS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::Internal(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn get_record<T: DeserializeOwned>(&self, cf: &'static str, id: u64) -> Result<Option<T>> {
        let handle = self.cf(cf)?;
        match self.db.get_cf(handle, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn all_records<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<T>> {
        let handle = self.cf(cf)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(handle, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(decode(&value)?);
        }
        Ok(records)
    }

    /// Bumps the named id sequence. Callers hold the write guard.
    fn next_id(&self, table: &'static str) -> Result<u64> {
        let meta = self.cf(CF_META)?;
        let current = match self.db.get_cf(meta, table)? {
            Some(bytes) => u64::from_be_bytes(
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| LedgerError::TransactionFailed("corrupt id sequence".into()))?,
            ),
            None => 0,
        };
        let next = current + 1;
        self.db.put_cf(meta, table, next.to_be_bytes())?;
        Ok(next)
    }
}

/// Working state of an in-flight commit: records already loaded and mutated
/// by earlier ops in the batch, so later ops observe them.
#[derive(Default)]
struct Staging {
    members: HashMap<MemberId, Member>,
    payments: HashMap<PaymentId, PendingPayment>,
    loans: HashMap<LoanId, Loan>,
    contributions: Vec<Contribution>,
}

impl RocksDbLedger {
    fn staged_payment(&self, staging: &Staging, id: PaymentId) -> Result<PendingPayment> {
        if let Some(payment) = staging.payments.get(&id) {
            return Ok(payment.clone());
        }
        self.get_record(CF_PAYMENTS, id)?
            .ok_or_else(|| LedgerError::not_found("payment", id))
    }

    fn staged_member(&self, staging: &Staging, id: MemberId) -> Result<Member> {
        if let Some(member) = staging.members.get(&id) {
            return Ok(member.clone());
        }
        self.get_record(CF_MEMBERS, id)?
            .ok_or_else(|| LedgerError::not_found("member", id))
    }

    fn staged_loan(&self, staging: &Staging, id: LoanId) -> Result<Loan> {
        if let Some(loan) = staging.loans.get(&id) {
            return Ok(loan.clone());
        }
        self.get_record(CF_LOANS, id)?
            .ok_or_else(|| LedgerError::not_found("loan", id))
    }

    fn stage(&self, staging: &mut Staging, op: LedgerOp) -> Result<()> {
        match op {
            LedgerOp::ConfirmPayment { id, approver, at } => {
                let mut payment = self.staged_payment(staging, id)?;
                payment.confirm(&approver, at)?;
                staging.payments.insert(id, payment);
            }
            LedgerOp::RejectPayment {
                id,
                approver,
                reason,
                at,
            } => {
                let mut payment = self.staged_payment(staging, id)?;
                payment.reject(&approver, reason, at)?;
                staging.payments.insert(id, payment);
            }
            LedgerOp::AppendContribution(entry) => {
                staging.contributions.push(entry);
            }
            LedgerOp::CreditMember {
                id,
                amount,
                paid_on,
            } => {
                let mut member = self.staged_member(staging, id)?;
                member.credit(amount, paid_on);
                staging.members.insert(id, member);
            }
            LedgerOp::ApproveLoan { id, first_payment } => {
                let mut loan = self.staged_loan(staging, id)?;
                loan.approve(first_payment)?;
                staging.loans.insert(id, loan);
            }
            LedgerOp::RejectLoan { id } => {
                let mut loan = self.staged_loan(staging, id)?;
                loan.reject()?;
                staging.loans.insert(id, loan);
            }
            LedgerOp::RecordRepayment { id, amount } => {
                let mut loan = self.staged_loan(staging, id)?;
                loan.record_repayment(amount)?;
                staging.loans.insert(id, loan);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedger {
    async fn insert_member(&self, mut member: Member) -> Result<Member> {
        let _guard = self.write_guard.lock().await;
        member.id = self.next_id(CF_MEMBERS)?;
        let cf = self.cf(CF_MEMBERS)?;
        self.db
            .put_cf(cf, member.id.to_be_bytes(), encode(&member)?)?;
        Ok(member)
    }

    async fn member(&self, id: MemberId) -> Result<Option<Member>> {
        self.get_record(CF_MEMBERS, id)
    }

    async fn member_by_contact(&self, needle: &str) -> Result<Option<Member>> {
        let members: Vec<Member> = self.all_records(CF_MEMBERS)?;
        Ok(members
            .into_iter()
            .find(|m| m.email == needle || m.phone == needle))
    }

    async fn members(&self) -> Result<Vec<Member>> {
        self.all_records(CF_MEMBERS)
    }

    async fn update_member(&self, member: Member) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        if self.get_record::<Member>(CF_MEMBERS, member.id)?.is_none() {
            return Err(LedgerError::not_found("member", member.id));
        }
        let cf = self.cf(CF_MEMBERS)?;
        self.db
            .put_cf(cf, member.id.to_be_bytes(), encode(&member)?)?;
        Ok(())
    }

    async fn insert_payment(&self, mut payment: PendingPayment) -> Result<PendingPayment> {
        let _guard = self.write_guard.lock().await;
        payment.id = self.next_id(CF_PAYMENTS)?;
        let cf = self.cf(CF_PAYMENTS)?;
        self.db
            .put_cf(cf, payment.id.to_be_bytes(), encode(&payment)?)?;
        Ok(payment)
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>> {
        self.get_record(CF_PAYMENTS, id)
    }

    async fn payments_with_status(&self, status: PaymentStatus) -> Result<Vec<PendingPayment>> {
        let payments: Vec<PendingPayment> = self.all_records(CF_PAYMENTS)?;
        Ok(payments.into_iter().filter(|p| p.status == status).collect())
    }

    async fn contributions(&self) -> Result<Vec<Contribution>> {
        self.all_records(CF_CONTRIBUTIONS)
    }

    async fn contributions_for_member(&self, member: MemberId) -> Result<Vec<Contribution>> {
        let entries: Vec<Contribution> = self.all_records(CF_CONTRIBUTIONS)?;
        Ok(entries
            .into_iter()
            .filter(|c| c.member_id == member)
            .collect())
    }

    async fn insert_loan(&self, mut loan: Loan) -> Result<Loan> {
        let _guard = self.write_guard.lock().await;
        loan.id = self.next_id(CF_LOANS)?;
        let cf = self.cf(CF_LOANS)?;
        self.db.put_cf(cf, loan.id.to_be_bytes(), encode(&loan)?)?;
        Ok(loan)
    }

    async fn loan(&self, id: LoanId) -> Result<Option<Loan>> {
        self.get_record(CF_LOANS, id)
    }

    async fn loans(&self) -> Result<Vec<Loan>> {
        self.all_records(CF_LOANS)
    }

    async fn loans_for_member(&self, member: MemberId) -> Result<Vec<Loan>> {
        let loans: Vec<Loan> = self.all_records(CF_LOANS)?;
        Ok(loans.into_iter().filter(|l| l.member_id == member).collect())
    }

    async fn commit(&self, ops: Vec<LedgerOp>) -> Result<()> {
        let _guard = self.write_guard.lock().await;

        // Validate and stage every op before writing anything.
        let mut staging = Staging::default();
        for op in ops {
            self.stage(&mut staging, op)?;
        }

        let mut batch = WriteBatch::default();
        let cf_members = self.cf(CF_MEMBERS)?;
        for member in staging.members.values() {
            batch.put_cf(cf_members, member.id.to_be_bytes(), encode(member)?);
        }
        let cf_payments = self.cf(CF_PAYMENTS)?;
        for payment in staging.payments.values() {
            batch.put_cf(cf_payments, payment.id.to_be_bytes(), encode(payment)?);
        }
        let cf_loans = self.cf(CF_LOANS)?;
        for loan in staging.loans.values() {
            batch.put_cf(cf_loans, loan.id.to_be_bytes(), encode(loan)?);
        }
        let cf_contributions = self.cf(CF_CONTRIBUTIONS)?;
        for mut entry in staging.contributions {
            entry.id = self.next_id(CF_CONTRIBUTIONS)?;
            batch.put_cf(cf_contributions, entry.id.to_be_bytes(), encode(&entry)?);
        }

        self.db
            .write(batch)
            .map_err(|e| LedgerError::TransactionFailed(e.to_string()))
    }
}
