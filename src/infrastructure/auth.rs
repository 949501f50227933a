use crate::domain::ports::{AccessGate, Caller, LedgerStore, LedgerStoreRef};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;

/// Resolves credential tokens against the member directory.
///
/// Token issuance happens outside this crate; here a token is simply the
/// directory key of the member it was issued to. Unknown or malformed tokens
/// are `Unauthorized`; members still awaiting approval cannot authenticate.
pub struct DirectoryGate {
    store: LedgerStoreRef,
}

impl DirectoryGate {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccessGate for DirectoryGate {
    async fn authenticate(&self, token: &str) -> Result<Caller> {
        let member_id: u64 = token.trim().parse().map_err(|_| LedgerError::Unauthorized)?;
        let member = self
            .store
            .member(member_id)
            .await?
            .ok_or(LedgerError::Unauthorized)?;
        if !member.approved {
            return Err(LedgerError::Forbidden("account pending approval".into()));
        }
        Ok(Caller {
            member_id: member.id,
            role: member.role,
        })
    }
}
