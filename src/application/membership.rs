use crate::domain::member::{Member, MemberId, NewMember};
use crate::domain::ports::{Caller, LedgerStore, LedgerStoreRef};
use crate::error::{LedgerError, Result};
use chrono::Utc;
use tracing::info;

/// Member registration and approval. Plain record storage next to the
/// payment workflow; no money moves here.
pub struct MembershipService {
    store: LedgerStoreRef,
}

impl MembershipService {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// Open registration: creates an unapproved member awaiting review.
    pub async fn register(&self, new: NewMember) -> Result<Member> {
        if self.store.member_by_contact(&new.email).await?.is_some()
            || self.store.member_by_contact(&new.phone).await?.is_some()
        {
            return Err(LedgerError::Validation("member already exists".into()));
        }
        let member = Member::register(new, Utc::now().date_naive())?;
        let member = self.store.insert_member(member).await?;
        info!(member = member.id, name = %member.name, "registration received");
        Ok(member)
    }

    pub async fn approve_member(&self, caller: &Caller, id: MemberId) -> Result<Member> {
        if !caller.role.reviews_members() {
            return Err(LedgerError::Forbidden(
                "member approval requires treasurer or admin".into(),
            ));
        }
        let mut member = self
            .store
            .member(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("member", id))?;
        member.approve();
        self.store.update_member(member.clone()).await?;
        info!(member = member.id, "member approved");
        Ok(member)
    }

    /// The approved roster, visible to any authenticated caller.
    pub async fn members(&self, _caller: &Caller) -> Result<Vec<Member>> {
        let mut members = self.store.members().await?;
        members.retain(|m| m.approved);
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    pub async fn pending_members(&self, caller: &Caller) -> Result<Vec<Member>> {
        if !caller.role.reviews_members() {
            return Err(LedgerError::Forbidden(
                "member approval requires treasurer or admin".into(),
            ));
        }
        let mut members = self.store.members().await?;
        members.retain(|m| !m.approved);
        members.sort_by_key(|m| m.id);
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{MemberStatus, Role};
    use crate::infrastructure::in_memory::InMemoryLedger;
    use std::sync::Arc;

    fn registration(name: &str, email: &str, phone: &str) -> NewMember {
        NewMember {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            tier: 2,
            role: None,
        }
    }

    async fn fixture() -> (LedgerStoreRef, MembershipService, Caller) {
        let store: LedgerStoreRef = Arc::new(InMemoryLedger::new());
        let service = MembershipService::new(store.clone());
        let mut admin = Member::register(
            NewMember {
                name: "Admin User".to_string(),
                email: "admin@example.com".to_string(),
                phone: "0821234567".to_string(),
                tier: 3,
                role: Some(Role::Admin),
            },
            Utc::now().date_naive(),
        )
        .unwrap();
        admin.approve();
        let admin = store.insert_member(admin).await.unwrap();
        (
            store,
            service,
            Caller {
                member_id: admin.id,
                role: admin.role,
            },
        )
    }

    #[tokio::test]
    async fn test_register_and_approve() {
        let (_, service, admin) = fixture().await;
        let member = service
            .register(registration(
                "Nomsa Dlamini",
                "nomsa@example.com",
                "0829998888",
            ))
            .await
            .unwrap();
        assert!(!member.approved);
        assert_eq!(member.status, MemberStatus::Pending);
        assert_eq!(member.shares, 2);

        let pending = service.pending_members(&admin).await.unwrap();
        assert_eq!(pending.len(), 1);

        let approved = service.approve_member(&admin, member.id).await.unwrap();
        assert!(approved.approved);
        assert_eq!(approved.status, MemberStatus::Current);
        assert!(service.pending_members(&admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_contact_rejected() {
        let (_, service, _) = fixture().await;
        service
            .register(registration(
                "Nomsa Dlamini",
                "nomsa@example.com",
                "0829998888",
            ))
            .await
            .unwrap();

        let same_email = service
            .register(registration("Imposter", "nomsa@example.com", "0820000000"))
            .await;
        assert!(matches!(same_email, Err(LedgerError::Validation(_))));

        let same_phone = service
            .register(registration("Imposter", "other@example.com", "0829998888"))
            .await;
        assert!(matches!(same_phone, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_roster_hides_unapproved() {
        let (_, service, admin) = fixture().await;
        service
            .register(registration(
                "Nomsa Dlamini",
                "nomsa@example.com",
                "0829998888",
            ))
            .await
            .unwrap();

        let roster = service.members(&admin).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Admin User");
    }

    #[tokio::test]
    async fn test_approval_gated() {
        let (_, service, _) = fixture().await;
        let member = service
            .register(registration(
                "Nomsa Dlamini",
                "nomsa@example.com",
                "0829998888",
            ))
            .await
            .unwrap();
        let caller = Caller {
            member_id: member.id,
            role: Role::Member,
        };
        assert!(matches!(
            service.approve_member(&caller, member.id).await,
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            service.pending_members(&caller).await,
            Err(LedgerError::Forbidden(_))
        ));
    }
}
