use crate::domain::money::{Amount, Balance};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type MemberId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Member,
    Treasurer,
    Admin,
    LoanOfficer,
}

impl Role {
    /// Whether the role may review pending payments (list, approve, reject).
    pub fn reviews_payments(&self) -> bool {
        matches!(self, Role::Treasurer | Role::Admin)
    }

    /// Whether the role may decide loan applications and record repayments,
    /// and sees every loan when listing.
    pub fn reviews_loans(&self) -> bool {
        matches!(self, Role::Admin | Role::LoanOfficer)
    }

    /// Whether the role may approve member registrations.
    pub fn reviews_members(&self) -> bool {
        matches!(self, Role::Treasurer | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Current,
    Late,
}

/// Registration input, before the ledger assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Tier 1-3; determines the member's share count.
    pub tier: u8,
    /// Role defaults to `Member`; elevated roles are assigned when seeding
    /// the ledger, never through self-registration.
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub tier: u8,
    pub shares: u8,
    pub balance: Balance,
    pub joined: NaiveDate,
    pub last_payment: Option<NaiveDate>,
    pub status: MemberStatus,
    pub approved: bool,
}

impl Member {
    /// Builds an unapproved member from a registration. The id is a
    /// placeholder until the store assigns one.
    pub fn register(new: NewMember, joined: NaiveDate) -> Result<Self> {
        if !(1..=3).contains(&new.tier) {
            return Err(LedgerError::Validation(format!(
                "tier must be between 1 and 3, got {}",
                new.tier
            )));
        }
        if new.name.trim().is_empty() {
            return Err(LedgerError::Validation("name must not be empty".into()));
        }
        Ok(Self {
            id: 0,
            name: new.name,
            email: new.email,
            phone: new.phone,
            role: new.role.unwrap_or(Role::Member),
            tier: new.tier,
            // one share per tier level
            shares: new.tier,
            balance: Balance::ZERO,
            joined,
            last_payment: None,
            status: MemberStatus::Pending,
            approved: false,
        })
    }

    pub fn approve(&mut self) {
        self.approved = true;
        self.status = MemberStatus::Current;
    }

    /// Applies a confirmed contribution. Only ever called by a store inside
    /// its exclusive commit section.
    pub fn credit(&mut self, amount: Amount, paid_on: NaiveDate) {
        self.balance += amount.into();
        self.last_payment = Some(paid_on);
        self.status = MemberStatus::Current;
    }
}
