use crate::domain::member::{Member, MemberStatus};
use crate::domain::money::Balance;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct MemberRow<'a> {
    id: u64,
    name: &'a str,
    balance: Balance,
    status: MemberStatus,
    last_payment: Option<NaiveDate>,
}

impl<'a> From<&'a Member> for MemberRow<'a> {
    fn from(member: &'a Member) -> Self {
        Self {
            id: member.id,
            name: &member.name,
            balance: member.balance,
            status: member.status,
            last_payment: member.last_payment,
        }
    }
}

/// Writes the member report as CSV.
pub struct MemberWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> MemberWriter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(dest),
        }
    }

    pub fn write_members(&mut self, members: &[Member]) -> Result<()> {
        for member in members {
            self.writer.serialize(MemberRow::from(member))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::NewMember;
    use crate::domain::money::Amount;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_members() {
        let mut member = Member::register(
            NewMember {
                name: "Nomsa Dlamini".to_string(),
                email: "nomsa@example.com".to_string(),
                phone: "0829998888".to_string(),
                tier: 2,
                role: None,
            },
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
        .unwrap();
        member.id = 1;
        member.approve();
        member.credit(
            Amount::new(dec!(800)).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );

        let mut out = Vec::new();
        MemberWriter::new(&mut out)
            .write_members(std::slice::from_ref(&member))
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();

        assert!(rendered.starts_with("id,name,balance,status,last_payment"));
        assert!(rendered.contains("1,Nomsa Dlamini,800,current,2026-02-01"));
    }

    #[test]
    fn test_unpaid_member_has_empty_last_payment() {
        let mut member = Member::register(
            NewMember {
                name: "Sipho Khumalo".to_string(),
                email: "sipho@example.com".to_string(),
                phone: "0821110000".to_string(),
                tier: 1,
                role: None,
            },
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
        .unwrap();
        member.id = 2;
        member.approve();

        let mut out = Vec::new();
        MemberWriter::new(&mut out)
            .write_members(std::slice::from_ref(&member))
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("2,Sipho Khumalo,0,current,\n"));
    }
}
