//! Library-level properties of the payment workflow and loan engine.

use chrono::NaiveDate;
use masonko::application::loans::LoanEngine;
use masonko::application::payments::PaymentWorkflow;
use masonko::config::Settings;
use masonko::domain::loan::{LoanApplication, LoanStatus};
use masonko::domain::member::{Member, NewMember, Role};
use masonko::domain::money::{Amount, Balance};
use masonko::domain::payment::PaymentSubmission;
use masonko::domain::ports::{Caller, LedgerStore, LedgerStoreRef};
use masonko::error::LedgerError;
use masonko::infrastructure::in_memory::InMemoryLedger;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

async fn seed_member(store: &LedgerStoreRef, name: &str, phone: &str, role: Role) -> Caller {
    let mut member = Member::register(
        NewMember {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: phone.to_string(),
            tier: 2,
            role: Some(role),
        },
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    )
    .unwrap();
    member.approve();
    let member = store.insert_member(member).await.unwrap();
    Caller {
        member_id: member.id,
        role: member.role,
    }
}

fn submission(amount: Decimal) -> PaymentSubmission {
    PaymentSubmission {
        amount: Amount::new(amount).unwrap(),
        method: "eft".to_string(),
        reference: None,
        date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        notes: None,
        proof_path: None,
    }
}

#[tokio::test]
async fn concurrent_approvals_of_distinct_payments_lose_no_updates() {
    let store: LedgerStoreRef = Arc::new(InMemoryLedger::new());
    let member = seed_member(&store, "Nomsa Dlamini", "0820000001", Role::Member).await;
    let treasurer = seed_member(&store, "Treasurer User", "0820000002", Role::Treasurer).await;
    let workflow = Arc::new(PaymentWorkflow::new(store.clone()));

    let mut expected = Balance::ZERO;
    let mut payment_ids = Vec::new();
    let mut rng = rand::thread_rng();
    for _ in 0..16 {
        let amount = Decimal::from(rng.gen_range(1..=1000));
        expected += Balance::new(amount);
        let payment = workflow
            .submit(&member, None, submission(amount))
            .await
            .unwrap();
        payment_ids.push(payment.id);
    }

    let mut handles = Vec::new();
    for id in payment_ids {
        let workflow = workflow.clone();
        let treasurer = treasurer.clone();
        handles.push(tokio::spawn(async move {
            workflow.approve(&treasurer, id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = store.member(member.member_id).await.unwrap().unwrap();
    assert_eq!(stored.balance, expected);

    // and the contribution ledger agrees with the balance
    let total = store
        .contributions_for_member(member.member_id)
        .await
        .unwrap()
        .iter()
        .fold(Balance::ZERO, |acc, c| acc + c.amount.into());
    assert_eq!(total, expected);
}

#[tokio::test]
async fn racing_approvals_of_one_payment_apply_exactly_once() {
    let store: LedgerStoreRef = Arc::new(InMemoryLedger::new());
    let member = seed_member(&store, "Nomsa Dlamini", "0820000001", Role::Member).await;
    let treasurer = seed_member(&store, "Treasurer User", "0820000002", Role::Treasurer).await;
    let workflow = Arc::new(PaymentWorkflow::new(store.clone()));

    let payment = workflow
        .submit(&member, None, submission(dec!(800)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let workflow = workflow.clone();
        let treasurer = treasurer.clone();
        let id = payment.id;
        handles.push(tokio::spawn(
            async move { workflow.approve(&treasurer, id).await },
        ));
    }

    let mut confirmed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(LedgerError::InvalidStateTransition(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(confirmed, 1);

    let stored = store.member(member.member_id).await.unwrap().unwrap();
    assert_eq!(stored.balance, Balance::new(dec!(800)));
    assert_eq!(store.contributions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn loan_schedule_matches_published_fixtures() {
    let store: LedgerStoreRef = Arc::new(InMemoryLedger::new());
    let member = seed_member(&store, "Sipho Khumalo", "0820000004", Role::Member).await;
    let engine = LoanEngine::new(store.clone(), &Settings::default());

    let full_year = engine
        .apply(
            &member,
            LoanApplication {
                amount: 1000.0,
                term_weeks: 52,
                details: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(full_year.outstanding, 1100.0);

    let half_year = engine
        .apply(
            &member,
            LoanApplication {
                amount: 1000.0,
                term_weeks: 26,
                details: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(half_year.outstanding, 1050.0);
}

#[tokio::test]
async fn full_lifecycle_ends_repaid() {
    let store: LedgerStoreRef = Arc::new(InMemoryLedger::new());
    let member = seed_member(&store, "Sipho Khumalo", "0820000004", Role::Member).await;
    let officer = seed_member(&store, "Loan Officer", "0820000005", Role::LoanOfficer).await;
    let engine = LoanEngine::new(store.clone(), &Settings::default());

    let loan = engine
        .apply(
            &member,
            LoanApplication {
                amount: 1000.0,
                term_weeks: 26,
                details: None,
            },
        )
        .await
        .unwrap();
    engine.approve(&officer, loan.id).await.unwrap();
    engine
        .record_repayment(&officer, loan.id, 500.0)
        .await
        .unwrap();
    let settled = engine
        .record_repayment(&officer, loan.id, 550.0)
        .await
        .unwrap();
    assert_eq!(settled.status, LoanStatus::Repaid);
    assert_eq!(settled.outstanding, 0.0);

    // terminal: no further repayments
    let after = engine.record_repayment(&officer, loan.id, 1.0).await;
    assert!(matches!(
        after,
        Err(LedgerError::InvalidStateTransition(_))
    ));
}
