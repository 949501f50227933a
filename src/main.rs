use clap::Parser;
use masonko::application::loans::LoanEngine;
use masonko::application::payments::PaymentWorkflow;
use masonko::config::Settings;
use masonko::domain::loan::LoanApplication;
use masonko::domain::member::{Member, NewMember, Role};
use masonko::domain::money::Amount;
use masonko::domain::payment::PaymentSubmission;
use masonko::domain::ports::{AccessGate, LedgerStore, LedgerStoreRef};
use masonko::error::{LedgerError, Result as LedgerResult};
use masonko::infrastructure::auth::DirectoryGate;
use masonko::infrastructure::in_memory::InMemoryLedger;
use masonko::interfaces::csv::event_reader::{EventKind, EventReader, LedgerEvent};
use masonko::interfaces::csv::report_writer::MemberWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ledger event log CSV
    events: PathBuf,

    /// JSON roster used to seed the member directory
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Club settings JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    name: String,
    email: String,
    phone: String,
    tier: u8,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default = "default_approved")]
    approved: bool,
}

fn default_approved() -> bool {
    true
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(path: &Path) -> Result<LedgerStoreRef> {
    use masonko::infrastructure::rocksdb::RocksDbLedger;
    Ok(Arc::new(RocksDbLedger::open(path).into_diagnostic()?))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(_path: &Path) -> Result<LedgerStoreRef> {
    Err(miette::miette!(
        "this build has no persistent storage; rebuild with --features storage-rocksdb"
    ))
}

async fn seed_roster(store: &LedgerStoreRef, path: &Path) -> LedgerResult<()> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<RosterEntry> = serde_json::from_str(&raw)
        .map_err(|e| LedgerError::Validation(format!("invalid roster: {e}")))?;
    for entry in entries {
        // re-runs against a persistent ledger must not duplicate members
        if store.member_by_contact(&entry.email).await?.is_some() {
            continue;
        }
        let mut member = Member::register(
            NewMember {
                name: entry.name,
                email: entry.email,
                phone: entry.phone,
                tier: entry.tier,
                role: entry.role,
            },
            chrono::Utc::now().date_naive(),
        )?;
        if entry.approved {
            member.approve();
        }
        store.insert_member(member).await?;
    }
    Ok(())
}

fn missing(field: &str) -> LedgerError {
    LedgerError::Validation(format!("event is missing the {field} column"))
}

fn decimal_as_f64(amount: rust_decimal::Decimal) -> LedgerResult<f64> {
    amount
        .to_f64()
        .ok_or_else(|| LedgerError::Validation(format!("amount {amount} is out of range")))
}

async fn process_event(
    gate: &DirectoryGate,
    payments: &PaymentWorkflow,
    loans: &LoanEngine,
    event: LedgerEvent,
) -> LedgerResult<()> {
    let caller = gate.authenticate(&event.actor).await?;
    match event.event {
        EventKind::Submit => {
            let submission = PaymentSubmission {
                amount: Amount::new(event.amount.ok_or_else(|| missing("amount"))?)?,
                method: event.method.ok_or_else(|| missing("method"))?,
                reference: None,
                date: event.date.ok_or_else(|| missing("date"))?,
                notes: event.note,
                proof_path: None,
            };
            payments.submit(&caller, None, submission).await?;
        }
        EventKind::Approve => {
            let id = event.payment.ok_or_else(|| missing("payment"))?;
            payments.approve(&caller, id).await?;
        }
        EventKind::Reject => {
            let id = event.payment.ok_or_else(|| missing("payment"))?;
            payments.reject(&caller, id, event.note).await?;
        }
        EventKind::Loan => {
            let application = LoanApplication {
                amount: decimal_as_f64(event.amount.ok_or_else(|| missing("amount"))?)?,
                term_weeks: event.term.ok_or_else(|| missing("term"))?,
                details: event.note.map(|note| serde_json::json!({ "details": note })),
            };
            loans.apply(&caller, application).await?;
        }
        EventKind::ApproveLoan => {
            let id = event.loan.ok_or_else(|| missing("loan"))?;
            loans.approve(&caller, id).await?;
        }
        EventKind::RejectLoan => {
            let id = event.loan.ok_or_else(|| missing("loan"))?;
            loans.reject(&caller, id).await?;
        }
        EventKind::Repay => {
            let id = event.loan.ok_or_else(|| missing("loan"))?;
            let amount = decimal_as_f64(event.amount.ok_or_else(|| missing("amount"))?)?;
            loans.record_repayment(&caller, id, amount).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = match cli.config.as_ref() {
        Some(path) => Settings::from_file(path).into_diagnostic()?,
        None => Settings::default(),
    };

    let store: LedgerStoreRef = match cli.db_path.as_ref() {
        Some(path) => open_persistent(path)?,
        None => Arc::new(InMemoryLedger::new()),
    };

    if let Some(roster) = cli.roster.as_ref() {
        seed_roster(&store, roster).await.into_diagnostic()?;
    }

    let gate = DirectoryGate::new(store.clone());
    let payments = PaymentWorkflow::new(store.clone());
    let loans = LoanEngine::new(store.clone(), &settings);

    let file = File::open(&cli.events).into_diagnostic()?;
    for event in EventReader::new(file).events() {
        match event {
            Ok(event) => {
                if let Err(e) = process_event(&gate, &payments, &loans, event).await {
                    eprintln!("Error processing event: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading event: {e}");
            }
        }
    }

    let mut members = store.members().await.into_diagnostic()?;
    members.retain(|m| m.approved);
    members.sort_by_key(|m| m.id);

    let stdout = io::stdout();
    let mut writer = MemberWriter::new(stdout.lock());
    writer.write_members(&members).into_diagnostic()?;

    Ok(())
}
