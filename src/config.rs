use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Club-level settings.
///
/// Defaults mirror the values a fresh deployment is seeded with. A JSON file
/// with camelCase keys can override any subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub club_name: String,
    /// Annual loan interest rate, in percent.
    pub loan_interest_rate: f64,
    pub late_fee: f64,
    /// Day of the month contributions fall due.
    pub payment_due_day: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            club_name: "Masonko Stokvel".to_string(),
            loan_interest_rate: 10.0,
            late_fee: 50.0,
            payment_due_day: 1,
        }
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| crate::error::LedgerError::Validation(format!("invalid settings: {e}")))
    }
}
