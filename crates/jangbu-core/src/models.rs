//! Domain models for Jangbu

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How a transaction's category was assigned
///
/// The retroactive sweep only rewrites `Auto` categories; a `Manual`
/// assignment sticks until the user changes it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// Assigned by the keyword classifier (import or sweep)
    #[default]
    Auto,
    /// Assigned by the user through the API
    Manual,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl std::str::FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Unknown category source: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Card payment type (statement sheet the row came from)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentType {
    /// 일시불 - paid in full
    #[default]
    #[serde(rename = "일시불")]
    LumpSum,
    /// 할부 - installment plan
    #[serde(rename = "할부")]
    Installment,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LumpSum => "일시불",
            Self::Installment => "할부",
        }
    }
}

impl std::str::FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "일시불" | "lump_sum" => Ok(Self::LumpSum),
            "할부" | "installment" => Ok(Self::Installment),
            _ => Err(format!("Unknown payment type: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// User-defined account bucket (e.g. "생활비", "저축")
    pub account_type: String,
    /// Statement-local date, never timezone-converted
    pub transaction_date: NaiveDate,
    /// Counterparty / merchant text from the statement
    pub description: String,
    /// Statement label (입금, 출금, ...). Informational only: the sign of
    /// `amount` decides income vs expense in aggregation.
    pub transaction_type: String,
    pub institution: Option<String>,
    pub account_number: Option<String>,
    /// Positive = inflow, negative = outflow
    pub amount: f64,
    /// Running balance as stated by the source, not recomputed
    pub balance: f64,
    /// None = uncategorized
    pub category: Option<String>,
    pub category_source: CategorySource,
    pub memo: Option<String>,
    /// YYYY-MM, derived from transaction_date at insert
    pub year_month: String,
    /// Equivalence-key hash for deduplication
    pub dedup_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A new bank transaction to be imported (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_type: String,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub transaction_type: String,
    pub institution: Option<String>,
    pub account_number: Option<String>,
    pub amount: f64,
    pub balance: f64,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub year_month: String,
    pub dedup_hash: String,
}

/// A card ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardTransaction {
    pub id: i64,
    /// The person this card statement belongs to
    pub card_holder: String,
    pub payment_type: PaymentType,
    pub transaction_date: NaiveDate,
    pub description: String,
    /// Expense-signed: card purchases are negative
    pub amount: f64,
    pub category: Option<String>,
    pub category_source: CategorySource,
    pub memo: Option<String>,
    pub year_month: String,
    pub dedup_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A new card transaction to be imported
#[derive(Debug, Clone)]
pub struct NewCardTransaction {
    pub card_holder: String,
    pub payment_type: PaymentType,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub year_month: String,
    pub dedup_hash: String,
}

/// A keyword → category classification rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub id: i64,
    /// Case-insensitive substring pattern. Not required to be unique;
    /// the classifier tie-breaks on keyword length, then id.
    pub keyword: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Monthly statistics for one account scope (derived, never stored)
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStatistics {
    pub year_month: String,
    pub start_balance: f64,
    pub end_balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub net_change: f64,
    pub transaction_count: i64,
}

/// Per-category expense breakdown for one month (derived)
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStatistics {
    pub category: String,
    pub total_amount: f64,
    pub transaction_count: i64,
    /// Share of the month's total expense, rounded to one decimal.
    /// All zero when the month has no expenses.
    pub percentage: f64,
}

/// Per-card-holder totals (derived)
#[derive(Debug, Clone, Serialize)]
pub struct CardHolderStatistics {
    pub card_holder: String,
    pub total_amount: f64,
    pub transaction_count: i64,
    pub percentage: f64,
}

/// Card spending per month per holder (derived)
#[derive(Debug, Clone, Serialize)]
pub struct CardMonthlyStatistics {
    pub year_month: String,
    pub card_holder: String,
    pub total_amount: f64,
    pub transaction_count: i64,
}

/// Card spending per category per holder (derived)
#[derive(Debug, Clone, Serialize)]
pub struct CardCategoryStatistics {
    pub category: String,
    pub card_holder: String,
    pub total_amount: f64,
    pub transaction_count: i64,
    pub percentage: f64,
}

/// Latest stated balance for one account bucket
#[derive(Debug, Clone, Serialize)]
pub struct AccountBalance {
    pub account_type: String,
    pub latest_balance: f64,
    pub last_transaction_date: NaiveDate,
}

/// Cross-account asset snapshot (derived)
#[derive(Debug, Clone, Serialize)]
pub struct TotalAssets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_month: Option<String>,
    pub total_assets: f64,
    pub account_count: i64,
    pub accounts: Vec<AccountBalance>,
}
