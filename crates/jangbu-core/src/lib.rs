//! Jangbu Core Library
//!
//! Shared functionality for the Jangbu household ledger:
//! - Database access and migrations
//! - CSV import parsers for bank and card statements
//! - Keyword-based category classification
//! - Derived monthly/category/card/asset statistics

pub mod categories;
pub mod classify;
pub mod db;
pub mod error;
pub mod import;
pub mod models;

pub use categories::{KNOWN_CATEGORIES, UNCATEGORIZED};
pub use classify::Classifier;
pub use db::{CardTransactionFilter, Database, InsertOutcome, TransactionFilter};
pub use error::{Error, Result};
pub use import::{
    bank_dedup_hash, card_dedup_hash, parse_bank_csv, parse_card_csv, ParsedImport, RowError,
};
pub use models::{
    AccountBalance, CardCategoryStatistics, CardHolderStatistics, CardMonthlyStatistics,
    CardTransaction, CategoryMapping, CategorySource, CategoryStatistics, MonthlyStatistics,
    NewCardTransaction, NewTransaction, PaymentType, TotalAssets, Transaction,
};
