//! Bank transaction operations

use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CategorySource, NewTransaction, Transaction};

/// Result of inserting an imported row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row was inserted, contains the new row ID
    Inserted(i64),
    /// An identical row (same dedup hash) already exists
    Duplicate,
}

/// Optional filters for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_type: Option<String>,
    pub year_month: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Database {
    /// Insert a bank transaction, skipping duplicates.
    ///
    /// Dedup relies on the UNIQUE index on dedup_hash with INSERT OR
    /// IGNORE, so concurrent imports of the same file insert each row
    /// at most once.
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            INSERT OR IGNORE INTO transactions
                (account_type, transaction_date, description, transaction_type,
                 institution, account_number, amount, balance,
                 category, category_source, memo, year_month, dedup_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'auto', ?, ?, ?)
            "#,
            params![
                tx.account_type,
                tx.transaction_date.to_string(),
                tx.description,
                tx.transaction_type,
                tx.institution,
                tx.account_number,
                tx.amount,
                tx.balance,
                tx.category,
                tx.memo,
                tx.year_month,
                tx.dedup_hash,
            ],
        )?;

        if changed == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted(conn.last_insert_rowid()))
        }
    }

    /// List bank transactions, newest first
    pub fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(account_type) = &filter.account_type {
            conditions.push("account_type = ?");
            params.push(Box::new(account_type.clone()));
        }
        if let Some(year_month) = &filter.year_month {
            conditions.push("year_month = ?");
            params.push(Box::new(year_month.clone()));
        }
        if let Some(category) = &filter.category {
            if category == crate::categories::UNCATEGORIZED {
                conditions.push("category IS NULL");
            } else {
                conditions.push("category = ?");
                params.push(Box::new(category.clone()));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT id, account_type, transaction_date, description, transaction_type,
                   institution, account_number, amount, balance,
                   category, category_source, memo, year_month, dedup_hash, created_at
            FROM transactions
            {}
            ORDER BY transaction_date DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        params.push(Box::new(filter.limit.unwrap_or(500)));
        params.push(Box::new(filter.offset.unwrap_or(0)));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let transactions = stmt
            .query_map(params_refs.as_slice(), row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Get a single bank transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Transaction> {
        let conn = self.conn()?;

        conn.query_row(
            r#"
            SELECT id, account_type, transaction_date, description, transaction_type,
                   institution, account_number, amount, balance,
                   category, category_source, memo, year_month, dedup_hash, created_at
            FROM transactions WHERE id = ?
            "#,
            params![id],
            row_to_transaction,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", id)))
    }

    /// Set a transaction's category by hand.
    ///
    /// Marks the row manual so the sweep leaves it alone; None clears
    /// the category back to uncategorized.
    pub fn update_transaction_category(&self, id: i64, category: Option<&str>) -> Result<Transaction> {
        if let Some(category) = category {
            crate::categories::validate(category)?;
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE transactions SET category = ?, category_source = 'manual' WHERE id = ?",
            params![category, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Transaction {} not found", id)));
        }
        self.get_transaction(id)
    }

    /// Update a transaction's memo (None clears it)
    pub fn update_transaction_memo(&self, id: i64, memo: Option<&str>) -> Result<Transaction> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE transactions SET memo = ? WHERE id = ?",
            params![memo, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Transaction {} not found", id)));
        }
        self.get_transaction(id)
    }

    /// Delete a bank transaction
    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Transaction {} not found", id)));
        }
        Ok(())
    }

    /// Distinct year-months with bank activity, newest first
    pub fn list_year_months(&self, account_type: Option<&str>) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let months = match account_type {
            Some(account) => {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT year_month FROM transactions \
                     WHERE account_type = ? ORDER BY year_month DESC",
                )?;
                let months = stmt
                    .query_map(params![account], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                months
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT year_month FROM transactions ORDER BY year_month DESC",
                )?;
                let months = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                months
            }
        };
        Ok(months)
    }

    /// Distinct account buckets seen in imports
    pub fn list_account_types(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT account_type FROM transactions ORDER BY account_type")?;
        let accounts = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    /// Total row count (for status reporting)
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub(super) fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(2)?;
    let source_str: String = row.get(10)?;
    let created_str: String = row.get(14)?;

    Ok(Transaction {
        id: row.get(0)?,
        account_type: row.get(1)?,
        transaction_date: chrono::NaiveDate::from_str(&date_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        description: row.get(3)?,
        transaction_type: row.get(4)?,
        institution: row.get(5)?,
        account_number: row.get(6)?,
        amount: row.get(7)?,
        balance: row.get(8)?,
        category: row.get(9)?,
        category_source: CategorySource::from_str(&source_str).unwrap_or_default(),
        memo: row.get(11)?,
        year_month: row.get(12)?,
        dedup_hash: row.get(13)?,
        created_at: parse_datetime(&created_str),
    })
}
