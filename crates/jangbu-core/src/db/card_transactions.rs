//! Card transaction operations

use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;

use super::transactions::InsertOutcome;
use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CardTransaction, CategorySource, NewCardTransaction, PaymentType};

/// Optional filters for listing card transactions
#[derive(Debug, Clone, Default)]
pub struct CardTransactionFilter {
    pub card_holder: Option<String>,
    pub year_month: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Database {
    /// Insert a card transaction, skipping duplicates
    pub fn insert_card_transaction(&self, tx: &NewCardTransaction) -> Result<InsertOutcome> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            INSERT OR IGNORE INTO card_transactions
                (card_holder, payment_type, transaction_date, description, amount,
                 category, category_source, memo, year_month, dedup_hash)
            VALUES (?, ?, ?, ?, ?, ?, 'auto', ?, ?, ?)
            "#,
            params![
                tx.card_holder,
                tx.payment_type.as_str(),
                tx.transaction_date.to_string(),
                tx.description,
                tx.amount,
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

    /// List card transactions, newest first
    pub fn list_card_transactions(
        &self,
        filter: &CardTransactionFilter,
    ) -> Result<Vec<CardTransaction>> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(card_holder) = &filter.card_holder {
            conditions.push("card_holder = ?");
            params.push(Box::new(card_holder.clone()));
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
            SELECT id, card_holder, payment_type, transaction_date, description, amount,
                   category, category_source, memo, year_month, dedup_hash, created_at
            FROM card_transactions
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
            .query_map(params_refs.as_slice(), row_to_card_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Get a single card transaction by ID
    pub fn get_card_transaction(&self, id: i64) -> Result<CardTransaction> {
        let conn = self.conn()?;

        conn.query_row(
            r#"
            SELECT id, card_holder, payment_type, transaction_date, description, amount,
                   category, category_source, memo, year_month, dedup_hash, created_at
            FROM card_transactions WHERE id = ?
            "#,
            params![id],
            row_to_card_transaction,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Card transaction {} not found", id)))
    }

    /// Set a card transaction's category by hand (None clears it)
    pub fn update_card_transaction_category(
        &self,
        id: i64,
        category: Option<&str>,
    ) -> Result<CardTransaction> {
        if let Some(category) = category {
            crate::categories::validate(category)?;
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE card_transactions SET category = ?, category_source = 'manual' WHERE id = ?",
            params![category, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Card transaction {} not found", id)));
        }
        self.get_card_transaction(id)
    }

    /// Update a card transaction's memo
    pub fn update_card_transaction_memo(&self, id: i64, memo: Option<&str>) -> Result<CardTransaction> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE card_transactions SET memo = ? WHERE id = ?",
            params![memo, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Card transaction {} not found", id)));
        }
        self.get_card_transaction(id)
    }

    /// Delete a card transaction
    pub fn delete_card_transaction(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM card_transactions WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Card transaction {} not found", id)));
        }
        Ok(())
    }

    /// Distinct year-months with card activity, newest first
    pub fn list_card_year_months(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT year_month FROM card_transactions ORDER BY year_month DESC",
        )?;
        let months = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(months)
    }

    /// Distinct card holders seen in imports
    pub fn list_card_holders(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT card_holder FROM card_transactions ORDER BY card_holder")?;
        let holders = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(holders)
    }

    /// Total card row count (for status reporting)
    pub fn count_card_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count =
            conn.query_row("SELECT COUNT(*) FROM card_transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub(super) fn row_to_card_transaction(row: &Row<'_>) -> rusqlite::Result<CardTransaction> {
    let payment_str: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    let source_str: String = row.get(7)?;
    let created_str: String = row.get(11)?;

    Ok(CardTransaction {
        id: row.get(0)?,
        card_holder: row.get(1)?,
        payment_type: PaymentType::from_str(&payment_str).unwrap_or_default(),
        transaction_date: chrono::NaiveDate::from_str(&date_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        description: row.get(4)?,
        amount: row.get(5)?,
        category: row.get(6)?,
        category_source: CategorySource::from_str(&source_str).unwrap_or_default(),
        memo: row.get(8)?,
        year_month: row.get(9)?,
        dedup_hash: row.get(10)?,
        created_at: parse_datetime(&created_str),
    })
}
