//! Derived statistics queries
//!
//! Everything here is computed from the ledger tables on demand; no
//! aggregate is ever stored. Expense totals are reported as positive
//! magnitudes even though outflows are stored negative.

use rusqlite::params;

use super::Database;
use crate::categories::UNCATEGORIZED;
use crate::error::Result;
use crate::models::{
    AccountBalance, CardCategoryStatistics, CardHolderStatistics, CardMonthlyStatistics,
    CategoryStatistics, MonthlyStatistics, TotalAssets,
};

/// Round a percentage to one decimal place
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

impl Database {
    /// Income, expense and balance movement for one month.
    ///
    /// Scoped to one account bucket when `account_type` is given, the
    /// whole ledger otherwise. `start_balance` is the stated balance of
    /// the last row before the month began (0 when there is none);
    /// `end_balance` is the last in-month row's balance, falling back
    /// to `start_balance` for a month with no rows.
    pub fn monthly_statistics(
        &self,
        year_month: &str,
        account_type: Option<&str>,
    ) -> Result<MonthlyStatistics> {
        let conn = self.conn()?;

        let account_clause = if account_type.is_some() {
            "AND account_type = ?2"
        } else {
            ""
        };

        let sql = format!(
            r#"
            SELECT COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END), 0),
                   COUNT(*)
            FROM transactions
            WHERE year_month = ?1 {}
            "#,
            account_clause
        );

        let (total_income, total_expense, transaction_count): (f64, f64, i64) =
            match account_type {
                Some(account) => conn.query_row(&sql, params![year_month, account], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?,
                None => conn.query_row(&sql, params![year_month], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?,
            };

        let start_balance = self
            .balance_before(&conn, account_type, year_month)?
            .unwrap_or(0.0);
        let end_balance = self
            .balance_at_end(&conn, account_type, year_month)?
            .unwrap_or(start_balance);

        Ok(MonthlyStatistics {
            year_month: year_month.to_string(),
            start_balance,
            end_balance,
            total_income,
            total_expense,
            net_change: total_income - total_expense,
            transaction_count,
        })
    }

    /// Stated balance of the last row strictly before a month
    fn balance_before(
        &self,
        conn: &super::DbConn,
        account_type: Option<&str>,
        year_month: &str,
    ) -> Result<Option<f64>> {
        let month_start = format!("{}-01", year_month);
        let result = match account_type {
            Some(account) => conn.query_row(
                "SELECT balance FROM transactions \
                 WHERE account_type = ? AND transaction_date < ? \
                 ORDER BY transaction_date DESC, id DESC LIMIT 1",
                params![account, month_start],
                |row| row.get(0),
            ),
            None => conn.query_row(
                "SELECT balance FROM transactions \
                 WHERE transaction_date < ? \
                 ORDER BY transaction_date DESC, id DESC LIMIT 1",
                params![month_start],
                |row| row.get(0),
            ),
        };
        match result {
            Ok(balance) => Ok(Some(balance)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stated balance of the last row within a month
    fn balance_at_end(
        &self,
        conn: &super::DbConn,
        account_type: Option<&str>,
        year_month: &str,
    ) -> Result<Option<f64>> {
        let result = match account_type {
            Some(account) => conn.query_row(
                "SELECT balance FROM transactions \
                 WHERE account_type = ? AND year_month = ? \
                 ORDER BY transaction_date DESC, id DESC LIMIT 1",
                params![account, year_month],
                |row| row.get(0),
            ),
            None => conn.query_row(
                "SELECT balance FROM transactions \
                 WHERE year_month = ? \
                 ORDER BY transaction_date DESC, id DESC LIMIT 1",
                params![year_month],
                |row| row.get(0),
            ),
        };
        match result {
            Ok(balance) => Ok(Some(balance)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Expense breakdown by category for one month.
    ///
    /// Only outflows count; uncategorized rows appear under the
    /// "미분류" bucket. Sorted by total spend, largest first.
    pub fn category_statistics(
        &self,
        year_month: &str,
        account_type: Option<&str>,
    ) -> Result<Vec<CategoryStatistics>> {
        let conn = self.conn()?;

        let account_clause = if account_type.is_some() {
            "AND account_type = ?3"
        } else {
            ""
        };
        let sql = format!(
            r#"
            SELECT COALESCE(category, ?1), SUM(-amount), COUNT(*)
            FROM transactions
            WHERE year_month = ?2 AND amount < 0 {}
            GROUP BY COALESCE(category, ?1)
            ORDER BY SUM(-amount) DESC
            "#,
            account_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<(String, f64, i64)> = match account_type {
            Some(account) => stmt
                .query_map(params![UNCATEGORIZED, year_month, account], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![UNCATEGORIZED, year_month], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        let total: f64 = rows.iter().map(|(_, amount, _)| amount).sum();

        Ok(rows
            .into_iter()
            .map(|(category, total_amount, transaction_count)| CategoryStatistics {
                category,
                total_amount,
                transaction_count,
                percentage: if total > 0.0 {
                    round1(total_amount / total * 100.0)
                } else {
                    0.0
                },
            })
            .collect())
    }

    /// Latest stated balance per account bucket, summed.
    ///
    /// With `year_month` the snapshot is taken as of that month's end:
    /// the latest row whose month sorts at or before the cutoff.
    pub fn total_assets(
        &self,
        year_month: Option<&str>,
        account_type: Option<&str>,
    ) -> Result<TotalAssets> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(month) = year_month {
            // YYYY-MM sorts lexically, so the cutoff is a string compare
            conditions.push("year_month <= ?");
            params.push(Box::new(month.to_string()));
        }
        if let Some(account) = account_type {
            conditions.push("account_type = ?");
            params.push(Box::new(account.to_string()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT account_type, balance, transaction_date FROM (
                SELECT account_type, balance, transaction_date,
                       ROW_NUMBER() OVER (
                           PARTITION BY account_type
                           ORDER BY transaction_date DESC, id DESC
                       ) AS rn
                FROM transactions
                {}
            ) WHERE rn = 1
            ORDER BY account_type
            "#,
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let accounts: Vec<AccountBalance> = stmt
            .query_map(params_refs.as_slice(), row_to_account_balance)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TotalAssets {
            year_month: year_month.map(|s| s.to_string()),
            total_assets: accounts.iter().map(|a| a.latest_balance).sum(),
            account_count: accounts.len() as i64,
            accounts,
        })
    }

    /// Card spend totals per holder, optionally scoped to one month
    pub fn card_statistics_by_holder(
        &self,
        year_month: Option<&str>,
    ) -> Result<Vec<CardHolderStatistics>> {
        let conn = self.conn()?;

        let month_clause = if year_month.is_some() {
            "AND year_month = ?1"
        } else {
            ""
        };
        let sql = format!(
            r#"
            SELECT card_holder, SUM(-amount), COUNT(*)
            FROM card_transactions
            WHERE amount < 0 {}
            GROUP BY card_holder
            ORDER BY SUM(-amount) DESC
            "#,
            month_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<(String, f64, i64)> = match year_month {
            Some(month) => stmt
                .query_map(params![month], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        let total: f64 = rows.iter().map(|(_, amount, _)| amount).sum();

        Ok(rows
            .into_iter()
            .map(|(card_holder, total_amount, transaction_count)| CardHolderStatistics {
                card_holder,
                total_amount,
                transaction_count,
                percentage: if total > 0.0 {
                    round1(total_amount / total * 100.0)
                } else {
                    0.0
                },
            })
            .collect())
    }

    /// Card spend per month per holder, newest month first
    pub fn card_statistics_monthly(
        &self,
        card_holder: Option<&str>,
    ) -> Result<Vec<CardMonthlyStatistics>> {
        let conn = self.conn()?;

        let holder_clause = if card_holder.is_some() {
            "AND card_holder = ?1"
        } else {
            ""
        };
        let sql = format!(
            r#"
            SELECT year_month, card_holder, SUM(-amount), COUNT(*)
            FROM card_transactions
            WHERE amount < 0 {}
            GROUP BY year_month, card_holder
            ORDER BY year_month DESC, card_holder
            "#,
            holder_clause
        );

        let row_to_stat = |row: &rusqlite::Row<'_>| -> rusqlite::Result<CardMonthlyStatistics> {
            Ok(CardMonthlyStatistics {
                year_month: row.get(0)?,
                card_holder: row.get(1)?,
                total_amount: row.get(2)?,
                transaction_count: row.get(3)?,
            })
        };

        let mut stmt = conn.prepare(&sql)?;
        let stats = match card_holder {
            Some(holder) => stmt
                .query_map(params![holder], row_to_stat)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], row_to_stat)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        Ok(stats)
    }

    /// Card spend per category per holder, optionally scoped to one month.
    ///
    /// Percentages are shares of the whole result set, so they sum to
    /// 100 across all (category, holder) pairs.
    pub fn card_statistics_by_category(
        &self,
        year_month: Option<&str>,
        card_holder: Option<&str>,
    ) -> Result<Vec<CardCategoryStatistics>> {
        let conn = self.conn()?;

        let mut conditions = String::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(UNCATEGORIZED)];
        if let Some(month) = year_month {
            params.push(Box::new(month.to_string()));
            conditions.push_str(&format!(" AND year_month = ?{}", params.len()));
        }
        if let Some(holder) = card_holder {
            params.push(Box::new(holder.to_string()));
            conditions.push_str(&format!(" AND card_holder = ?{}", params.len()));
        }

        let sql = format!(
            r#"
            SELECT COALESCE(category, ?1), card_holder, SUM(-amount), COUNT(*)
            FROM card_transactions
            WHERE amount < 0{}
            GROUP BY COALESCE(category, ?1), card_holder
            ORDER BY SUM(-amount) DESC
            "#,
            conditions
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows: Vec<(String, String, f64, i64)> = stmt
            .query_map(params_refs.as_slice(), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let total: f64 = rows.iter().map(|(_, _, amount, _)| amount).sum();

        Ok(rows
            .into_iter()
            .map(
                |(category, card_holder, total_amount, transaction_count)| CardCategoryStatistics {
                    category,
                    card_holder,
                    total_amount,
                    transaction_count,
                    percentage: if total > 0.0 {
                        round1(total_amount / total * 100.0)
                    } else {
                        0.0
                    },
                },
            )
            .collect())
    }
}

fn row_to_account_balance(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountBalance> {
    use std::str::FromStr;
    let date_str: String = row.get(2)?;
    Ok(AccountBalance {
        account_type: row.get(0)?,
        latest_balance: row.get(1)?,
        last_transaction_date: chrono::NaiveDate::from_str(&date_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}
