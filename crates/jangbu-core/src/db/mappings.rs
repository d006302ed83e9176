//! Keyword mapping operations and the retroactive sweep
//!
//! Writing a mapping re-runs the classifier over every transaction the
//! sweep may touch: rows that are uncategorized or whose category was
//! auto-assigned. Manually categorized rows are never rewritten, and a
//! sweep never strips an existing category back to NULL.

use rusqlite::{params, OptionalExtension, Transaction as SqlTransaction};
use tracing::info;

use super::{parse_datetime, Database};
use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::models::CategoryMapping;

impl Database {
    /// Create a mapping and retroactively classify existing rows.
    ///
    /// The mapping insert and the sweep commit atomically; a mapping is
    /// never visible without its retroactive effect.
    pub fn create_mapping(&self, keyword: &str, category: &str) -> Result<(CategoryMapping, i64)> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::Validation("Keyword cannot be empty".into()));
        }
        crate::categories::validate(category)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO category_mappings (keyword, category) VALUES (?, ?)",
            params![keyword, category],
        )?;
        let id = tx.last_insert_rowid();

        let updated = sweep(&tx)?;
        let mapping = get_mapping_tx(&tx, id)?;
        tx.commit()?;

        info!(keyword, category, updated, "Created category mapping");
        Ok((mapping, updated))
    }

    /// Update a mapping and re-run the sweep with the new rule set
    pub fn update_mapping(
        &self,
        id: i64,
        keyword: Option<&str>,
        category: Option<&str>,
    ) -> Result<(CategoryMapping, i64)> {
        if let Some(keyword) = keyword {
            if keyword.trim().is_empty() {
                return Err(Error::Validation("Keyword cannot be empty".into()));
            }
        }
        if let Some(category) = category {
            crate::categories::validate(category)?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let existing = get_mapping_tx(&tx, id)?;
        let new_keyword = keyword
            .map(|k| k.trim().to_string())
            .unwrap_or(existing.keyword);
        let new_category = category.map(|c| c.to_string()).unwrap_or(existing.category);

        tx.execute(
            "UPDATE category_mappings SET keyword = ?, category = ? WHERE id = ?",
            params![new_keyword, new_category, id],
        )?;

        let updated = sweep(&tx)?;
        let mapping = get_mapping_tx(&tx, id)?;
        tx.commit()?;

        Ok((mapping, updated))
    }

    /// Delete a mapping.
    ///
    /// Already-assigned categories are left in place: classification is
    /// a one-way projection, removing a rule does not un-categorize.
    pub fn delete_mapping(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM category_mappings WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Mapping {} not found", id)));
        }
        Ok(())
    }

    /// List all mappings, oldest first
    pub fn list_mappings(&self) -> Result<Vec<CategoryMapping>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, keyword, category, created_at FROM category_mappings ORDER BY id",
        )?;
        let mappings = stmt
            .query_map([], row_to_mapping)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(mappings)
    }

    /// Get a single mapping by ID
    pub fn get_mapping(&self, id: i64) -> Result<CategoryMapping> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, keyword, category, created_at FROM category_mappings WHERE id = ?",
            params![id],
            row_to_mapping,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Mapping {} not found", id)))
    }
}

fn row_to_mapping(row: &rusqlite::Row<'_>) -> rusqlite::Result<CategoryMapping> {
    let created_str: String = row.get(3)?;
    Ok(CategoryMapping {
        id: row.get(0)?,
        keyword: row.get(1)?,
        category: row.get(2)?,
        created_at: parse_datetime(&created_str),
    })
}

fn get_mapping_tx(tx: &SqlTransaction<'_>, id: i64) -> Result<CategoryMapping> {
    tx.query_row(
        "SELECT id, keyword, category, created_at FROM category_mappings WHERE id = ?",
        params![id],
        row_to_mapping,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Mapping {} not found", id)))
}

/// Re-classify sweepable rows against the current mapping table.
///
/// Returns the number of rows (bank + card) whose category changed.
fn sweep(tx: &SqlTransaction<'_>) -> Result<i64> {
    let mappings = {
        let mut stmt = tx.prepare(
            "SELECT id, keyword, category, created_at FROM category_mappings ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], row_to_mapping)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows
    };
    let classifier = Classifier::new(&mappings);
    if classifier.is_empty() {
        return Ok(0);
    }

    let mut updated = 0;
    for table in ["transactions", "card_transactions"] {
        let candidates: Vec<(i64, String, Option<String>)> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT id, description, category FROM {} \
                 WHERE category IS NULL OR category_source = 'auto'",
                table
            ))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let mut update = tx.prepare(&format!(
            "UPDATE {} SET category = ?, category_source = 'auto' WHERE id = ?",
            table
        ))?;
        for (id, description, current) in candidates {
            if let Some(category) = classifier.classify(&description) {
                if current.as_deref() != Some(category) {
                    update.execute(params![category, id])?;
                    updated += 1;
                }
            }
        }
    }

    Ok(updated)
}
