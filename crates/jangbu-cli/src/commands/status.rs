//! Ledger status command

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub fn cmd_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;

    let transactions = db.count_transactions()?;
    let card_transactions = db.count_card_transactions()?;
    let mappings = db.list_mappings()?;
    let months = db.list_year_months(None)?;
    let accounts = db.list_account_types()?;
    let holders = db.list_card_holders()?;

    println!("📒 Jangbu status");
    println!("   Database: {}", db.path());
    println!("   ─────────────────────────────");
    println!("   Bank transactions: {}", transactions);
    println!("   Card transactions: {}", card_transactions);
    println!("   Keyword mappings:  {}", mappings.len());

    if let (Some(first), Some(last)) = (months.last(), months.first()) {
        println!("   Months covered:    {} ({} to {})", months.len(), first, last);
    }
    if !accounts.is_empty() {
        println!("   Accounts:          {}", accounts.join(", "));
    }
    if !holders.is_empty() {
        println!("   Card holders:      {}", holders.join(", "));
    }

    Ok(())
}
