//! CSV import command

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use jangbu_core::models::PaymentType;
use jangbu_core::{parse_bank_csv, parse_card_csv, Classifier, InsertOutcome};

use super::open_db;

pub fn cmd_import(
    db_path: &Path,
    file: &Path,
    account_type: Option<&str>,
    card_holder: Option<&str>,
    payment_type: &str,
) -> Result<()> {
    let db = open_db(db_path)?;
    let reader = File::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let mappings = db.list_mappings()?;
    let classifier = Classifier::new(&mappings);

    println!("📥 Importing {}...", file.display());

    let (imported, duplicates, errors) = match (account_type, card_holder) {
        (Some(account), None) => {
            let parsed = parse_bank_csv(reader, account)?;
            let mut imported = 0;
            let mut duplicates = 0;
            for mut tx in parsed.rows {
                tx.category = classifier.classify(&tx.description).map(|c| c.to_string());
                match db.insert_transaction(&tx)? {
                    InsertOutcome::Inserted(_) => imported += 1,
                    InsertOutcome::Duplicate => duplicates += 1,
                }
            }
            (imported, duplicates, parsed.errors)
        }
        (None, Some(holder)) => {
            let payment_type = PaymentType::from_str(payment_type)
                .map_err(|e| anyhow::anyhow!(e))?;
            let parsed = parse_card_csv(reader, holder, payment_type)?;
            let mut imported = 0;
            let mut duplicates = 0;
            for mut tx in parsed.rows {
                tx.category = classifier.classify(&tx.description).map(|c| c.to_string());
                match db.insert_card_transaction(&tx)? {
                    InsertOutcome::Inserted(_) => imported += 1,
                    InsertOutcome::Duplicate => duplicates += 1,
                }
            }
            (imported, duplicates, parsed.errors)
        }
        _ => bail!("Specify either --account-type (bank) or --card-holder (card)"),
    };

    println!("   Imported:   {}", imported);
    println!("   Duplicates: {}", duplicates);
    if !errors.is_empty() {
        println!("   ⚠️  Skipped {} malformed row(s):", errors.len());
        for error in &errors {
            println!("      line {}: {}", error.line, error.reason);
        }
    }

    Ok(())
}
