//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use jangbu_core::db::Database;

mod import;
mod serve;
mod status;

pub use import::cmd_import;
pub use serve::cmd_serve;
pub use status::cmd_status;

/// Open (or create) the ledger database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}
