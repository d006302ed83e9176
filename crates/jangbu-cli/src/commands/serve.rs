//! Web server command

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    let db = open_db(db_path)?;

    println!("📒 Jangbu server");
    println!("   Database: {}", db.path());
    println!("   Listening on http://{}:{}", host, port);

    jangbu_server::serve(db, host, port).await
}
