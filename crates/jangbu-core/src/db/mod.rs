//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `transactions` - Bank transaction CRUD
//! - `card_transactions` - Card transaction CRUD
//! - `mappings` - Keyword mappings and the retroactive sweep
//! - `statistics` - Derived statistics queries

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod card_transactions;
mod mappings;
mod statistics;
mod transactions;

pub use card_transactions::CardTransactionFilter;
pub use transactions::{InsertOutcome, TransactionFilter};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool, running migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because pooled
    /// `:memory:` connections each get their own private database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/jangbu_test_{}_{}.db", std::process::id(), id);

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            -- Note: creates -wal and -shm sidecar files alongside the database
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            PRAGMA temp_store = MEMORY;

            -- Bank transactions
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                account_type TEXT NOT NULL,
                transaction_date DATE NOT NULL,
                description TEXT NOT NULL,
                transaction_type TEXT NOT NULL DEFAULT '',
                institution TEXT,
                account_number TEXT,
                amount REAL NOT NULL,
                balance REAL NOT NULL,
                category TEXT,
                category_source TEXT NOT NULL DEFAULT 'auto',  -- auto, manual
                memo TEXT,
                year_month TEXT NOT NULL,                      -- YYYY-MM
                dedup_hash TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_type);
            CREATE INDEX IF NOT EXISTS idx_transactions_year_month ON transactions(year_month);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category);

            -- Card transactions
            CREATE TABLE IF NOT EXISTS card_transactions (
                id INTEGER PRIMARY KEY,
                card_holder TEXT NOT NULL,
                payment_type TEXT NOT NULL,                    -- 일시불, 할부
                transaction_date DATE NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT,
                category_source TEXT NOT NULL DEFAULT 'auto',
                memo TEXT,
                year_month TEXT NOT NULL,
                dedup_hash TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_card_transactions_holder ON card_transactions(card_holder);
            CREATE INDEX IF NOT EXISTS idx_card_transactions_year_month ON card_transactions(year_month);
            CREATE INDEX IF NOT EXISTS idx_card_transactions_category ON card_transactions(category);

            -- Keyword to category mapping rules
            CREATE TABLE IF NOT EXISTS category_mappings (
                id INTEGER PRIMARY KEY,
                keyword TEXT NOT NULL,
                category TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_category_mappings_keyword ON category_mappings(keyword);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
