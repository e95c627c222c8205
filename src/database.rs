use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::FieldOpsError;
use crate::schema;

static POOL: OnceCell<Pool<SqliteConnectionManager>> = OnceCell::new();

const POOL_SIZE: u32 = 8;

pub struct Database;

impl Database {
    /// Open (or create) the database at `db_path`, build the connection pool,
    /// and ensure the schema is current. Must be called once before any
    /// `get_connection` call.
    pub fn init(db_path: &Path) -> Result<(), FieldOpsError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .build(manager)
            .map_err(|e| FieldOpsError::Error(format!("Failed to create connection pool: {}", e)))?;

        {
            let conn = pool
                .get()
                .map_err(|e| FieldOpsError::Error(format!("Failed to open database: {}", e)))?;
            schema::ensure_schema(&conn)?;
        }

        POOL.set(pool)
            .map_err(|_| FieldOpsError::Error("Database already initialized".to_string()))?;

        log::info!("Database opened at {}", db_path.display());
        Ok(())
    }

    pub fn get_connection() -> Result<PooledConnection<SqliteConnectionManager>, FieldOpsError> {
        let pool = POOL
            .get()
            .ok_or_else(|| FieldOpsError::Error("Database not initialized".to_string()))?;

        pool.get()
            .map_err(|e| FieldOpsError::Error(format!("Failed to get database connection: {}", e)))
    }

    /// Run `func` inside a BEGIN IMMEDIATE transaction. Commits on Ok,
    /// rolls back on Err. Entity functions with an `_immediate` suffix
    /// expect to be called inside one of these.
    pub fn immediate_transaction<T, F>(conn: &Connection, func: F) -> Result<T, FieldOpsError>
    where
        F: FnOnce(&Connection) -> Result<T, FieldOpsError>,
    {
        conn.execute_batch("BEGIN IMMEDIATE")?;

        match func(conn) {
            Ok(value) => {
                conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                // Best effort: the original error is the one worth surfacing
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}
