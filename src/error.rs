use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldOpsError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error), // Converts io::Error into FieldOpsError automatically

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError), // Converts rusqlite::Error automatically

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
