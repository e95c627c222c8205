use rusqlite::{Connection, OptionalExtension};

use crate::error::FieldOpsError;

pub const SCHEMA_VERSION: &str = "1";

/// Base schema. The `meta` table carries the schema version; everything else
/// is the console's entity surface. Dates are stored as ISO-8601 text
/// (YYYY-MM-DD), timestamps as Unix seconds (UTC).
pub const CREATE_SCHEMA_SQL: &str = r#"
CREATE TABLE meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
INSERT INTO meta (key, value) VALUES ('schema_version', '1');

CREATE TABLE properties (
    property_id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT NOT NULL UNIQUE,
    borough TEXT,
    unit_count INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE TABLE service_categories (
    category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    curbside_pickup INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

INSERT INTO service_categories (name, curbside_pickup, created_at) VALUES
    ('Residential porter', 1, strftime('%s', 'now', 'utc')),
    ('Commercial cleaning', 0, strftime('%s', 'now', 'utc')),
    ('Grounds keeping', 0, strftime('%s', 'now', 'utc'));

CREATE TABLE leads (
    lead_id INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_name TEXT NOT NULL,
    phone TEXT,
    email TEXT,
    property_id INTEGER REFERENCES properties(property_id),
    status INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE proposals (
    proposal_id INTEGER PRIMARY KEY AUTOINCREMENT,
    lead_id INTEGER REFERENCES leads(lead_id),
    property_id INTEGER NOT NULL REFERENCES properties(property_id),
    service_category_id INTEGER NOT NULL REFERENCES service_categories(category_id),
    title TEXT NOT NULL,
    status INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE contracts (
    contract_id INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id INTEGER NOT NULL REFERENCES properties(property_id),
    service_category_id INTEGER NOT NULL REFERENCES service_categories(category_id),
    title TEXT NOT NULL,
    status INTEGER NOT NULL DEFAULT 0,
    start_date TEXT NOT NULL,
    recurrence_type INTEGER NOT NULL DEFAULT 0,
    recurrence_interval INTEGER NOT NULL DEFAULT 1,
    recurrence_weekdays TEXT NOT NULL DEFAULT '[]',
    recurrence_end_date TEXT,
    recurrence_max_visits INTEGER,
    manual_task_weekdays TEXT NOT NULL DEFAULT '[]',
    tracked_collection_types TEXT NOT NULL DEFAULT '[]',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE jobs (
    job_id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id INTEGER REFERENCES contracts(contract_id),
    property_id INTEGER NOT NULL REFERENCES properties(property_id),
    title TEXT NOT NULL,
    status INTEGER NOT NULL DEFAULT 0,
    scheduled_date TEXT NOT NULL,
    is_recurring_parent INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE job_instances (
    instance_id INTEGER PRIMARY KEY AUTOINCREMENT,
    base_job_id INTEGER NOT NULL REFERENCES jobs(job_id),
    sequence_number INTEGER NOT NULL,
    scheduled_date TEXT NOT NULL,
    weekday_label TEXT NOT NULL,
    task_summary TEXT NOT NULL,
    is_recurring_instance INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    UNIQUE (base_job_id, sequence_number)
);

CREATE TABLE pickup_calendars (
    calendar_id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT NOT NULL,
    collection_type TEXT NOT NULL,
    pickup_weekdays TEXT NOT NULL,
    provenance TEXT NOT NULL DEFAULT 'real',
    created_at INTEGER NOT NULL,
    UNIQUE (address, collection_type)
);

CREATE INDEX idx_proposals_lead ON proposals(lead_id);
CREATE INDEX idx_contracts_property ON contracts(property_id);
CREATE INDEX idx_jobs_contract ON jobs(contract_id);
CREATE INDEX idx_job_instances_base ON job_instances(base_job_id);
CREATE INDEX idx_pickup_calendars_address ON pickup_calendars(address);
"#;

/// Create the schema if the database is empty, otherwise verify the stored
/// version matches what this binary expects.
pub fn ensure_schema(conn: &Connection) -> Result<(), FieldOpsError> {
    let table_exists: bool = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get::<_, i32>(0),
        )
        .map(|count| count > 0)
        .unwrap_or(false);

    if !table_exists {
        conn.execute_batch(CREATE_SCHEMA_SQL)?;
        return Ok(());
    }

    let stored_version: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match stored_version.as_deref() {
        Some(SCHEMA_VERSION) => Ok(()), // Schema is up to date
        Some(other) => Err(FieldOpsError::Error(format!(
            "Schema version mismatch: database has {}, expected {}",
            other, SCHEMA_VERSION
        ))),
        None => Err(FieldOpsError::Error("Schema version missing".to_string())),
    }
}
