use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::CrmError;

/// Key the prospect collection is stored under.
pub const PROSPECTS_KEY: &str = "crm-prospects";

pub fn read_blob(conn: &Connection, key: &str) -> Result<Option<String>, CrmError> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

pub fn write_blob(conn: &Connection, key: &str, value: &str) -> Result<(), CrmError> {
    conn.execute(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
        params![key, value, Utc::now().naive_utc()],
    )?;
    Ok(())
}
