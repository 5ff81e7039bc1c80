pub mod queries;

use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;

/// SQLite-backed key-value entries.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    /// Unix seconds of the last write to `key`.
    pub fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(queries::SELECT_UPDATED_AT, params![key], |row| row.get(0))
            .optional()
            .context("Failed to query entry timestamp")
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(queries::SELECT_VALUE, params![key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read entry: {key}"))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                queries::UPSERT_VALUE,
                params![key, value, Utc::now().timestamp()],
            )
            .with_context(|| format!("Failed to write entry: {key}"))?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute(queries::DELETE_VALUE, params![key])
            .with_context(|| format!("Failed to remove entry: {key}"))?;

        Ok(())
    }
}
