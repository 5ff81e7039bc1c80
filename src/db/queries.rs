pub const CREATE_KV_ENTRIES: &str = r#"
CREATE TABLE IF NOT EXISTS kv_entries (
  key          TEXT PRIMARY KEY NOT NULL,
  value        TEXT NOT NULL,
  updated_at   INTEGER NOT NULL
);
"#;

pub const SELECT_VALUE: &str = "SELECT value FROM kv_entries WHERE key = ?1";

pub const UPSERT_VALUE: &str = "INSERT INTO kv_entries (key, value, updated_at)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(key)
     DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at";

pub const DELETE_VALUE: &str = "DELETE FROM kv_entries WHERE key = ?1";

pub const SELECT_UPDATED_AT: &str = "SELECT updated_at FROM kv_entries WHERE key = ?1";

pub fn schema_statements() -> Vec<&'static str> {
    vec![CREATE_KV_ENTRIES]
}
