use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "academy.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    // One JSON document per key, mirroring browser local storage. The default
    // rollback journal keeps the workspace a single file for backups.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    ensure_kv_updated_at(&conn)?;

    Ok(conn)
}

pub fn kv_get(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| {
        r.get(0)
    })
    .optional()
}

pub fn kv_set(conn: &Connection, key: &str, value: &str, updated_at: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO kv_store(key, value, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, value, updated_at),
    )?;
    Ok(())
}

pub fn kv_remove(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let n = conn.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
    Ok(n > 0)
}

pub fn kv_keys(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
    let keys = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}

// Workspaces created before the timestamp column existed.
fn ensure_kv_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "kv_store", "updated_at")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE kv_store ADD COLUMN updated_at TEXT NOT NULL DEFAULT ''",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_rows_always_carry_a_timestamp() {
        let dir = std::env::temp_dir().join(format!("academy-db-{}", std::process::id()));
        let conn = open_db(&dir).expect("open");
        kv_set(&conn, "users", "[]", "2024-01-01T00:00:00.000Z").expect("set");
        assert_eq!(kv_get(&conn, "users").expect("get").as_deref(), Some("[]"));

        let null_ts = conn.execute(
            "INSERT INTO kv_store(key, value, updated_at) VALUES('x', '[]', NULL)",
            [],
        );
        assert!(null_ts.is_err());
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .expect("journal mode");
        assert_eq!(mode, "delete");
        drop(conn);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
