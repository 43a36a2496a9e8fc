use std::collections::HashSet;

use rusqlite::Connection;
use tracing::info;

const CREATE_LINKS: &str = "CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// Counter columns added on top of the base table. Older databases were
/// created without them.
const COUNTER_COLUMNS: [(&str, &str); 2] = [
    ("views", "ALTER TABLE links ADD COLUMN views INTEGER NOT NULL DEFAULT 0"),
    ("clicks", "ALTER TABLE links ADD COLUMN clicks INTEGER NOT NULL DEFAULT 0"),
];

/// Brings the `links` table up to date. Safe to run on every start.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(CREATE_LINKS, [])?;

    let columns = table_columns(conn)?;
    for (name, ddl) in COUNTER_COLUMNS {
        if !columns.contains(name) {
            info!("Adding missing column links.{}", name);
            conn.execute(ddl, [])?;
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(links)")?;
    let names = stmt.query_map([], |row| row.get::<_, String>("name"))?;
    names.collect()
}
