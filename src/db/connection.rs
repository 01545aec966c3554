use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use rusqlite::Connection;
use tracing::{error, info};

/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "contacts.sqlite";

/// Open (or create) the contacts database at `path` and make sure the schema is
/// in place. Any failure is reported as a connection failure so `main` can bail
/// out before the UI starts.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create data directory {}", parent.display()))
            .context("Database connection failed")?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))
        .context("Database connection failed")?;
    ensure_schema(&conn).context("Database connection failed")?;

    info!(path = %path.display(), "opened contacts database");
    Ok(conn)
}

/// In-memory variant of [`open_database`], handy for tests and throwaway runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the `contacts` table when it does not exist yet. Safe to call on
/// every start.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(40) NOT NULL,
            phone VARCHAR(10),
            email VARCHAR(40) NOT NULL
        )",
        [],
    )
    .map_err(|err| {
        error!(error = %err, "failed to create contacts table");
        err
    })
    .context("failed to create contacts table")?;

    Ok(())
}

/// Resolve the default database location inside the platform data directory.
pub fn default_database_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "rp-contacts")
        .ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}
