//! Pool of read-only connections.
//!
//! Every connection is opened read-only, gets the configured TEMP view
//! aliases, and only then switches to `query_only`.

use super::error::{Result, StorageError};
use super::schema::quote_ident;
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Maximum number of read connections.
const MAX_POOL_SIZE: usize = 8;

pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    /// Open `pool_size` connections (clamped to 1..=8) to the database file.
    pub fn open(path: &Path, pool_size: usize, views: &BTreeMap<String, String>) -> Result<Self> {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|source| StorageError::Open {
                path: path.display().to_string(),
                source,
            })?;
            create_view_aliases(&conn, views)?;
            apply_read_pragmas(&conn)?;
            connections.push(Mutex::new(conn));
        }
        debug!("Opened {} read connections to {}", size, path.display());
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    /// Execute a closure with a read connection from the pool (round-robin).
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> T,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let guard = self.connections[idx]
            .lock()
            .map_err(|_| StorageError::Poisoned)?;
        Ok(f(&guard))
    }
}

fn apply_read_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA query_only = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

/// Create `alias -> source` TEMP views. An alias whose source table is
/// missing is skipped with a warning.
fn create_view_aliases(conn: &Connection, views: &BTreeMap<String, String>) -> Result<()> {
    for (alias, source) in views {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master
                           WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE)",
            [source],
            |row| row.get(0),
        )?;
        if !exists {
            warn!("View alias '{}' skipped: no table named '{}'", alias, source);
            continue;
        }
        conn.execute_batch(&format!(
            "CREATE TEMP VIEW IF NOT EXISTS {} AS SELECT * FROM {};",
            quote_ident(alias),
            quote_ident(source)
        ))?;
    }
    Ok(())
}
