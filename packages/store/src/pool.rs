//! Round-robin pool of `DuckDB` connections.
//!
//! Report calls are independent and read-only, so the host may run several
//! at once as long as each holds its own connection for the duration of the
//! call.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use duckdb::Connection;

use crate::StoreError;

/// Simple round-robin pool of `DuckDB` connections.
///
/// `duckdb::Connection` is `Send` but not `Sync`, so each connection is
/// wrapped in a `Mutex`. The pool hands out connections round-robin via
/// an atomic counter, allowing concurrent reports on different connections.
pub struct DuckDbPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl DuckDbPool {
    /// Opens `size` read-only connections to the `DuckDB` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any connection fails to open.
    pub fn open_read_only(path: &Path, size: usize) -> Result<Self, StoreError> {
        let connections = (0..size.max(1))
            .map(|_| {
                let config = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
                Connection::open_with_flags(path, config)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Opened {} read-only connections to {}",
            connections.len(),
            path.display()
        );

        Ok(Self::from_connections(connections))
    }

    /// Builds a pool of `size` handles onto the same database as `conn`.
    ///
    /// Useful for in-memory databases, which cannot be reopened by path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a connection cannot be cloned.
    pub fn cloned_from(conn: &Connection, size: usize) -> Result<Self, StoreError> {
        let connections = (0..size.max(1))
            .map(|_| conn.try_clone())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_connections(connections))
    }

    fn from_connections(connections: Vec<Connection>) -> Self {
        Self {
            connections: connections.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Number of connections in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.connections.len()
    }

    /// Acquires the next connection from the pool (round-robin).
    ///
    /// Poisoned locks are recovered; report queries hold no transaction
    /// state across calls.
    pub fn acquire(&self) -> MutexGuard<'_, Connection> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_connections_round_robin() {
        let conn = crate::schema::open_in_memory().unwrap();
        let pool = DuckDbPool::cloned_from(&conn, 2).unwrap();
        assert_eq!(pool.size(), 2);

        let first = pool.acquire();
        // The second acquire lands on the other connection, so holding the
        // first guard does not deadlock.
        let second = pool.acquire();

        let a: i64 = first
            .query_row("SELECT COUNT(*) FROM status_segments", [], |row| row.get(0))
            .unwrap();
        let b: i64 = second
            .query_row("SELECT COUNT(*) FROM status_segments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_size_still_yields_one_connection() {
        let conn = crate::schema::open_in_memory().unwrap();
        let pool = DuckDbPool::cloned_from(&conn, 0).unwrap();
        assert_eq!(pool.size(), 1);
    }
}
