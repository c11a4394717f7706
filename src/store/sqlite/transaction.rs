//! Write transactions over the store connection.

use crate::store::StoreResult;
use rusqlite::{Connection, Params};
use tracing::warn;

/// An `IMMEDIATE` write transaction.
///
/// The write lock is taken at `begin`, so a second writer waits out the busy
/// timeout there rather than failing on lock upgrade mid-transaction.
/// Dropping without [`Transaction::commit`] rolls back.
pub struct Transaction<'a> {
    conn: &'a Connection,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(conn: &'a Connection) -> StoreResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            committed: false,
        })
    }

    /// Connection for queries that run inside the transaction.
    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    /// Runs one statement inside the transaction, returning affected rows.
    pub fn execute(&self, sql: &str, params: impl Params) -> StoreResult<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    pub fn commit(mut self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %err, "rollback failed");
        }
    }
}
