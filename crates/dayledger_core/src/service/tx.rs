//! Immediate-transaction helper shared by mutating services.

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `f` inside a `BEGIN IMMEDIATE` transaction on `conn`.
///
/// Commits only when `f` succeeds; any error drops the transaction, which
/// rolls every write back. `conn` must not already be inside a transaction.
pub(crate) fn with_immediate_tx<T, E>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<rusqlite::Error>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = f(&*tx)?;
    tx.commit()?;
    Ok(value)
}
