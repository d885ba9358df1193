// src/db/mod.rs

//! SQLite-backed metadata store
//!
//! All index state lives in one SQLite database. `init` creates or migrates
//! the schema; `transaction` wraps a closure in a single commit so a rebuild
//! lands atomically and concurrent readers only ever see the pre- or
//! post-rebuild state.

pub mod models;
pub mod schema;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Open a connection to the metadata database
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Create the database file and bring the schema up to date
pub fn init(path: impl AsRef<Path>) -> Result<()> {
    let conn = open(path)?;
    schema::migrate(&conn)
}

/// Run a closure inside a transaction, committing on success
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&rusqlite::Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
