//! Key/value stores for training nodes.
//!
//! The on-disk format is a single `nodes` table keyed by the node key,
//! with the record serialized as JSON in the body column. Nothing else
//! in the crate depends on that layout; any [`Store`] implementation
//! will do.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::doe::node::DoeNode;
use crate::error::Error;

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Error::Store(error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Store(error.to_string())
    }
}

/// Key/value persistence for training nodes.
pub trait Store<M> {
    /// Node stored under the given key, if any.
    fn read(&mut self, key: u64) -> Result<Option<DoeNode<M>>, Error>;

    /// Writes a node under its key, replacing any previous record.
    fn write(&mut self, node: &DoeNode<M>) -> Result<(), Error>;

    /// Every stored node, in no particular order.
    fn values(&mut self) -> Result<Vec<DoeNode<M>>, Error>;

    /// Flushes outstanding writes.
    fn close(&mut self) -> Result<(), Error>;
}

/// Store backed by a SQLite database.
pub struct SqliteStore<M> {
    connection: Connection,
    _moves: PhantomData<M>,
}

impl<M> SqliteStore<M> {
    /// Opens or creates a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Creates a store that lives only in memory.
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self, Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                key  INTEGER PRIMARY KEY,
                body TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { connection, _moves: PhantomData })
    }
}

impl<M: Serialize + DeserializeOwned> Store<M> for SqliteStore<M> {
    fn read(&mut self, key: u64) -> Result<Option<DoeNode<M>>, Error> {
        let body: Option<String> = self
            .connection
            .query_row("SELECT body FROM nodes WHERE key = ?1", params![key as i64], |row| {
                row.get(0)
            })
            .optional()?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn write(&mut self, node: &DoeNode<M>) -> Result<(), Error> {
        let body = serde_json::to_string(node)?;
        self.connection.execute(
            "INSERT OR REPLACE INTO nodes (key, body) VALUES (?1, ?2)",
            params![node.key as i64, body],
        )?;
        Ok(())
    }

    fn values(&mut self) -> Result<Vec<DoeNode<M>>, Error> {
        let mut statement = self.connection.prepare("SELECT body FROM nodes")?;
        let rows = statement.query_map([], |row| row.get::<_, String>(0))?;

        let mut nodes = Vec::new();
        for body in rows {
            nodes.push(serde_json::from_str(&body?)?);
        }
        Ok(nodes)
    }

    fn close(&mut self) -> Result<(), Error> {
        // Writes go straight to the database; the connection itself is
        // released when the store drops.
        Ok(())
    }
}

/// In-memory store used by tests and short-lived training runs.
pub struct MemoryStore<M> {
    nodes: HashMap<u64, DoeNode<M>>,
}

impl<M> MemoryStore<M> {
    pub fn new() -> Self {
        Self { nodes: HashMap::new() }
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<M> Default for MemoryStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone> Store<M> for MemoryStore<M> {
    fn read(&mut self, key: u64) -> Result<Option<DoeNode<M>>, Error> {
        Ok(self.nodes.get(&key).cloned())
    }

    fn write(&mut self, node: &DoeNode<M>) -> Result<(), Error> {
        self.nodes.insert(node.key, node.clone());
        Ok(())
    }

    fn values(&mut self) -> Result<Vec<DoeNode<M>>, Error> {
        Ok(self.nodes.values().cloned().collect())
    }

    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
