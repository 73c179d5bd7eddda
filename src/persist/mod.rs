/// SQLite-backed sink implementation.
pub mod sqlite;

use crate::{core::store::PoolSnapshotV1, op::StoredOp, types::OpSeq};

/// Persistence-layer failure.
#[derive(Debug)]
pub enum PersistError {
    /// SQLite reported an error.
    Sqlite(rusqlite::Error),
    /// A payload failed to (de)serialize.
    Serde(serde_json::Error),
    /// Any other failure, described in text.
    Message(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

impl From<crate::core::store::StoreError> for PersistError {
    fn from(value: crate::core::store::StoreError) -> Self {
        Self::Message(format!("store error: {value:?}"))
    }
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Durable sink for the mutation-op journal.
pub trait OpSink: Send {
    /// Appends ops and returns the highest durable sequence.
    fn append_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq>;
    /// Forces buffered writes to durable storage.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
    /// Writes a store checkpoint covering everything up to `last_seq`.
    fn write_snapshot(&mut self, _snapshot: &PoolSnapshotV1, _last_seq: OpSeq) -> PersistResult<()> {
        Ok(())
    }
    /// Drops journal rows at or below `seq`, returning how many went.
    fn compact_through(&mut self, _seq: OpSeq) -> PersistResult<usize> {
        Ok(0)
    }
}
