//! Runtime event stream payloads.

use crate::types::{OpSeq, RaceId, SnapshotId, UserId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// A member's entry was created or overwritten.
    EntrySubmitted {
        /// Race the entry belongs to.
        race_id: RaceId,
        /// Member who submitted.
        user_id: UserId,
    },
    /// An official race result was saved.
    ResultSaved {
        /// Race the result belongs to.
        race_id: RaceId,
    },
    /// The official championship result was saved.
    ChampionshipResultSaved,
    /// A member's championship picks were recorded.
    PicksSet {
        /// Member the picks belong to.
        user_id: UserId,
    },
    /// A race settlement run finished.
    RaceSettled {
        /// Race that was settled.
        race_id: RaceId,
        /// Members settled successfully.
        updated: usize,
        /// Members whose settlement failed.
        failed: usize,
    },
    /// A championship settlement run finished.
    ChampionshipSettled {
        /// Members settled successfully.
        updated: usize,
        /// Members whose settlement failed.
        failed: usize,
    },
    /// A standings snapshot was captured.
    StandingsCaptured {
        /// Identifier of the new snapshot.
        snapshot_id: SnapshotId,
    },
    /// Persistence has reached at least this op sequence.
    DurableUpTo {
        /// Highest sequence known durable.
        op_seq: OpSeq,
    },
}
