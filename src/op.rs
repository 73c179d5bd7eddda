//! Mutation operation model and persistence wrappers.

use serde::{Deserialize, Serialize};

use crate::{
    entry::RaceEntry,
    rank::{LedgerKey, LedgerLine, StandingsSnapshot},
    results::{ChampionshipResult, RaceResult},
    types::{DriverId, OpSeq, TeamId, UserId},
};

/// Version number for serialized [`StoredOpEnvelope`] payloads.
pub const OP_FORMAT_VERSION: u16 = 1;

/// Immutable operation appended to the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Create or overwrite one member's entry for a race.
    UpsertEntry {
        /// Full replacement entry.
        entry: RaceEntry,
    },
    /// Save or overwrite a race's official result.
    SaveRaceResult {
        /// Full replacement result.
        result: RaceResult,
    },
    /// Save or overwrite the season championship result.
    SaveChampionshipResult {
        /// Full replacement result.
        result: ChampionshipResult,
    },
    /// Record a member's pre-season championship picks.
    SetChampionshipPicks {
        /// Member the picks belong to.
        user_id: UserId,
        /// Drivers' championship top-three picks.
        drivers: Option<[DriverId; 3]>,
        /// Constructors' championship top-three picks.
        teams: Option<[TeamId; 3]>,
    },
    /// One member's settlement: ledger line overwrite plus entry write-back.
    ///
    /// Replaying this op routes through the same reconcile path as the
    /// original settlement, so the applied delta is identical.
    SettleUser {
        /// Member being settled.
        user_id: UserId,
        /// Ledger slot the line lands in.
        key: LedgerKey,
        /// Newly computed line.
        line: LedgerLine,
        /// Whether this settlement consumed the member's late pass.
        late_used: bool,
    },
    /// Append an immutable standings snapshot.
    AppendStandings {
        /// Snapshot as captured.
        snapshot: StandingsSnapshot,
    },
}

/// Journal row metadata plus operation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOp {
    /// Monotonic operation sequence.
    pub seq: OpSeq,
    /// Operation timestamp in milliseconds.
    pub ts_ms: u64,
    /// Operation body.
    pub op: Op,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOpEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped operation.
    pub stored: StoredOp,
}

impl StoredOpEnvelope {
    /// Constructs an envelope using [`OP_FORMAT_VERSION`].
    pub fn new(stored: StoredOp) -> Self {
        Self {
            format_version: OP_FORMAT_VERSION,
            stored,
        }
    }
}
