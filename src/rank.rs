//! Ranking documents, the per-race point ledger, and standings snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DriverId, RaceId, SnapshotId, TeamId, UserId};

/// Ledger slot a settlement writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerKey {
    /// Per-race slot keyed by round.
    Race(RaceId),
    /// The single season-championship slot.
    Championship,
}

/// One settled line of the ledger: points plus wildcard tokens granted by
/// that settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Main-race points (championship total for the championship slot).
    pub main_pts: i32,
    /// Sprint points (always 0 for the championship slot).
    pub sprint_pts: i32,
    /// Wildcard tokens granted by this line's settlement.
    pub wildcards: u8,
}

impl LedgerLine {
    /// Point total contributed by this line.
    pub fn total(&self) -> i32 {
        self.main_pts + self.sprint_pts
    }
}

/// Movement produced by overwriting a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineDelta {
    /// Change applied to the running point total.
    pub points: i32,
    /// Change applied to the wildcard balance.
    pub wildcards: i32,
}

impl LineDelta {
    /// True when the overwrite moved nothing.
    pub fn is_noop(&self) -> bool {
        self.points == 0 && self.wildcards == 0
    }
}

/// Long-lived per-member ranking document.
///
/// `total_points` is the authoritative running score; the per-key lines are
/// the ledger that makes recomputation idempotent. At all times
/// `total_points == ledger_total()` and `wildcards` equals the sum of line
/// grants (the balance would additionally drop when tokens are spent, which
/// happens outside settlement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Member this document belongs to.
    pub user_id: UserId,
    /// Authoritative running point total.
    pub total_points: i32,
    /// Wildcard token balance.
    pub wildcards: i32,
    /// Settled line per race, keyed by round.
    pub points_by_race: BTreeMap<RaceId, LedgerLine>,
    /// Settled championship line, if the championship has been scored.
    pub championship: Option<LedgerLine>,
    /// Pre-season drivers' championship picks.
    pub championship_drivers: Option<[DriverId; 3]>,
    /// Pre-season constructors' championship picks.
    pub championship_teams: Option<[TeamId; 3]>,
    /// Set once the member's late-submission pass has been consumed.
    /// Monotonic: re-settling a race never clears it.
    pub late_pass_used: bool,
}

impl RankingEntry {
    /// Creates an empty ranking document for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            total_points: 0,
            wildcards: 0,
            points_by_race: BTreeMap::new(),
            championship: None,
            championship_drivers: None,
            championship_teams: None,
            late_pass_used: false,
        }
    }

    /// Overwrites the line at `key` with `line` and moves the running
    /// totals by the difference against the previously stored line.
    ///
    /// Replaying the same line is a no-op delta, which is what keeps
    /// repeated settlement of an unchanged result from double-counting.
    pub fn reconcile(&mut self, key: LedgerKey, line: LedgerLine) -> LineDelta {
        let prior = match key {
            LedgerKey::Race(race_id) => self.points_by_race.get(&race_id).copied(),
            LedgerKey::Championship => self.championship,
        }
        .unwrap_or_default();

        let delta = LineDelta {
            points: line.total() - prior.total(),
            wildcards: i32::from(line.wildcards) - i32::from(prior.wildcards),
        };

        match key {
            LedgerKey::Race(race_id) => {
                self.points_by_race.insert(race_id, line);
            }
            LedgerKey::Championship => self.championship = Some(line),
        }

        self.total_points += delta.points;
        self.wildcards += delta.wildcards;
        delta
    }

    /// Sum of all ledger lines, race and championship.
    ///
    /// Always equals [`total_points`](Self::total_points); exposed so the
    /// invariant is checkable from the outside.
    pub fn ledger_total(&self) -> i32 {
        let races: i32 = self.points_by_race.values().map(LedgerLine::total).sum();
        races + self.championship.map(|l| l.total()).unwrap_or(0)
    }
}

/// What triggered a standings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// Captured after settling the given race.
    Race(RaceId),
    /// Captured after settling the championship.
    Championship,
    /// Captured on explicit request.
    Manual,
}

/// One row of a captured standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    /// Member the row belongs to.
    pub user_id: UserId,
    /// 1-based table position.
    pub position: u32,
    /// Point total at capture time.
    pub points: i32,
    /// Wildcard balance at capture time.
    pub wildcards: i32,
}

/// Immutable ordered leaderboard captured after a settlement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsSnapshot {
    /// Monotonic snapshot identifier.
    pub id: SnapshotId,
    /// Capture trigger.
    pub kind: SnapshotKind,
    /// Capture timestamp in milliseconds since epoch.
    pub ts_ms: u64,
    /// Rows ordered by position.
    pub rows: Vec<StandingsRow>,
}

impl StandingsSnapshot {
    /// Position of `user_id` in this snapshot, if present.
    pub fn position_of(&self, user_id: UserId) -> Option<u32> {
        self.rows
            .iter()
            .find(|row| row.user_id == user_id)
            .map(|row| row.position)
    }
}

/// Orders ranking documents into standings rows.
///
/// Sorted by point total descending; the stable sort keeps ties in the
/// caller's arrival order.
pub fn standings_rows<'a, I>(entries: I) -> Vec<StandingsRow>
where
    I: IntoIterator<Item = &'a RankingEntry>,
{
    let mut ordered: Vec<&RankingEntry> = entries.into_iter().collect();
    ordered.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| StandingsRow {
            user_id: entry.user_id,
            position: idx as u32 + 1,
            points: entry.total_points,
            wildcards: entry.wildcards,
        })
        .collect()
}

/// Positions climbed since `prior` (positive = moved up).
///
/// A member absent from the prior snapshot, or a missing prior snapshot,
/// yields 0.
pub fn position_delta(
    user_id: UserId,
    current_position: u32,
    prior: Option<&StandingsSnapshot>,
) -> i64 {
    match prior.and_then(|snap| snap.position_of(user_id)) {
        Some(prior_position) => i64::from(prior_position) - i64::from(current_position),
        None => 0,
    }
}
