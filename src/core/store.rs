use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    core::indices::VecIndex,
    entry::RaceEntry,
    op::{Op, StoredOp},
    rank::{
        position_delta, standings_rows, LedgerKey, LedgerLine, LineDelta, RankingEntry,
        SnapshotKind, StandingsRow, StandingsSnapshot,
    },
    results::{ChampionshipResult, RaceResult},
    types::{DriverId, OpSeq, RaceId, SnapshotId, TeamId, UserId},
};

/// Store-level failure raised by a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No ranking document exists for the member.
    MissingRanking(UserId),
    /// No entry exists for the member at the race.
    MissingEntry(RaceId, UserId),
}

/// Serializable checkpoint of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshotV1 {
    /// Next journal sequence to hand out.
    pub next_op_seq: OpSeq,
    /// Next standings snapshot id to hand out.
    pub next_snapshot_id: SnapshotId,
    /// Ranking documents in arrival order.
    pub rankings: Vec<RankingEntry>,
    /// Entries grouped by race, arrival order within each race.
    pub entries: Vec<RaceEntry>,
    /// Official race results.
    pub race_results: Vec<RaceResult>,
    /// Official championship result, if saved.
    pub championship: Option<ChampionshipResult>,
    /// Append-only standings history.
    pub standings_log: Vec<StandingsSnapshot>,
}

/// Authoritative in-memory pool state: entries, results, rankings, and the
/// standings history, journaling every mutation.
#[derive(Debug, Default)]
pub struct PoolStore {
    entries: HashMap<(RaceId, UserId), RaceEntry>,
    entry_order: VecIndex<RaceId>,
    results: HashMap<RaceId, RaceResult>,
    championship: Option<ChampionshipResult>,
    rankings: HashMap<UserId, RankingEntry>,
    user_order: Vec<UserId>,
    standings_log: Vec<StandingsSnapshot>,
    pending_ops: Vec<StoredOp>,
    next_op_seq: OpSeq,
    next_snapshot_id: SnapshotId,
}

impl PoolStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            next_op_seq: 1,
            next_snapshot_id: 1,
            ..Self::default()
        }
    }

    /// Rebuilds a store from a checkpoint.
    pub fn from_snapshot(snapshot: PoolSnapshotV1) -> Result<Self, StoreError> {
        let mut store = Self {
            next_op_seq: snapshot.next_op_seq,
            next_snapshot_id: snapshot.next_snapshot_id,
            ..Self::default()
        };

        for ranking in snapshot.rankings {
            store.user_order.push(ranking.user_id);
            store.rankings.insert(ranking.user_id, ranking);
        }

        for entry in snapshot.entries {
            store
                .entry_order
                .entry(entry.race_id)
                .or_default()
                .push(entry.user_id);
            store.entries.insert((entry.race_id, entry.user_id), entry);
        }

        for result in snapshot.race_results {
            store.results.insert(result.race_id, result);
        }

        store.championship = snapshot.championship;
        store.standings_log = snapshot.standings_log;
        Ok(store)
    }

    /// Exports a checkpoint of the current state.
    pub fn export_snapshot(&self) -> PoolSnapshotV1 {
        let rankings = self
            .user_order
            .iter()
            .filter_map(|id| self.rankings.get(id).cloned())
            .collect();

        let mut race_ids: Vec<RaceId> = self.entry_order.keys().copied().collect();
        race_ids.sort_unstable();
        let entries = race_ids
            .iter()
            .flat_map(|race_id| {
                self.entry_order[race_id]
                    .iter()
                    .filter_map(|user_id| self.entries.get(&(*race_id, *user_id)).cloned())
            })
            .collect();

        let mut result_ids: Vec<RaceId> = self.results.keys().copied().collect();
        result_ids.sort_unstable();
        let race_results = result_ids
            .iter()
            .filter_map(|id| self.results.get(id).cloned())
            .collect();

        PoolSnapshotV1 {
            next_op_seq: self.next_op_seq,
            next_snapshot_id: self.next_snapshot_id,
            rankings,
            entries,
            race_results,
            championship: self.championship.clone(),
            standings_log: self.standings_log.clone(),
        }
    }

    /// Creates or overwrites one member's entry for a race.
    ///
    /// A first submission also creates the member's ranking document, which
    /// fixes their arrival order for standings tie-breaks.
    pub fn upsert_entry(&mut self, entry: RaceEntry) -> StoredOp {
        let seq = self.take_next_op_seq();
        let stored = self.apply_upsert_entry_with_seq(entry, seq);
        self.pending_ops.push(stored.clone());
        stored
    }

    /// Saves or overwrites a race's official result.
    pub fn save_race_result(&mut self, result: RaceResult) -> StoredOp {
        let seq = self.take_next_op_seq();
        let stored = self.apply_save_result_with_seq(result, seq);
        self.pending_ops.push(stored.clone());
        stored
    }

    /// Saves or overwrites the championship result.
    pub fn save_championship_result(&mut self, result: ChampionshipResult) -> StoredOp {
        let seq = self.take_next_op_seq();
        let stored = self.apply_save_championship_with_seq(result, seq);
        self.pending_ops.push(stored.clone());
        stored
    }

    /// Records a member's pre-season championship picks, creating the
    /// ranking document when needed.
    pub fn set_championship_picks(
        &mut self,
        user_id: UserId,
        drivers: Option<[DriverId; 3]>,
        teams: Option<[TeamId; 3]>,
    ) -> StoredOp {
        let seq = self.take_next_op_seq();
        let stored = self.apply_set_picks_with_seq(user_id, drivers, teams, seq);
        self.pending_ops.push(stored.clone());
        stored
    }

    /// Applies one member's settlement as a single transactional mutation:
    /// entry write-back, ledger reconcile, wildcard grant, late-pass flag.
    pub fn apply_settlement(
        &mut self,
        user_id: UserId,
        key: LedgerKey,
        line: LedgerLine,
        late_used: bool,
    ) -> Result<(LineDelta, StoredOp), StoreError> {
        let seq = self.take_next_op_seq();
        let out = self.apply_settle_with_seq(user_id, key, line, late_used, seq)?;
        self.pending_ops.push(out.1.clone());
        Ok(out)
    }

    /// Captures the current standings as an immutable snapshot.
    pub fn capture_standings(&mut self, kind: SnapshotKind) -> (SnapshotId, StoredOp) {
        let id = self.next_snapshot_id;
        let snapshot = StandingsSnapshot {
            id,
            kind,
            ts_ms: now_ms(),
            rows: self.current_standings(),
        };
        let seq = self.take_next_op_seq();
        let stored = self.apply_append_standings_with_seq(snapshot, seq);
        self.pending_ops.push(stored.clone());
        (id, stored)
    }

    /// Applies a journaled op during replay, keeping its original sequence.
    pub fn apply_replayed_op(&mut self, stored: StoredOp) -> Result<(), StoreError> {
        let seq = stored.seq;
        match stored.op {
            Op::UpsertEntry { entry } => {
                self.apply_upsert_entry_with_seq(entry, seq);
            }
            Op::SaveRaceResult { result } => {
                self.apply_save_result_with_seq(result, seq);
            }
            Op::SaveChampionshipResult { result } => {
                self.apply_save_championship_with_seq(result, seq);
            }
            Op::SetChampionshipPicks {
                user_id,
                drivers,
                teams,
            } => {
                self.apply_set_picks_with_seq(user_id, drivers, teams, seq);
            }
            Op::SettleUser {
                user_id,
                key,
                line,
                late_used,
            } => {
                self.apply_settle_with_seq(user_id, key, line, late_used, seq)?;
            }
            Op::AppendStandings { snapshot } => {
                self.apply_append_standings_with_seq(snapshot, seq);
            }
        }
        Ok(())
    }

    /// Entry for one member at one race.
    pub fn entry(&self, race_id: RaceId, user_id: UserId) -> Option<&RaceEntry> {
        self.entries.get(&(race_id, user_id))
    }

    /// Cloned entry for one member at one race.
    pub fn entry_cloned(&self, race_id: RaceId, user_id: UserId) -> Option<RaceEntry> {
        self.entry(race_id, user_id).cloned()
    }

    /// All entries for a race in submission arrival order.
    pub fn entries_for_race(&self, race_id: RaceId) -> Vec<&RaceEntry> {
        self.entry_order
            .get(&race_id)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|user_id| self.entries.get(&(race_id, *user_id)))
            .collect()
    }

    /// Cloned entries for a race in submission arrival order.
    pub fn entries_for_race_cloned(&self, race_id: RaceId) -> Vec<RaceEntry> {
        self.entries_for_race(race_id).into_iter().cloned().collect()
    }

    /// Official result for a race, if saved.
    pub fn race_result(&self, race_id: RaceId) -> Option<&RaceResult> {
        self.results.get(&race_id)
    }

    /// Official championship result, if saved.
    pub fn championship_result(&self) -> Option<&ChampionshipResult> {
        self.championship.as_ref()
    }

    /// Ranking document for a member.
    pub fn ranking(&self, user_id: UserId) -> Option<&RankingEntry> {
        self.rankings.get(&user_id)
    }

    /// Cloned ranking document for a member.
    pub fn ranking_cloned(&self, user_id: UserId) -> Option<RankingEntry> {
        self.ranking(user_id).cloned()
    }

    /// Ranking documents in arrival order.
    pub fn rankings_ordered(&self) -> Vec<&RankingEntry> {
        self.user_order
            .iter()
            .filter_map(|id| self.rankings.get(id))
            .collect()
    }

    /// Live standings rows for the current totals.
    pub fn current_standings(&self) -> Vec<StandingsRow> {
        standings_rows(self.rankings_ordered())
    }

    /// Most recently captured standings snapshot.
    pub fn latest_standings(&self) -> Option<&StandingsSnapshot> {
        self.standings_log.last()
    }

    /// Full append-only standings history.
    pub fn standings_log(&self) -> &[StandingsSnapshot] {
        &self.standings_log
    }

    /// Latest snapshot rows paired with movement against the snapshot
    /// before it. Deltas are 0 when there is no prior snapshot or the
    /// member is a new entrant.
    pub fn standings_trend(&self) -> Vec<(StandingsRow, i64)> {
        let Some(latest) = self.standings_log.last() else {
            return Vec::new();
        };
        let prior = self
            .standings_log
            .len()
            .checked_sub(2)
            .map(|idx| &self.standings_log[idx]);

        latest
            .rows
            .iter()
            .map(|row| {
                let delta = position_delta(row.user_id, row.position, prior);
                (row.clone(), delta)
            })
            .collect()
    }

    /// Takes all ops journaled since the last drain.
    pub fn drain_pending_ops(&mut self) -> Vec<StoredOp> {
        std::mem::take(&mut self.pending_ops)
    }

    /// Highest sequence handed out so far.
    pub fn latest_op_seq(&self) -> OpSeq {
        self.next_op_seq.saturating_sub(1)
    }

    fn apply_upsert_entry_with_seq(&mut self, entry: RaceEntry, seq: OpSeq) -> StoredOp {
        self.ensure_ranking(entry.user_id);

        let key = (entry.race_id, entry.user_id);
        if !self.entries.contains_key(&key) {
            self.entry_order
                .entry(entry.race_id)
                .or_default()
                .push(entry.user_id);
        }
        self.entries.insert(key, entry.clone());

        self.bump_next_seq_from(seq);
        StoredOp {
            seq,
            ts_ms: now_ms(),
            op: Op::UpsertEntry { entry },
        }
    }

    fn apply_save_result_with_seq(&mut self, result: RaceResult, seq: OpSeq) -> StoredOp {
        self.results.insert(result.race_id, result.clone());
        self.bump_next_seq_from(seq);
        StoredOp {
            seq,
            ts_ms: now_ms(),
            op: Op::SaveRaceResult { result },
        }
    }

    fn apply_save_championship_with_seq(
        &mut self,
        result: ChampionshipResult,
        seq: OpSeq,
    ) -> StoredOp {
        self.championship = Some(result.clone());
        self.bump_next_seq_from(seq);
        StoredOp {
            seq,
            ts_ms: now_ms(),
            op: Op::SaveChampionshipResult { result },
        }
    }

    fn apply_set_picks_with_seq(
        &mut self,
        user_id: UserId,
        drivers: Option<[DriverId; 3]>,
        teams: Option<[TeamId; 3]>,
        seq: OpSeq,
    ) -> StoredOp {
        self.ensure_ranking(user_id);
        if let Some(ranking) = self.rankings.get_mut(&user_id) {
            ranking.championship_drivers = drivers.clone();
            ranking.championship_teams = teams.clone();
        }

        self.bump_next_seq_from(seq);
        StoredOp {
            seq,
            ts_ms: now_ms(),
            op: Op::SetChampionshipPicks {
                user_id,
                drivers,
                teams,
            },
        }
    }

    fn apply_settle_with_seq(
        &mut self,
        user_id: UserId,
        key: LedgerKey,
        line: LedgerLine,
        late_used: bool,
        seq: OpSeq,
    ) -> Result<(LineDelta, StoredOp), StoreError> {
        if !self.rankings.contains_key(&user_id) {
            return Err(StoreError::MissingRanking(user_id));
        }
        if let LedgerKey::Race(race_id) = key {
            let entry = self
                .entries
                .get_mut(&(race_id, user_id))
                .ok_or(StoreError::MissingEntry(race_id, user_id))?;
            entry.main_pts = Some(line.main_pts);
            entry.sprint_pts = Some(line.sprint_pts);
        }

        let ranking = self
            .rankings
            .get_mut(&user_id)
            .ok_or(StoreError::MissingRanking(user_id))?;
        let delta = ranking.reconcile(key, line);
        if late_used {
            ranking.late_pass_used = true;
        }

        self.bump_next_seq_from(seq);
        let stored = StoredOp {
            seq,
            ts_ms: now_ms(),
            op: Op::SettleUser {
                user_id,
                key,
                line,
                late_used,
            },
        };
        Ok((delta, stored))
    }

    fn apply_append_standings_with_seq(
        &mut self,
        snapshot: StandingsSnapshot,
        seq: OpSeq,
    ) -> StoredOp {
        self.next_snapshot_id = self.next_snapshot_id.max(snapshot.id.saturating_add(1));
        self.standings_log.push(snapshot.clone());

        self.bump_next_seq_from(seq);
        StoredOp {
            seq,
            ts_ms: now_ms(),
            op: Op::AppendStandings { snapshot },
        }
    }

    fn ensure_ranking(&mut self, user_id: UserId) {
        if !self.rankings.contains_key(&user_id) {
            self.rankings.insert(user_id, RankingEntry::new(user_id));
            self.user_order.push(user_id);
        }
    }

    fn take_next_op_seq(&mut self) -> OpSeq {
        let seq = self.next_op_seq;
        self.next_op_seq += 1;
        seq
    }

    fn bump_next_seq_from(&mut self, seq: OpSeq) {
        self.next_op_seq = self.next_op_seq.max(seq.saturating_add(1));
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
