//! Settlement runs: score, reconcile the ledger per member, capture
//! standings, and report per-member failures.

use log::{debug, info, warn};

use crate::{
    core::store::{PoolStore, StoreError},
    rank::{LedgerKey, LedgerLine, RankingEntry, SnapshotKind},
    results::RaceResult,
    scoring::{
        championship::score_championship,
        race::{score_race, EntryScore, ScoreError},
    },
    types::{RaceId, SnapshotId, UserId},
};

/// Failure of a settlement run.
#[derive(Debug)]
pub enum SettleError {
    /// The run was refused before any write (bad or missing result).
    Score(ScoreError),
    /// The store rejected a mutation.
    Store(StoreError),
}

impl From<ScoreError> for SettleError {
    fn from(value: ScoreError) -> Self {
        Self::Score(value)
    }
}

impl From<StoreError> for SettleError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Outcome of a settlement run.
///
/// `failed` lists members whose settlement did not apply and who need a
/// retry; everyone else's ledger update stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    /// Members settled successfully.
    pub updated: usize,
    /// Members whose settlement failed.
    pub failed: Vec<UserId>,
    /// Standings snapshot captured at the end of the run.
    pub snapshot_id: SnapshotId,
}

/// Settles one race: scores every entry against the official result,
/// reconciles each member's ledger, and captures a standings snapshot.
///
/// Fails before any write when the result is missing, incomplete, or the
/// race is cancelled. Re-running with an unchanged result reconciles every
/// member to a zero delta.
pub fn settle_race(store: &mut PoolStore, race_id: RaceId) -> Result<SettlementReport, SettleError> {
    let result: RaceResult = store
        .race_result(race_id)
        .cloned()
        .ok_or(ScoreError::ResultMissing(race_id))?;
    let entries = store.entries_for_race_cloned(race_id);
    let scores = score_race(&result, &entries)?;

    let mut updated = 0usize;
    let mut failed = Vec::new();
    for (entry, (user_id, score)) in entries.iter().zip(&scores) {
        let line = score_line(score);
        match store.apply_settlement(*user_id, LedgerKey::Race(race_id), line, entry.is_late) {
            Ok((delta, _)) => {
                updated += 1;
                if !delta.is_noop() {
                    debug!("race {race_id}: member {user_id} moved {} points", delta.points);
                }
            }
            Err(err) => {
                warn!("race {race_id}: settlement for member {user_id} failed: {err:?}");
                failed.push(*user_id);
            }
        }
    }

    let (snapshot_id, _) = store.capture_standings(SnapshotKind::Race(race_id));
    info!(
        "race {race_id} settled: {updated} updated, {} failed, snapshot {snapshot_id}",
        failed.len()
    );
    Ok(SettlementReport {
        updated,
        failed,
        snapshot_id,
    })
}

/// Settles the season championship for every member with a ranking
/// document, then captures a standings snapshot.
pub fn settle_championship(store: &mut PoolStore) -> Result<SettlementReport, SettleError> {
    let result = store
        .championship_result()
        .cloned()
        .ok_or(ScoreError::ChampionshipIncomplete)?;
    let members: Vec<RankingEntry> = store
        .rankings_ordered()
        .into_iter()
        .cloned()
        .collect();
    let scores = score_championship(&result, members.iter())?;

    let mut updated = 0usize;
    let mut failed = Vec::new();
    for (user_id, score) in &scores {
        let line = score_line(score);
        match store.apply_settlement(*user_id, LedgerKey::Championship, line, false) {
            Ok((delta, _)) => {
                updated += 1;
                if !delta.is_noop() {
                    debug!("championship: member {user_id} moved {} points", delta.points);
                }
            }
            Err(err) => {
                warn!("championship settlement for member {user_id} failed: {err:?}");
                failed.push(*user_id);
            }
        }
    }

    let (snapshot_id, _) = store.capture_standings(SnapshotKind::Championship);
    info!(
        "championship settled: {updated} updated, {} failed, snapshot {snapshot_id}",
        failed.len()
    );
    Ok(SettlementReport {
        updated,
        failed,
        snapshot_id,
    })
}

fn score_line(score: &EntryScore) -> LedgerLine {
    LedgerLine {
        main_pts: score.main_pts,
        sprint_pts: score.sprint_pts,
        wildcards: score.wildcards_granted,
    }
}
