use gridpool::{
    core::store::PoolStore,
    entry::RaceEntry,
    results::{ChampionshipResult, RaceResult},
    settle::{settle_championship, settle_race, SettleError},
    types::{DriverId, RaceId, UserId},
};

fn podium(a: &str, b: &str, c: &str) -> [DriverId; 3] {
    [a.to_string(), b.to_string(), c.to_string()]
}

fn entry(race_id: RaceId, user_id: UserId, picks: [&str; 3]) -> RaceEntry {
    RaceEntry {
        main_picks: Some(podium(picks[0], picks[1], picks[2])),
        ..RaceEntry::blank(race_id, user_id)
    }
}

fn assert_ledger_consistent(store: &PoolStore) {
    for ranking in store.rankings_ordered() {
        assert_eq!(
            ranking.total_points,
            ranking.ledger_total(),
            "ledger drifted for member {}",
            ranking.user_id
        );
    }
}

#[test]
fn resettling_an_unchanged_race_is_a_no_op() {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(1, 7, ["A", "B", "X"]));
    store.upsert_entry(entry(1, 8, ["X", "B", "C"]));
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));

    let first = settle_race(&mut store, 1).expect("first run");
    assert_eq!(first.updated, 2);
    let totals_after_first: Vec<i32> = store
        .rankings_ordered()
        .iter()
        .map(|r| r.total_points)
        .collect();

    let second = settle_race(&mut store, 1).expect("second run");
    assert_eq!(second.updated, 2);
    let totals_after_second: Vec<i32> = store
        .rankings_ordered()
        .iter()
        .map(|r| r.total_points)
        .collect();

    assert_eq!(totals_after_first, totals_after_second);
    assert_ledger_consistent(&store);
}

#[test]
fn corrected_result_replaces_the_old_line_without_double_counting() {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(1, 7, ["A", "B", "X"]));
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));
    settle_race(&mut store, 1).expect("first run");
    assert_eq!(store.ranking(7).expect("ranking").total_points, 22);

    // Stewards reshuffle the podium; only the new value may stand.
    store.save_race_result(RaceResult::with_podium(1, podium("B", "A", "C")));
    settle_race(&mut store, 1).expect("second run");

    let ranking = store.ranking(7).expect("ranking");
    assert_eq!(ranking.total_points, 0);
    assert_eq!(
        ranking.points_by_race.get(&1).map(|l| l.main_pts),
        Some(0)
    );
    assert_ledger_consistent(&store);
}

#[test]
fn settlement_writes_cached_points_back_onto_the_entry() {
    let mut store = PoolStore::new();
    let mut e = entry(2, 7, ["A", "B", "C"]);
    e.sprint_picks = Some(podium("A", "X", "Y"));
    store.upsert_entry(e);

    let mut result = RaceResult::with_podium(2, podium("A", "B", "X"));
    result.sprint_podium = Some(podium("A", "B", "C"));
    store.save_race_result(result);

    settle_race(&mut store, 2).expect("settle");
    let settled = store.entry(2, 7).expect("entry");
    assert_eq!(settled.main_pts, Some(22));
    assert_eq!(settled.sprint_pts, Some(8));
}

#[test]
fn round_score_grant_survives_resettlement_exactly_once() {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(1, 7, ["A", "B", "C"]));
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));

    settle_race(&mut store, 1).expect("first run");
    let ranking = store.ranking(7).expect("ranking");
    assert_eq!(ranking.points_by_race.get(&1).map(|l| l.main_pts), Some(30));
    assert_eq!(ranking.wildcards, 1);

    settle_race(&mut store, 1).expect("second run");
    assert_eq!(store.ranking(7).expect("ranking").wildcards, 1);

    // A corrected result that misses the trigger takes the token back
    // through the same delta path.
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "X")));
    settle_race(&mut store, 1).expect("third run");
    let ranking = store.ranking(7).expect("ranking");
    assert_eq!(ranking.wildcards, 0);
    assert_eq!(ranking.total_points, 22);
    assert_ledger_consistent(&store);
}

#[test]
fn cancelled_race_settles_nothing_and_touches_nothing() {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(1, 7, ["A", "B", "C"]));
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));
    settle_race(&mut store, 1).expect("baseline");

    let before = store.ranking_cloned(7).expect("ranking");
    let snapshots_before = store.standings_log().len();

    let mut cancelled = RaceResult::with_podium(2, podium("A", "B", "C"));
    cancelled.cancelled_main = true;
    store.save_race_result(cancelled);
    store.upsert_entry(entry(2, 7, ["A", "B", "C"]));

    let err = settle_race(&mut store, 2).expect_err("cancelled race");
    assert!(matches!(err, SettleError::Score(_)));

    assert_eq!(store.ranking_cloned(7).expect("ranking"), before);
    assert_eq!(store.standings_log().len(), snapshots_before);
    assert_eq!(store.entry(2, 7).expect("entry").main_pts, None);
}

#[test]
fn missing_result_aborts_before_any_write() {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(1, 7, ["A", "B", "C"]));

    let err = settle_race(&mut store, 1).expect_err("no result saved");
    assert!(matches!(err, SettleError::Score(_)));
    assert_eq!(store.standings_log().len(), 0);
    assert_eq!(store.ranking(7).expect("ranking").total_points, 0);
}

#[test]
fn late_pass_is_consumed_once_and_never_reverted() {
    let mut store = PoolStore::new();
    let mut e = entry(1, 7, ["A", "B", "X"]);
    e.is_late = true;
    store.upsert_entry(e);
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));

    settle_race(&mut store, 1).expect("first run");
    assert!(store.ranking(7).expect("ranking").late_pass_used);
    // 12 + 10 - 3
    assert_eq!(store.ranking(7).expect("ranking").total_points, 19);

    // Overwriting the entry as on-time and re-settling refunds the penalty
    // through the ledger but keeps the pass consumed.
    store.upsert_entry(entry(1, 7, ["A", "B", "X"]));
    settle_race(&mut store, 1).expect("second run");
    let ranking = store.ranking(7).expect("ranking");
    assert_eq!(ranking.total_points, 22);
    assert!(ranking.late_pass_used);
}

#[test]
fn championship_settlement_joins_the_same_ledger() {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(1, 7, ["A", "B", "X"]));
    store.upsert_entry(entry(1, 8, ["C", "B", "A"]));
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));
    settle_race(&mut store, 1).expect("race run");

    store.set_championship_picks(
        7,
        Some(podium("A", "B", "C")),
        Some(podium("T1", "T2", "T3")),
    );
    store.save_championship_result(ChampionshipResult {
        drivers: Some(podium("A", "B", "C")),
        teams: Some(podium("T3", "T2", "T1")),
    });

    let report = settle_championship(&mut store).expect("championship run");
    assert_eq!(report.updated, 2);

    let ranking = store.ranking(7).expect("ranking");
    // Race line 22, championship drivers 29 -> 30 plus teams 10.
    assert_eq!(ranking.championship.map(|l| l.main_pts), Some(40));
    assert_eq!(ranking.total_points, 62);
    assert_eq!(ranking.wildcards, 1);

    // Member 8 never set picks and settles to a zero championship line.
    let ranking = store.ranking(8).expect("ranking");
    assert_eq!(ranking.championship.map(|l| l.main_pts), Some(0));

    let report = settle_championship(&mut store).expect("replay");
    assert_eq!(report.updated, 2);
    assert_eq!(store.ranking(7).expect("ranking").total_points, 62);
    assert_ledger_consistent(&store);
}

#[test]
fn each_run_reports_counts_and_a_fresh_snapshot() {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(5, 1, ["A", "B", "C"]));
    store.save_race_result(RaceResult::with_podium(5, podium("X", "Y", "Z")));

    let first = settle_race(&mut store, 5).expect("first run");
    assert_eq!(first.updated, 1);
    assert!(first.failed.is_empty());

    let second = settle_race(&mut store, 5).expect("second run");
    assert!(second.snapshot_id > first.snapshot_id);
    assert_eq!(store.standings_log().len(), 2);

    // Race and championship lines live under separate ledger keys.
    let ranking = store.ranking(1).expect("ranking");
    assert_eq!(ranking.points_by_race.get(&5).map(|l| l.total()), Some(0));
    assert!(ranking.championship.is_none());
}
