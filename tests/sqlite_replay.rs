use tempfile::TempDir;

use gridpool::{
    core::store::PoolStore,
    entry::RaceEntry,
    persist::{sqlite::SqliteOpSink, OpSink},
    results::{ChampionshipResult, RaceResult},
    settle::{settle_championship, settle_race},
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

fn seeded_store() -> PoolStore {
    let mut store = PoolStore::new();
    store.upsert_entry(entry(1, 7, ["A", "B", "C"]));
    store.upsert_entry(entry(1, 8, ["C", "A", "B"]));
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));
    settle_race(&mut store, 1).expect("settle race");

    store.set_championship_picks(
        7,
        Some(podium("A", "B", "C")),
        Some(podium("T1", "T2", "T3")),
    );
    store.save_championship_result(ChampionshipResult {
        drivers: Some(podium("A", "B", "C")),
        teams: Some(podium("T1", "T2", "T3")),
    });
    settle_championship(&mut store).expect("settle championship");
    store
}

#[test]
fn journal_replay_round_trips_rankings_and_standings() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("pool.db");

    let mut store = seeded_store();
    let mut sink = SqliteOpSink::open(&db_path).expect("open sqlite");
    let ops = store.drain_pending_ops();
    sink.append_ops(&ops).expect("append");
    drop(sink);

    let reopened = SqliteOpSink::open(&db_path).expect("reopen");
    let replayed = reopened.load_store().expect("replay");

    assert_eq!(store.export_snapshot(), replayed.export_snapshot());
    assert_eq!(
        replayed.ranking(7).map(|r| r.total_points),
        store.ranking(7).map(|r| r.total_points)
    );
}

#[test]
fn replayed_settlements_apply_the_same_deltas() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("resettle.db");

    let mut store = PoolStore::new();
    let mut sink = SqliteOpSink::open(&db_path).expect("open sqlite");

    store.upsert_entry(entry(1, 7, ["A", "B", "X"]));
    store.save_race_result(RaceResult::with_podium(1, podium("A", "B", "C")));
    settle_race(&mut store, 1).expect("settle");
    // A corrected result settled again: replay must land on the corrected
    // totals, not the sum of both runs.
    store.save_race_result(RaceResult::with_podium(1, podium("B", "A", "C")));
    settle_race(&mut store, 1).expect("resettle");

    sink.append_ops(&store.drain_pending_ops()).expect("append");
    drop(sink);

    let replayed = SqliteOpSink::open(&db_path)
        .expect("reopen")
        .load_store()
        .expect("replay");
    assert_eq!(replayed.ranking(7).map(|r| r.total_points), Some(0));
    assert_eq!(
        replayed.ranking(7).map(|r| r.ledger_total()),
        Some(0)
    );
}

#[test]
fn checkpoint_and_compaction_preserve_replay() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("checkpoint.db");

    let mut store = seeded_store();
    let mut sink = SqliteOpSink::open(&db_path).expect("open sqlite");
    sink.append_ops(&store.drain_pending_ops()).expect("append");

    let snapshot = store.export_snapshot();
    let last_seq = store.latest_op_seq();
    sink.write_snapshot(&snapshot, last_seq).expect("checkpoint");
    let removed = sink.compact_through(last_seq).expect("compact");
    assert!(removed > 0);
    drop(sink);

    let reopened = SqliteOpSink::open(&db_path).expect("reopen");
    let replayed = reopened.load_store().expect("replay");
    assert_eq!(replayed.export_snapshot(), snapshot);

    // Ops journaled after the checkpoint replay on top of it.
    store.upsert_entry(entry(2, 7, ["B", "A", "C"]));
    store.save_race_result(RaceResult::with_podium(2, podium("B", "A", "C")));
    settle_race(&mut store, 2).expect("settle tail race");

    let mut tail_sink = SqliteOpSink::open(&db_path).expect("tail open");
    tail_sink
        .append_ops(&store.drain_pending_ops())
        .expect("append tail");
    drop(tail_sink);

    let replayed = SqliteOpSink::open(&db_path)
        .expect("final open")
        .load_store()
        .expect("final replay");
    assert_eq!(replayed.export_snapshot(), store.export_snapshot());
}
