use criterion::{criterion_group, criterion_main, Criterion};

use gridpool::{
    core::store::PoolStore,
    entry::RaceEntry,
    results::RaceResult,
    settle::settle_race,
    types::{RaceId, UserId},
};

const DRIVERS: [&str; 5] = ["VER", "NOR", "LEC", "PIA", "HAM"];

fn entry(race_id: RaceId, user_id: UserId) -> RaceEntry {
    let rot = usize::try_from(user_id).unwrap_or(0);
    RaceEntry {
        main_picks: Some([
            DRIVERS[rot % 5].to_string(),
            DRIVERS[(rot + 1) % 5].to_string(),
            DRIVERS[(rot + 2) % 5].to_string(),
        ]),
        wildcard: Some(DRIVERS[(rot + 3) % 5].to_string()),
        ..RaceEntry::blank(race_id, user_id)
    }
}

fn podium() -> [String; 3] {
    ["VER".to_string(), "NOR".to_string(), "LEC".to_string()]
}

fn bench_submissions(c: &mut Criterion) {
    c.bench_function("store_upsert_50k", |b| {
        b.iter(|| {
            let mut store = PoolStore::new();
            for i in 0..50_000u64 {
                store.upsert_entry(entry(1, i));
            }
        });
    });
}

fn bench_settlement(c: &mut Criterion) {
    c.bench_function("settle_race_5k_members", |b| {
        b.iter(|| {
            let mut store = PoolStore::new();
            for i in 0..5_000u64 {
                store.upsert_entry(entry(1, i));
            }
            store.save_race_result(RaceResult::with_podium(1, podium()));
            settle_race(&mut store, 1).expect("settle");
        });
    });
}

fn bench_resettlement(c: &mut Criterion) {
    c.bench_function("resettle_race_1k_members_20x", |b| {
        b.iter(|| {
            let mut store = PoolStore::new();
            for i in 0..1_000u64 {
                store.upsert_entry(entry(1, i));
            }
            store.save_race_result(RaceResult::with_podium(1, podium()));
            for _ in 0..20 {
                settle_race(&mut store, 1).expect("settle");
            }
        });
    });
}

criterion_group!(
    benches,
    bench_submissions,
    bench_settlement,
    bench_resettlement
);
criterion_main!(benches);
