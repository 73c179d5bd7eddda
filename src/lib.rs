//! Fantasy-F1 pick scoring with idempotent ledger settlement and
//! append-only SQLite journaling.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::PoolStore`]:
//! ```
//! use gridpool::{
//!     core::store::PoolStore,
//!     entry::RaceEntry,
//!     results::RaceResult,
//!     settle::settle_race,
//! };
//!
//! let mut store = PoolStore::new();
//! store.upsert_entry(RaceEntry {
//!     main_picks: Some(["VER".into(), "NOR".into(), "LEC".into()]),
//!     wildcard: Some("VER".into()),
//!     ..RaceEntry::blank(1, 7)
//! });
//! store.save_race_result(RaceResult::with_podium(
//!     1,
//!     ["VER".into(), "NOR".into(), "LEC".into()],
//! ));
//!
//! let report = settle_race(&mut store, 1).expect("settle");
//! assert_eq!(report.updated, 1);
//! assert_eq!(store.ranking(7).map(|r| r.total_points), Some(34));
//! ```
//!
//! Runtime usage with SQLite sink:
//! ```no_run
//! use gridpool::{
//!     core::store::PoolStore,
//!     persist::sqlite::SqliteOpSink,
//!     results::RaceResult,
//!     runtime::handle::{spawn_pool, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sink = SqliteOpSink::open("gridpool.db").expect("open sqlite");
//! let handle = spawn_pool(PoolStore::new(), Some(Box::new(sink)), RuntimeConfig::default());
//! handle
//!     .save_race_result(RaceResult::with_podium(
//!         1,
//!         ["VER".into(), "NOR".into(), "LEC".into()],
//!     ))
//!     .await
//!     .expect("save result");
//! let report = handle.settle_race(1).await.expect("settle");
//! println!("updated {} members", report.updated);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Core in-memory store and index helpers.
pub mod core;
/// Pick submission records.
pub mod entry;
/// Mutation op model and persistence wrapper types.
pub mod op;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Ranking documents, point ledger, and standings snapshots.
pub mod rank;
/// Feed-name resolution onto the seasonal roster.
pub mod resolve;
/// Official race and championship result records.
pub mod results;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Pure scoring engines.
pub mod scoring;
/// Settlement runs and reports.
pub mod settle;
/// Shared primitive types and aliases.
pub mod types;
