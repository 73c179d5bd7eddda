use std::sync::Arc;

use log::warn;
use tokio::{
    sync::{broadcast, mpsc, oneshot, Mutex},
    time::{Duration, Instant},
};

use crate::{
    core::store::PoolStore,
    entry::RaceEntry,
    op::{Op, StoredOp},
    persist::{OpSink, PersistError},
    rank::{RankingEntry, SnapshotKind, StandingsRow},
    results::{ChampionshipResult, RaceResult},
    settle::{settle_championship, settle_race, SettleError, SettlementReport},
    types::{DriverId, OpSeq, RaceId, SnapshotId, TeamId, UserId},
};

use super::events::PoolEvent;

/// Runtime-level failure returned through the handle.
#[derive(Debug)]
pub enum RuntimeError {
    /// A settlement run failed.
    Settle(SettleError),
    /// Persistence rejected or lost a write.
    Persist(PersistError),
    /// The runtime loop is gone.
    ChannelClosed,
}

impl From<SettleError> for RuntimeError {
    fn from(value: SettleError) -> Self {
        Self::Settle(value)
    }
}

impl From<PersistError> for RuntimeError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Tuning knobs for the runtime loop and persistence worker.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Flush the journal as soon as a batch contains settlement ops.
    pub flush_on_settle: bool,
    /// Max ops per journal batch.
    pub batch_max_ops: usize,
    /// Max time an op waits in the batch buffer.
    pub batch_max_latency_ms: u64,
    /// Bound of the persistence queue; overflow surfaces as an error.
    pub persist_queue_bound: usize,
    /// Auto-checkpoint after this many ops (0 disables).
    pub snapshot_every_ops: usize,
    /// Compact the journal after each checkpoint.
    pub compact_after_snapshot: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flush_on_settle: true,
            batch_max_ops: 32,
            batch_max_latency_ms: 75,
            persist_queue_bound: 64,
            snapshot_every_ops: 2000,
            compact_after_snapshot: false,
        }
    }
}

/// Cloneable async handle to the single-writer pool runtime.
pub struct PoolHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<PoolEvent>,
}

impl Clone for PoolHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    SubmitEntry {
        entry: RaceEntry,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    SaveRaceResult {
        result: RaceResult,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    SaveChampionshipResult {
        result: ChampionshipResult,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    SetChampionshipPicks {
        user_id: UserId,
        drivers: Option<[DriverId; 3]>,
        teams: Option<[TeamId; 3]>,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    SettleRace {
        race_id: RaceId,
        resp: oneshot::Sender<Result<SettlementReport, RuntimeError>>,
    },
    SettleChampionship {
        resp: oneshot::Sender<Result<SettlementReport, RuntimeError>>,
    },
    CaptureStandings {
        resp: oneshot::Sender<Result<SnapshotId, RuntimeError>>,
    },
    Entry {
        race_id: RaceId,
        user_id: UserId,
        resp: oneshot::Sender<Option<RaceEntry>>,
    },
    Ranking {
        user_id: UserId,
        resp: oneshot::Sender<Option<RankingEntry>>,
    },
    Standings {
        resp: oneshot::Sender<Vec<StandingsRow>>,
    },
    StandingsTrend {
        resp: oneshot::Sender<Vec<(StandingsRow, i64)>>,
    },
    Flush {
        resp: oneshot::Sender<Result<OpSeq, RuntimeError>>,
    },
    Checkpoint {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Op(StoredOp),
    Flush {
        resp: oneshot::Sender<Result<OpSeq, PersistError>>,
    },
    Checkpoint {
        snapshot: crate::core::store::PoolSnapshotV1,
        last_seq: OpSeq,
        compact: bool,
        resp: oneshot::Sender<Result<(), PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the single-writer runtime owning `store`, optionally journaling
/// through `sink`.
pub fn spawn_pool(
    store: PoolStore,
    sink: Option<Box<dyn OpSink>>,
    config: RuntimeConfig,
) -> PoolHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<PoolEvent>(1024);

    let (persist_tx_opt, mut durable_rx) = if let Some(sink) = sink {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound);
        let (durable_tx, durable_rx) = mpsc::unbounded_channel::<Result<OpSeq, PersistError>>();
        spawn_persistence_worker(sink, persist_rx, durable_tx, config.clone());
        (Some(persist_tx), Some(durable_rx))
    } else {
        (None, None)
    };

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut store = store;
        let mut ops_since_snapshot = 0usize;

        loop {
            if let Some(rx) = durable_rx.as_mut() {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else { break; };
                        let done = handle_command(
                            cmd,
                            &mut store,
                            &events_tx_loop,
                            persist_tx_opt.as_ref(),
                            &config,
                            &mut ops_since_snapshot,
                        ).await;

                        if done {
                            break;
                        }
                    }
                    durable = rx.recv() => {
                        if let Some(Ok(op_seq)) = durable {
                            let _ = events_tx_loop.send(PoolEvent::DurableUpTo { op_seq });
                        }
                    }
                }
            } else {
                let Some(cmd) = cmd_rx.recv().await else { break; };
                let done = handle_command(
                    cmd,
                    &mut store,
                    &events_tx_loop,
                    persist_tx_opt.as_ref(),
                    &config,
                    &mut ops_since_snapshot,
                ).await;
                if done {
                    break;
                }
            }
        }
    });

    PoolHandle { cmd_tx, events_tx }
}

impl PoolHandle {
    /// Subscribes to the runtime event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events_tx.subscribe()
    }

    /// Creates or overwrites a member's entry for a race.
    pub async fn submit_entry(&self, entry: RaceEntry) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SubmitEntry { entry, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Saves or overwrites a race's official result.
    pub async fn save_race_result(&self, result: RaceResult) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SaveRaceResult { result, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Saves or overwrites the championship result.
    pub async fn save_championship_result(
        &self,
        result: ChampionshipResult,
    ) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SaveChampionshipResult { result, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Records a member's pre-season championship picks.
    pub async fn set_championship_picks(
        &self,
        user_id: UserId,
        drivers: Option<[DriverId; 3]>,
        teams: Option<[TeamId; 3]>,
    ) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetChampionshipPicks {
                user_id,
                drivers,
                teams,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Runs a race settlement and returns its report.
    pub async fn settle_race(&self, race_id: RaceId) -> Result<SettlementReport, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SettleRace { race_id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Runs the championship settlement and returns its report.
    pub async fn settle_championship(&self) -> Result<SettlementReport, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SettleChampionship { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Captures a standings snapshot on demand.
    pub async fn capture_standings(&self) -> Result<SnapshotId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::CaptureStandings { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Fetches a member's entry for a race.
    pub async fn entry(
        &self,
        race_id: RaceId,
        user_id: UserId,
    ) -> Result<Option<RaceEntry>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Entry {
                race_id,
                user_id,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Fetches a member's ranking document.
    pub async fn ranking(&self, user_id: UserId) -> Result<Option<RankingEntry>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Ranking { user_id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Fetches live standings rows.
    pub async fn standings(&self) -> Result<Vec<StandingsRow>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Standings { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Fetches the latest snapshot rows with movement deltas.
    pub async fn standings_trend(&self) -> Result<Vec<(StandingsRow, i64)>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::StandingsTrend { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Forces the journal to durable storage.
    pub async fn flush(&self) -> Result<OpSeq, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Flush { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Writes a store checkpoint.
    pub async fn checkpoint(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Checkpoint { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Flushes, stops the persistence worker, and ends the runtime loop.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

async fn handle_command(
    cmd: Command,
    store: &mut PoolStore,
    events_tx: &broadcast::Sender<PoolEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    config: &RuntimeConfig,
    ops_since_snapshot: &mut usize,
) -> bool {
    match cmd {
        Command::SubmitEntry { entry, resp } => {
            let race_id = entry.race_id;
            let user_id = entry.user_id;
            store.upsert_entry(entry);
            let res = forward_pending(store, events_tx, persist_tx);
            if res.is_ok() {
                let _ = events_tx.send(PoolEvent::EntrySubmitted { race_id, user_id });
            }
            bump_and_maybe_checkpoint(store, persist_tx, config, ops_since_snapshot, 1).await;
            let _ = resp.send(res);
        }
        Command::SaveRaceResult { result, resp } => {
            let race_id = result.race_id;
            store.save_race_result(result);
            let res = forward_pending(store, events_tx, persist_tx);
            if res.is_ok() {
                let _ = events_tx.send(PoolEvent::ResultSaved { race_id });
            }
            bump_and_maybe_checkpoint(store, persist_tx, config, ops_since_snapshot, 1).await;
            let _ = resp.send(res);
        }
        Command::SaveChampionshipResult { result, resp } => {
            store.save_championship_result(result);
            let res = forward_pending(store, events_tx, persist_tx);
            if res.is_ok() {
                let _ = events_tx.send(PoolEvent::ChampionshipResultSaved);
            }
            bump_and_maybe_checkpoint(store, persist_tx, config, ops_since_snapshot, 1).await;
            let _ = resp.send(res);
        }
        Command::SetChampionshipPicks {
            user_id,
            drivers,
            teams,
            resp,
        } => {
            store.set_championship_picks(user_id, drivers, teams);
            let res = forward_pending(store, events_tx, persist_tx);
            if res.is_ok() {
                let _ = events_tx.send(PoolEvent::PicksSet { user_id });
            }
            bump_and_maybe_checkpoint(store, persist_tx, config, ops_since_snapshot, 1).await;
            let _ = resp.send(res);
        }
        Command::SettleRace { race_id, resp } => {
            let res = settle_race(store, race_id)
                .map_err(RuntimeError::from)
                .and_then(|report| {
                    forward_pending(store, events_tx, persist_tx)?;
                    let _ = events_tx.send(PoolEvent::RaceSettled {
                        race_id,
                        updated: report.updated,
                        failed: report.failed.len(),
                    });
                    let _ = events_tx.send(PoolEvent::StandingsCaptured {
                        snapshot_id: report.snapshot_id,
                    });
                    Ok(report)
                });
            if let Ok(report) = &res {
                let settled = report.updated + 1;
                bump_and_maybe_checkpoint(store, persist_tx, config, ops_since_snapshot, settled)
                    .await;
            }
            let _ = resp.send(res);
        }
        Command::SettleChampionship { resp } => {
            let res = settle_championship(store)
                .map_err(RuntimeError::from)
                .and_then(|report| {
                    forward_pending(store, events_tx, persist_tx)?;
                    let _ = events_tx.send(PoolEvent::ChampionshipSettled {
                        updated: report.updated,
                        failed: report.failed.len(),
                    });
                    let _ = events_tx.send(PoolEvent::StandingsCaptured {
                        snapshot_id: report.snapshot_id,
                    });
                    Ok(report)
                });
            if let Ok(report) = &res {
                let settled = report.updated + 1;
                bump_and_maybe_checkpoint(store, persist_tx, config, ops_since_snapshot, settled)
                    .await;
            }
            let _ = resp.send(res);
        }
        Command::CaptureStandings { resp } => {
            let (snapshot_id, _) = store.capture_standings(SnapshotKind::Manual);
            let res = forward_pending(store, events_tx, persist_tx).map(|()| snapshot_id);
            if res.is_ok() {
                let _ = events_tx.send(PoolEvent::StandingsCaptured { snapshot_id });
            }
            bump_and_maybe_checkpoint(store, persist_tx, config, ops_since_snapshot, 1).await;
            let _ = resp.send(res);
        }
        Command::Entry {
            race_id,
            user_id,
            resp,
        } => {
            let _ = resp.send(store.entry_cloned(race_id, user_id));
        }
        Command::Ranking { user_id, resp } => {
            let _ = resp.send(store.ranking_cloned(user_id));
        }
        Command::Standings { resp } => {
            let _ = resp.send(store.current_standings());
        }
        Command::StandingsTrend { resp } => {
            let _ = resp.send(store.standings_trend());
        }
        Command::Flush { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (flush_tx, flush_rx) = oneshot::channel();
                if tx.send(PersistMsg::Flush { resp: flush_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    flush_rx
                        .await
                        .map_err(|_| RuntimeError::ChannelClosed)
                        .and_then(|r| r.map_err(RuntimeError::from))
                }
            } else {
                Ok(store.latest_op_seq())
            };
            let _ = resp.send(out);
        }
        Command::Checkpoint { resp } => {
            let out = if let Some(tx) = persist_tx {
                let snapshot = store.export_snapshot();
                let last_seq = store.latest_op_seq();
                let (cp_tx, cp_rx) = oneshot::channel();
                if tx
                    .send(PersistMsg::Checkpoint {
                        snapshot,
                        last_seq,
                        compact: config.compact_after_snapshot,
                        resp: cp_tx,
                    })
                    .await
                    .is_err()
                {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    cp_rx
                        .await
                        .map_err(|_| RuntimeError::ChannelClosed)
                        .and_then(|r| r.map_err(RuntimeError::from))
                }
            } else {
                Ok(())
            };
            let _ = resp.send(out);
        }
        Command::Shutdown { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                let send_res = tx.send(PersistMsg::Shutdown { resp: done_tx }).await;
                if send_res.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    match done_rx.await {
                        Ok(()) => Ok(()),
                        Err(_) => Err(RuntimeError::ChannelClosed),
                    }
                }
            } else {
                Ok(())
            };
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

/// Enqueues everything the store journaled during the current command, or
/// emits the durable watermark directly when running without a sink.
fn forward_pending(
    store: &mut PoolStore,
    events_tx: &broadcast::Sender<PoolEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
) -> Result<(), RuntimeError> {
    let ops = store.drain_pending_ops();
    match persist_tx {
        Some(tx) => {
            for stored in ops {
                enqueue_persist(tx, stored)?;
            }
        }
        None => {
            if !ops.is_empty() {
                let _ = events_tx.send(PoolEvent::DurableUpTo {
                    op_seq: store.latest_op_seq(),
                });
            }
        }
    }
    Ok(())
}

async fn bump_and_maybe_checkpoint(
    store: &PoolStore,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    config: &RuntimeConfig,
    ops_since_snapshot: &mut usize,
    new_ops: usize,
) {
    *ops_since_snapshot += new_ops;

    if config.snapshot_every_ops == 0 || *ops_since_snapshot < config.snapshot_every_ops {
        return;
    }

    let Some(tx) = persist_tx else {
        return;
    };

    let snapshot = store.export_snapshot();
    let last_seq = store.latest_op_seq();
    let (cp_tx, cp_rx) = oneshot::channel();
    if tx
        .send(PersistMsg::Checkpoint {
            snapshot,
            last_seq,
            compact: config.compact_after_snapshot,
            resp: cp_tx,
        })
        .await
        .is_ok()
    {
        let _ = cp_rx.await;
        *ops_since_snapshot = 0;
    }
}

fn spawn_persistence_worker(
    sink: Box<dyn OpSink>,
    mut rx: mpsc::Receiver<PersistMsg>,
    durable_tx: mpsc::UnboundedSender<Result<OpSeq, PersistError>>,
    config: RuntimeConfig,
) {
    let sink = Arc::new(Mutex::new(sink));
    tokio::spawn(async move {
        let mut buf = Vec::<StoredOp>::new();
        let mut deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
        let mut last_durable: OpSeq = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                        break;
                    };

                    match msg {
                        PersistMsg::Op(stored) => {
                            let is_settlement = matches!(
                                stored.op,
                                Op::SettleUser { .. } | Op::AppendStandings { .. }
                            );
                            buf.push(stored);

                            if buf.len() >= config.batch_max_ops
                                || (config.flush_on_settle && is_settlement)
                            {
                                let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                                deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                            }
                        }
                        PersistMsg::Flush { resp } => {
                            let result = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(result.map(|_| last_durable));
                            deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                        }
                        PersistMsg::Checkpoint { snapshot, last_seq, compact, resp } => {
                            let flush_result = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let result = if let Err(err) = flush_result {
                                Err(err)
                            } else {
                                let sink_ref = Arc::clone(&sink);
                                match tokio::task::spawn_blocking(move || {
                                    let mut sink = sink_ref.blocking_lock();
                                    sink.write_snapshot(&snapshot, last_seq)?;
                                    if compact {
                                        let _ = sink.compact_through(last_seq)?;
                                    }
                                    Result::<(), PersistError>::Ok(())
                                }).await {
                                    Ok(inner) => inner,
                                    Err(e) => Err(PersistError::Message(format!("join error: {e}"))),
                                }
                            };
                            let _ = resp.send(result);
                            deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !buf.is_empty() => {
                    let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, false).await;
                    deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                }
            }
        }
    });
}

async fn flush_buf(
    sink: &Arc<Mutex<Box<dyn OpSink>>>,
    buf: &mut Vec<StoredOp>,
    last_durable: &mut OpSeq,
    durable_tx: &mpsc::UnboundedSender<Result<OpSeq, PersistError>>,
    call_flush: bool,
) -> Result<(), PersistError> {
    if buf.is_empty() {
        if call_flush {
            let sink_ref = Arc::clone(sink);
            tokio::task::spawn_blocking(move || {
                let mut sink = sink_ref.blocking_lock();
                sink.flush()
            })
            .await
            .map_err(|e| PersistError::Message(format!("join error: {e}")))??;
        }
        return Ok(());
    }

    let ops = std::mem::take(buf);
    let sink_ref = Arc::clone(sink);
    let append_res: Result<OpSeq, PersistError> = tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        let seq = sink.append_ops(&ops)?;
        if call_flush {
            sink.flush()?;
        }
        Ok(seq)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?;

    match append_res {
        Ok(seq) => {
            *last_durable = (*last_durable).max(seq);
            let _ = durable_tx.send(Ok(*last_durable));
            Ok(())
        }
        Err(err) => {
            let _ = durable_tx.send(Err(PersistError::Message(format!("append failed: {err:?}"))));
            Err(err)
        }
    }
}

fn enqueue_persist(tx: &mpsc::Sender<PersistMsg>, stored: StoredOp) -> Result<(), RuntimeError> {
    tx.try_send(PersistMsg::Op(stored)).map_err(|err| {
        warn!("journal queue rejected op: {err}");
        RuntimeError::Persist(PersistError::Message(format!("persist queue error: {err}")))
    })
}
