//! # Status Transition Worker
//!
//! Consumes the orders change feed and moves every new order from `PREPARING` to
//! `OUT_FOR_DELIVERY` once its preparation delay has elapsed.
//!
//! ## Per-event tasks
//!
//! The feed loop never waits on an order. Each `INSERT` of a `PREPARING` order is handed to
//! its own task in a [`JoinSet`]; the task sleeps for the preparation delay, performs the
//! conditional update (retrying transient store errors) and notifies on success. Any number
//! of orders can be cooking at once.
//!
//! ## Redelivery
//!
//! The feed is at-least-once. A redelivered `INSERT` either finds its order still armed in
//! this worker (and is dropped), or arms a fresh timer whose conditional update then fails
//! its precondition. In both cases no second notification is sent.
//!
//! ## Checkpoints
//!
//! The saved checkpoint is a low watermark: the highest sequence such that every event at or
//! below it has been fully handled. An armed timer holds it back, so a worker restarted
//! after a crash replays the `INSERT` and re-arms the delay. A task that panics counts as a
//! failed transition and releases its sequence.
//!
//! A checkpoint ahead of the store's head belongs to a log this store no longer has (an
//! in-memory store after a restart). The worker then replays the feed from the start.

use crate::checkpoint::Checkpoint;
use crate::error::OrderError;
use crate::model::{Order, OrderId, OrderStatus};
use crate::notifier::NotificationDispatcher;
use crate::retry::{retry, RetryPolicy};
use crate::store::OrderStore;
use actor_store::{ChangeEvent, ChangeKind};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn, Instrument};

/// Tunables of the transition worker.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Simulated preparation time between the insert and the transition.
    pub preparation_delay: Duration,
    /// Maximum number of events read from the feed at once.
    pub batch_size: usize,
    /// Retry policy for the conditional update.
    pub update_retry: RetryPolicy,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            preparation_delay: Duration::from_secs(10),
            batch_size: 100,
            update_retry: RetryPolicy::new(),
        }
    }
}

/// How one scheduled order ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Transitioned,
    AlreadyTransitioned,
    Failed,
}

#[derive(Debug, Default)]
struct Counters {
    scheduled: AtomicU64,
    transitioned: AtomicU64,
    already_transitioned: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
    failed_orders: Mutex<Vec<OrderId>>,
}

/// Live counters of a worker. Clones observe the same counters.
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    counters: Arc<Counters>,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub scheduled: u64,
    pub transitioned: u64,
    pub already_transitioned: u64,
    pub ignored: u64,
    pub failed: u64,
    pub failed_orders: Vec<OrderId>,
}

impl WorkerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        let c = &self.counters;
        StatsSnapshot {
            scheduled: c.scheduled.load(Ordering::SeqCst),
            transitioned: c.transitioned.load(Ordering::SeqCst),
            already_transitioned: c.already_transitioned.load(Ordering::SeqCst),
            ignored: c.ignored.load(Ordering::SeqCst),
            failed: c.failed.load(Ordering::SeqCst),
            failed_orders: self.failed_orders(),
        }
    }

    /// Orders whose transition failed after every retry (they stay `PREPARING`) or whose task
    /// panicked.
    pub fn failed_orders(&self) -> Vec<OrderId> {
        self.counters
            .failed_orders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record_scheduled(&self) {
        self.counters.scheduled.fetch_add(1, Ordering::SeqCst);
    }

    fn record_ignored(&self) {
        self.counters.ignored.fetch_add(1, Ordering::SeqCst);
    }

    fn record_outcome(&self, order_id: OrderId, outcome: Outcome) {
        let c = &self.counters;
        match outcome {
            Outcome::Transitioned => c.transitioned.fetch_add(1, Ordering::SeqCst),
            Outcome::AlreadyTransitioned => c.already_transitioned.fetch_add(1, Ordering::SeqCst),
            Outcome::Failed => {
                c.failed_orders
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(order_id);
                c.failed.fetch_add(1, Ordering::SeqCst)
            }
        };
    }
}

/// Low-watermark tracker over feed sequences.
///
/// Sequences are begun in feed order and may complete in any order. The safe point never
/// passes an incomplete sequence.
#[derive(Debug)]
pub struct CheckpointTracker {
    in_flight: BTreeSet<u64>,
    highest: u64,
}

impl CheckpointTracker {
    pub fn new(start: u64) -> Self {
        Self {
            in_flight: BTreeSet::new(),
            highest: start,
        }
    }

    pub fn begin(&mut self, sequence: u64) {
        self.in_flight.insert(sequence);
        self.highest = self.highest.max(sequence);
    }

    pub fn complete(&mut self, sequence: u64) {
        self.in_flight.remove(&sequence);
    }

    /// Highest sequence at or below which nothing is in flight.
    pub fn safe_point(&self) -> u64 {
        match self.in_flight.first() {
            Some(&oldest) => oldest - 1,
            None => self.highest,
        }
    }
}

/// Handle to a spawned worker.
pub struct WorkerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    stats: WorkerStats,
}

impl WorkerHandle {
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Stops the feed loop and abandons armed timers. The checkpoint is left at the last
    /// safe point so abandoned orders are replayed on the next start.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "Transition worker task failed");
        }
    }
}

/// The feed consumer that drives orders through their lifecycle.
pub struct TransitionWorker {
    store: OrderStore,
    dispatcher: NotificationDispatcher,
    checkpoint: Arc<dyn Checkpoint>,
    settings: WorkerSettings,
    stats: WorkerStats,
}

impl TransitionWorker {
    pub fn new(
        store: OrderStore,
        dispatcher: NotificationDispatcher,
        checkpoint: Arc<dyn Checkpoint>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            store,
            dispatcher,
            checkpoint,
            settings,
            stats: WorkerStats::default(),
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.clone()
    }

    /// Spawns the feed loop on the current runtime.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown, signal) = oneshot::channel();
        let stats = self.stats();
        let task = tokio::spawn(self.run(signal));
        WorkerHandle {
            shutdown,
            task,
            stats,
        }
    }

    /// Runs until `shutdown` fires (or its sender is dropped) or the store closes.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let start = match self.checkpoint.load().await {
            Ok(sequence) => sequence,
            Err(e) => {
                error!(error = %e, "Could not load checkpoint, replaying feed from the start");
                0
            }
        };
        let head = self.store.head();
        let start = if start > head {
            warn!(
                checkpoint = start,
                head, "Checkpoint is ahead of the change feed, replaying feed from the start"
            );
            0
        } else {
            start
        };
        info!(checkpoint = start, head, "Transition worker started");

        let mut feed = self.store.feed(start, self.settings.batch_size);
        let mut tracker = CheckpointTracker::new(start);
        let mut saved = start;
        let mut armed: HashSet<OrderId> = HashSet::new();
        let mut tasks: JoinSet<(u64, OrderId, Outcome)> = JoinSet::new();
        let mut running: HashMap<task::Id, (u64, OrderId)> = HashMap::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(armed = armed.len(), "Shutdown requested");
                    break;
                }
                batch = feed.next_batch() => match batch {
                    Ok(events) => {
                        for event in events {
                            let sequence = event.sequence;
                            if let Some((id, order_id)) =
                                self.dispatch(event, &mut tracker, &mut armed, &mut tasks)
                            {
                                running.insert(id, (sequence, order_id));
                            }
                        }
                    }
                    Err(e) => {
                        info!(error = %e, "Change feed closed");
                        break;
                    }
                },
                Some(joined) = tasks.join_next_with_id() => {
                    let finished = match joined {
                        Ok((id, (sequence, order_id, outcome))) => {
                            running.remove(&id);
                            Some((sequence, order_id, outcome))
                        }
                        Err(e) => {
                            let lost = running.remove(&e.id());
                            let order_id = lost.map(|(_, order_id)| order_id);
                            error!(error = %e, ?order_id, "Transition task panicked");
                            lost.map(|(sequence, order_id)| (sequence, order_id, Outcome::Failed))
                        }
                    };
                    if let Some((sequence, order_id, outcome)) = finished {
                        armed.remove(&order_id);
                        tracker.complete(sequence);
                        self.stats.record_outcome(order_id, outcome);
                    }
                }
            }
            self.save_checkpoint(&tracker, &mut saved).await;
        }

        tasks.shutdown().await;
        info!(stats = ?self.stats.snapshot(), checkpoint = saved, "Transition worker stopped");
    }

    fn dispatch(
        &self,
        event: ChangeEvent<Order>,
        tracker: &mut CheckpointTracker,
        armed: &mut HashSet<OrderId>,
        tasks: &mut JoinSet<(u64, OrderId, Outcome)>,
    ) -> Option<(task::Id, OrderId)> {
        let sequence = event.sequence;
        let order = event.new_image;
        tracker.begin(sequence);

        let schedulable =
            event.kind == ChangeKind::Insert && order.status == OrderStatus::Preparing;
        if !schedulable || !armed.insert(order.order_id) {
            debug!(seq = sequence, order_id = %order.order_id, kind = ?event.kind, "Event ignored");
            self.stats.record_ignored();
            tracker.complete(sequence);
            return None;
        }

        debug!(
            seq = sequence,
            order_id = %order.order_id,
            delay_ms = self.settings.preparation_delay.as_millis() as u64,
            "Order scheduled"
        );
        self.stats.record_scheduled();

        let order_id = order.order_id;
        let store = self.store.clone();
        let dispatcher = self.dispatcher.clone();
        let settings = self.settings.clone();
        let span = tracing::info_span!("transition", %order_id);
        let handle = tasks.spawn(
            async move {
                tokio::time::sleep(settings.preparation_delay).await;
                let outcome = advance(&store, &dispatcher, &settings.update_retry, order_id).await;
                (sequence, order_id, outcome)
            }
            .instrument(span),
        );
        Some((handle.id(), order_id))
    }

    async fn save_checkpoint(&self, tracker: &CheckpointTracker, saved: &mut u64) {
        let safe = tracker.safe_point();
        if safe <= *saved {
            return;
        }
        match self.checkpoint.save(safe).await {
            Ok(()) => {
                debug!(checkpoint = safe, "Checkpoint saved");
                *saved = safe;
            }
            Err(e) => warn!(checkpoint = safe, error = %e, "Checkpoint save failed"),
        }
    }
}

/// Performs the `PREPARING → OUT_FOR_DELIVERY` transition of one order and notifies on
/// success. Only transient store errors are retried.
pub async fn advance(
    store: &OrderStore,
    dispatcher: &NotificationDispatcher,
    policy: &RetryPolicy,
    order_id: OrderId,
) -> Outcome {
    let result = retry("conditional_update", policy, OrderError::is_transient, || {
        store.conditional_update(order_id, OrderStatus::Preparing, OrderStatus::OutForDelivery)
    })
    .await;

    match result {
        Ok(order) => {
            info!(status = %order.status, "Order transitioned");
            if let Err(e) = dispatcher.notify(&order).await {
                warn!(error = %e, "Transition committed but notification failed");
            }
            Outcome::Transitioned
        }
        Err(OrderError::PreconditionFailed(_)) => {
            info!("Order already transitioned, skipping notification");
            Outcome::AlreadyTransitioned
        }
        Err(e) => {
            error!(error = %e, "Transition failed after retries, order left PREPARING");
            Outcome::Failed
        }
    }
}
