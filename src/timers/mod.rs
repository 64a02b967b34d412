//! The timer/waiter provider: cancellable, tick-driven waits the engine and
//! commands suspend on.

use crate::error::Cancelled;
use crate::promise::{Deferred, Promise};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::trace;

/// Identifies one outstanding wait so it can be cancelled individually.
pub type WaitId = u64;

/// Per-tick progress observer for a timed wait; receives the elapsed
/// fraction in `0.0..=1.0`.
pub type ProgressFn = Box<dyn FnMut(f32) + Send>;

/// Condition polled by [`Timers::wait_until`].
pub type PredicateFn = Box<dyn Fn() -> bool + Send + Sync>;

/// A cancellable in-flight wait. Awaiting it yields `Ok(())` on expiry or
/// `Err(Cancelled)` when stopped.
#[derive(Debug)]
pub struct WaitHandle {
    id: WaitId,
    promise: Promise,
}

impl WaitHandle {
    pub fn id(&self) -> WaitId {
        self.id
    }
}

impl Future for WaitHandle {
    type Output = Result<(), Cancelled>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.promise).poll(cx)
    }
}

/// The timer/waiter collaborator contract.
///
/// Handle-returning rather than `async fn` so that a specific outstanding
/// wait can be cancelled from outside while someone awaits it.
pub trait Timers: Send + Sync {
    /// Resolves after `seconds` of clock time, reporting fractional progress
    /// on every tick in between.
    fn wait(&self, seconds: f64, on_progress: Option<ProgressFn>) -> WaitHandle;

    /// Resolves once `predicate` returns true; the predicate is polled once
    /// per tick.
    fn wait_until(&self, predicate: PredicateFn) -> WaitHandle;

    /// Cancels one outstanding wait; its future rejects as cancelled.
    /// No-op for unknown or already-settled ids.
    fn stop(&self, id: WaitId);

    /// Cancels every outstanding wait.
    fn stop_all(&self);
}

/// Tick-driven [`Timers`] implementation on the tokio clock.
///
/// Each wait runs as a spawned task that sleeps one tick at a time, so
/// `TokioTimers` must be used from within a tokio runtime. The tokio test
/// clock (`start_paused`) is honored.
pub struct TokioTimers {
    tick: Duration,
    next_id: AtomicU64,
    pending: Arc<Mutex<AHashMap<WaitId, Deferred>>>,
}

impl TokioTimers {
    /// Default tick interval; roughly one UI frame.
    pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

    pub fn new() -> Self {
        Self::with_tick(Self::DEFAULT_TICK)
    }

    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
            next_id: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn register(&self) -> (WaitId, Promise) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (deferred, promise) = Deferred::pair();
        self.pending.lock().insert(id, deferred);
        (id, promise)
    }
}

impl Default for TokioTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers for TokioTimers {
    fn wait(&self, seconds: f64, mut on_progress: Option<ProgressFn>) -> WaitHandle {
        let (id, promise) = self.register();
        let pending = Arc::clone(&self.pending);
        let tick = self.tick;
        let duration = Duration::from_secs_f64(seconds.max(0.0));
        trace!(id, ?duration, "wait started");

        tokio::spawn(async move {
            let started = Instant::now();
            loop {
                // Expiry is checked before sleeping so a zero-duration wait
                // resolves without consuming a tick.
                if started.elapsed() >= duration {
                    if let Some(callback) = on_progress.as_mut() {
                        callback(1.0);
                    }
                    if let Some(mut deferred) = pending.lock().remove(&id) {
                        deferred.resolve();
                    }
                    return;
                }
                time::sleep(tick).await;
                // Cancelled from outside: stop() already rejected.
                if !pending.lock().contains_key(&id) {
                    return;
                }
                let fraction =
                    (started.elapsed().as_secs_f64() / duration.as_secs_f64()).min(1.0) as f32;
                if fraction < 1.0 {
                    if let Some(callback) = on_progress.as_mut() {
                        callback(fraction);
                    }
                }
            }
        });

        WaitHandle { id, promise }
    }

    fn wait_until(&self, predicate: PredicateFn) -> WaitHandle {
        let (id, promise) = self.register();
        let pending = Arc::clone(&self.pending);
        let tick = self.tick;

        tokio::spawn(async move {
            loop {
                if !pending.lock().contains_key(&id) {
                    return;
                }
                if predicate() {
                    if let Some(mut deferred) = pending.lock().remove(&id) {
                        deferred.resolve();
                    }
                    return;
                }
                time::sleep(tick).await;
            }
        });

        WaitHandle { id, promise }
    }

    fn stop(&self, id: WaitId) {
        if let Some(mut deferred) = self.pending.lock().remove(&id) {
            deferred.reject();
            trace!(id, "wait cancelled");
        }
    }

    fn stop_all(&self) {
        let drained: Vec<Deferred> = {
            let mut guard = self.pending.lock();
            guard.drain().map(|(_, d)| d).collect()
        };
        for mut deferred in drained {
            deferred.reject();
        }
    }
}
