//! The execution engine: walks a program graph one block at a time,
//! executing each command asynchronously while honoring pause/resume/stop
//! and publishing lifecycle events.

mod context;
mod event;

pub use context::ExecutionContext;
pub use event::{CommandInfo, ExecEvent, ExecState};

use crate::command::{Command, CommandId};
use crate::error::{CommandError, ExecError};
use crate::graph::{BlockGraph, BlockId};
use crate::promise::Deferred;
use crate::robot::RobotController;
use crate::timers::Timers;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Hard guard against unbounded chains. Hitting it logs a warning and
/// truncates the run; it is not a failure.
pub const MAX_CHAIN_HOPS: usize = 10_000;

/// How a finished (non-failed) run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
}

/// What a run did, returned by [`Executor::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub steps_completed: usize,
    pub total_steps: usize,
}

struct ExecutorShared {
    state: Mutex<ExecState>,
    paused: AtomicBool,
    pause_gate: Mutex<Option<Deferred>>,
    progress: Mutex<f32>,
    steps_completed: AtomicUsize,
    stop_tx: watch::Sender<bool>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<ExecEvent>>>,
}

/// Asynchronous sequential scheduler for a block program.
///
/// Scheduling is single-threaded and cooperative: steps run strictly in
/// chain order and no step begins before the previous step's future
/// resolves. The only suspension points are the pause gate ahead of each
/// step and the command's own execution future.
///
/// The chain is snapshotted when a run starts; graph edits made while the
/// run is in flight are not observed by it.
pub struct Executor {
    timers: Arc<dyn Timers>,
    shared: Arc<ExecutorShared>,
}

impl Executor {
    /// Creates an engine bound to its timer provider. The movement provider
    /// is passed per run.
    pub fn new(timers: Arc<dyn Timers>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            timers,
            shared: Arc::new(ExecutorShared {
                state: Mutex::new(ExecState::Idle),
                paused: AtomicBool::new(false),
                pause_gate: Mutex::new(None),
                progress: Mutex::new(0.0),
                steps_completed: AtomicUsize::new(0),
                stop_tx,
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> ExecState {
        *self.shared.state.lock()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state(), ExecState::Running | ExecState::Paused)
    }

    /// Completed/total ratio in `0.0..=1.0`; monotonically non-decreasing
    /// across a run and exactly `1.0` at completion.
    pub fn progress(&self) -> f32 {
        *self.shared.progress.lock()
    }

    pub fn steps_completed(&self) -> usize {
        self.shared.steps_completed.load(Ordering::SeqCst)
    }

    /// Registers an observer. Events arrive in emission order; a dropped
    /// receiver is pruned on the next emission.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ExecEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.listeners.lock().push(tx);
        rx
    }

    fn emit(&self, event: ExecEvent) {
        self.shared
            .listeners
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Requests a pause. The step already in flight completes normally; the
    /// next step-start blocks until [`resume`](Self::resume) or
    /// [`stop`](Self::stop).
    pub fn pause(&self) {
        let mut state = self.shared.state.lock();
        if *state == ExecState::Running {
            *state = ExecState::Paused;
            self.shared.paused.store(true, Ordering::SeqCst);
            info!("execution paused");
        }
    }

    /// Releases a pending pause so the blocked step proceeds.
    pub fn resume(&self) {
        let mut state = self.shared.state.lock();
        if *state == ExecState::Paused {
            *state = ExecState::Running;
            self.shared.paused.store(false, Ordering::SeqCst);
            if let Some(mut gate) = self.shared.pause_gate.lock().take() {
                gate.resolve();
            }
            info!("execution resumed");
        }
    }

    /// Stops the current run. Safe to call in any state (`Idle` is a
    /// no-op); clears pause state, rejects a pending pause gate, and
    /// cancels the in-flight command so no waiter leaks. Partial robot
    /// movement is not rolled back.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            if !matches!(*state, ExecState::Running | ExecState::Paused) {
                return;
            }
            *state = ExecState::Stopped;
        }
        self.shared.paused.store(false, Ordering::SeqCst);
        if let Some(mut gate) = self.shared.pause_gate.lock().take() {
            gate.reject();
        }
        let _ = self.shared.stop_tx.send(true);
        info!("execution stopped");
    }

    /// Runs the chain starting at `entry` against `robot`.
    ///
    /// Rejected synchronously — with no state change — when a run is
    /// already in flight or `entry` is not in the graph. Otherwise resolves
    /// with a [`RunSummary`] on completion or stop, or the failing step's
    /// error.
    pub async fn run(
        &self,
        graph: &BlockGraph,
        entry: BlockId,
        robot: Arc<dyn RobotController>,
    ) -> Result<RunSummary, ExecError> {
        {
            let mut state = self.shared.state.lock();
            if !state.accepts_run() {
                return Err(ExecError::AlreadyRunning);
            }
            if !graph.contains(entry) {
                return Err(ExecError::MissingEntry(entry));
            }
            *state = ExecState::Running;
        }
        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.steps_completed.store(0, Ordering::SeqCst);
        *self.shared.progress.lock() = 0.0;
        self.shared.stop_tx.send_replace(false);
        let mut stop_rx = self.shared.stop_tx.subscribe();

        let chain = snapshot_chain(graph, entry);
        let total = chain.len();
        info!(total, "program run started");

        if total == 0 {
            // Vacuous completion.
            *self.shared.state.lock() = ExecState::Completed;
            *self.shared.progress.lock() = 1.0;
            self.emit(ExecEvent::ProgramCompleted);
            return Ok(RunSummary {
                outcome: RunOutcome::Completed,
                steps_completed: 0,
                total_steps: 0,
            });
        }

        let mut ctx = ExecutionContext::new();
        for command in &chain {
            if *stop_rx.borrow() {
                return Ok(self.finish_stopped(total));
            }

            ctx.current_command_id = Some(command.id);
            self.emit(ExecEvent::StepStarted(CommandInfo::from(command)));
            debug!(id = command.id, name = %command.display_name(), "step started");

            if self.shared.paused.load(Ordering::SeqCst) {
                let promise = {
                    let (deferred, promise) = Deferred::pair();
                    *self.shared.pause_gate.lock() = Some(deferred);
                    promise
                };
                // stop() may land between the pause check and the gate
                // install; the stop signal must release the wait either way.
                tokio::select! {
                    resumed = promise => {
                        if resumed.is_err() {
                            return Ok(self.finish_stopped(total));
                        }
                    }
                    _ = stop_rx.wait_for(|stopped| *stopped) => {
                        return Ok(self.finish_stopped(total));
                    }
                }
            }

            let step = command.execute(robot.as_ref(), self.timers.as_ref(), &mut ctx);
            tokio::select! {
                result = step => {
                    if let Err(source) = result {
                        return Err(self.finish_failed(command.id, source));
                    }
                }
                _ = stop_rx.wait_for(|stopped| *stopped) => {
                    robot.stop();
                    self.timers.stop_all();
                    return Ok(self.finish_stopped(total));
                }
            }

            ctx.steps_completed += 1;
            self.shared
                .steps_completed
                .store(ctx.steps_completed, Ordering::SeqCst);
            let progress = ctx.steps_completed as f32 / total as f32;
            *self.shared.progress.lock() = progress;
            self.emit(ExecEvent::StepCompleted {
                command: CommandInfo::from(command),
                progress,
            });
            debug!(id = command.id, progress, "step completed");
        }

        {
            let mut state = self.shared.state.lock();
            // A stop that landed right after the last step wins.
            if *state == ExecState::Stopped {
                return Ok(RunSummary {
                    outcome: RunOutcome::Stopped,
                    steps_completed: ctx.steps_completed,
                    total_steps: total,
                });
            }
            *state = ExecState::Completed;
        }
        *self.shared.progress.lock() = 1.0;
        self.emit(ExecEvent::ProgramCompleted);
        info!(steps = ctx.steps_completed, "program completed");
        Ok(RunSummary {
            outcome: RunOutcome::Completed,
            steps_completed: ctx.steps_completed,
            total_steps: total,
        })
    }

    fn finish_stopped(&self, total: usize) -> RunSummary {
        *self.shared.state.lock() = ExecState::Stopped;
        self.shared.paused.store(false, Ordering::SeqCst);
        if let Some(mut gate) = self.shared.pause_gate.lock().take() {
            gate.reject();
        }
        let steps = self.steps_completed();
        info!(steps, "program run stopped");
        RunSummary {
            outcome: RunOutcome::Stopped,
            steps_completed: steps,
            total_steps: total,
        }
    }

    fn finish_failed(&self, id: CommandId, source: CommandError) -> ExecError {
        *self.shared.state.lock() = ExecState::Failed;
        self.shared.paused.store(false, Ordering::SeqCst);
        let error = ExecError::Command { id, source };
        self.emit(ExecEvent::ProgramFailed(error.clone()));
        warn!(%error, "program failed");
        error
    }
}

/// Clones the command chain reachable from `entry` via
/// [`BlockGraph::next_of`], truncated at [`MAX_CHAIN_HOPS`].
fn snapshot_chain(graph: &BlockGraph, entry: BlockId) -> Vec<Command> {
    let mut chain = Vec::new();
    let mut current = Some(entry);
    while let Some(id) = current {
        let Some(block) = graph.get(id) else {
            break;
        };
        chain.push(block.command.clone());
        if chain.len() >= MAX_CHAIN_HOPS {
            warn!(
                limit = MAX_CHAIN_HOPS,
                "command chain too long, possible loop; truncating"
            );
            break;
        }
        current = graph.next_of(id);
    }
    chain
}
