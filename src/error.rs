use crate::command::CommandId;
use crate::graph::BlockId;
use thiserror::Error;

/// Errors reported by the execution engine, either synchronously when a run
/// is rejected or terminally when a step fails mid-run.
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    #[error("executor is already running a program")]
    AlreadyRunning,

    #[error("no program to run: entry block '{0}' is not in the graph")]
    MissingEntry(BlockId),

    #[error("command {id} failed: {source}")]
    Command {
        id: CommandId,
        #[source]
        source: CommandError,
    },
}

/// Errors raised while executing a single command against its providers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Robot(#[from] RobotError),

    #[error("wait was cancelled before it completed")]
    WaitCancelled,
}

/// Errors surfaced by a movement provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RobotError {
    #[error("robot is already executing an action")]
    Busy,

    #[error("movement was interrupted before reaching its target")]
    Interrupted,
}

/// The single rejection value of a [`Promise`](crate::promise::Promise):
/// the pending operation was cancelled before it could resolve.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("the pending operation was cancelled")]
pub struct Cancelled;
