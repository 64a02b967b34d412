use crate::command::{Command, CommandId, CommandKind};
use crate::error::ExecError;
use serde::{Deserialize, Serialize};

/// The identity payload the engine reports for a step, decoupled from the
/// command's live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub id: CommandId,
    pub kind: CommandKind,
    pub display_name: String,
}

impl From<&Command> for CommandInfo {
    fn from(command: &Command) -> Self {
        Self {
            id: command.id,
            kind: command.kind,
            display_name: command.display_name(),
        }
    }
}

/// Lifecycle notifications published by the engine.
///
/// Per-step ordering is fixed: `StepStarted` then either `StepCompleted` or
/// `ProgramFailed`, never both. Exactly one terminal event
/// (`ProgramCompleted` / `ProgramFailed`) closes a run that wasn't stopped.
#[derive(Debug, Clone)]
pub enum ExecEvent {
    StepStarted(CommandInfo),
    StepCompleted { command: CommandInfo, progress: f32 },
    ProgramCompleted,
    ProgramFailed(ExecError),
}

/// Scheduler lifecycle states.
///
/// `Idle` is initial; `Completed`, `Failed` and `Stopped` are terminal until
/// the next run begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecState {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
    Stopped,
}

impl ExecState {
    /// Whether a new run may begin from this state.
    pub fn accepts_run(&self) -> bool {
        !matches!(self, ExecState::Running | ExecState::Paused)
    }
}
