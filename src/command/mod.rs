use crate::error::CommandError;
use crate::exec::ExecutionContext;
use crate::robot::RobotController;
use crate::timers::Timers;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique command identifier, assigned monotonically by a [`CommandFactory`].
pub type CommandId = u64;

/// The closed set of operations a program block can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    MoveForward,
    MoveBackward,
    TurnLeft,
    TurnRight,
    Wait,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::MoveForward => "MoveForward",
            CommandKind::MoveBackward => "MoveBackward",
            CommandKind::TurnLeft => "TurnLeft",
            CommandKind::TurnRight => "TurnRight",
            CommandKind::Wait => "Wait",
        };
        write!(f, "{}", name)
    }
}

/// A single unit of work in a program.
///
/// `next` is the *logical* successor id maintained by
/// [`ProgramSequence`](crate::sequence::ProgramSequence) as blocks are
/// appended in creation order. Once connectors are rewired by snapping it can
/// go stale; the connector graph is the authoritative execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub kind: CommandKind,
    pub params: Vec<f64>,
    pub next: Option<CommandId>,
}

impl Command {
    pub fn new(id: CommandId, kind: CommandKind, params: Vec<f64>) -> Self {
        Self {
            id,
            kind,
            params,
            next: None,
        }
    }

    fn param(&self, index: usize, default: f64) -> f64 {
        self.params.get(index).copied().unwrap_or(default)
    }

    /// Human-readable label for UI blocks and log lines.
    pub fn display_name(&self) -> String {
        match self.kind {
            CommandKind::MoveForward => format!("Forward ({})", self.param(0, 1.0)),
            CommandKind::MoveBackward => format!("Backward ({})", self.param(0, 1.0)),
            CommandKind::TurnLeft => "Turn left".to_string(),
            CommandKind::TurnRight => "Turn right".to_string(),
            CommandKind::Wait => format!("Wait {}s", self.param(0, 1.0)),
        }
    }

    /// Executes this command against the injected providers, resolving when
    /// the action has fully played out.
    pub async fn execute(
        &self,
        robot: &dyn RobotController,
        timers: &dyn Timers,
        _ctx: &mut ExecutionContext,
    ) -> Result<(), CommandError> {
        match self.kind {
            CommandKind::MoveForward => robot.move_forward(self.param(0, 1.0)).await?,
            CommandKind::MoveBackward => robot.move_backward(self.param(0, 1.0)).await?,
            CommandKind::TurnLeft => robot.turn_left().await?,
            CommandKind::TurnRight => robot.turn_right().await?,
            CommandKind::Wait => {
                timers
                    .wait(self.param(0, 1.0), None)
                    .await
                    .map_err(|_| CommandError::WaitCancelled)?;
            }
        }
        Ok(())
    }
}

/// Creates commands with unique, monotonically increasing ids.
#[derive(Debug, Default)]
pub struct CommandFactory {
    next_id: CommandId,
}

impl CommandFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a command of `kind` with its default parameters
    /// (1 unit for moves, 1 second for waits).
    pub fn create(&mut self, kind: CommandKind) -> Command {
        let params = match kind {
            CommandKind::MoveForward | CommandKind::MoveBackward => vec![1.0],
            CommandKind::Wait => vec![1.0],
            CommandKind::TurnLeft | CommandKind::TurnRight => Vec::new(),
        };
        self.create_with_params(kind, params)
    }

    pub fn create_with_params(&mut self, kind: CommandKind, params: Vec<f64>) -> Command {
        let id = self.next_id;
        self.next_id += 1;
        Command::new(id, kind, params)
    }

    /// Restarts id assignment from zero, e.g. after clearing a program.
    pub fn reset(&mut self) {
        self.next_id = 0;
    }
}
