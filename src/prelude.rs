//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! tsunagi crate. Import this module to get access to the core functionality
//! without having to import each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! // Use the prelude to get easy access to all the core types.
//! use tsunagi::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! // Build a two-block program
//! let mut factory = CommandFactory::new();
//! let mut graph = BlockGraph::new();
//! let a = graph.insert(Block::new(factory.create(CommandKind::MoveForward), Vec2::ZERO));
//! let b = graph.insert(Block::new(factory.create(CommandKind::TurnRight), Vec2::new(0.0, 120.0)));
//! graph.connect(PortRef::output(a, 0), PortRef::input(b));
//!
//! // Run it against a simulated robot
//! let timers = Arc::new(TokioTimers::new());
//! let robot = Arc::new(SimRobot::new(timers.clone()));
//! let executor = Executor::new(timers);
//! let summary = executor.run(&graph, a, robot).await?;
//!
//! println!("{} of {} steps ran", summary.steps_completed, summary.total_steps);
//! # Ok(())
//! # }
//! ```

// Program building
pub use crate::command::{Command, CommandFactory, CommandId, CommandKind};
pub use crate::graph::{Block, BlockGraph, BlockId, Connector, Direction, ParamType, PortRef};
pub use crate::sequence::ProgramSequence;

// Snapping
pub use crate::snap::{SnapInfo, SnapKind, SnapManager, DEFAULT_SNAP_DISTANCE};

// Execution
pub use crate::exec::{ExecEvent, ExecState, ExecutionContext, Executor, RunOutcome, RunSummary};

// Movement and timing providers
pub use crate::robot::{Pose, RobotConfig, RobotController, SimRobot};
pub use crate::timers::{Timers, TokioTimers, WaitHandle, WaitId};

// Geometry
pub use crate::geometry::Vec2;

// Error types
pub use crate::error::{CommandError, ExecError, RobotError};

// Standard library re-exports commonly used with this crate
pub use std::sync::Arc;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
