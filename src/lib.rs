//! # Tsunagi - Block Program Assembly and Execution Engine
//!
//! **Tsunagi** is a headless engine for visual block programming: draggable
//! command blocks snap together by proximity into chains, and the resulting
//! program drives a robot through an asynchronous, pausable, cancellable
//! sequential run.
//!
//! ## Core Workflow
//!
//! The engine is UI-agnostic. It operates on a canonical model of a block
//! graph and leaves rendering and input handling to the caller. The primary
//! workflow is:
//!
//! 1.  **Create Commands**: Use a [`CommandFactory`](command::CommandFactory)
//!     to mint uniquely-identified commands and wrap each one in a
//!     [`Block`](graph::Block) placed on the canvas.
//! 2.  **Assemble**: Drive a [`SnapManager`](snap::SnapManager) from drag
//!     gestures. When a dropped block lands within snap distance of a
//!     compatible port, the manager aligns it and wires the connection;
//!     chains grow, splice and detach through the same gestures.
//! 3.  **Execute**: Hand the graph's entry block to an
//!     [`Executor`](exec::Executor) together with a
//!     [`RobotController`](robot::RobotController). The engine walks the
//!     chain one command at a time, honoring pause, resume and stop.
//! 4.  **Observe**: Subscribe to [`ExecEvent`](exec::ExecEvent)s for step
//!     lifecycle and progress, e.g. to highlight the active block.
//!
//! ## Quick Start
//!
//! The following example assembles a three-block program by snapping and runs
//! it on the built-in simulated robot.
//!
//! ```rust,no_run
//! use tsunagi::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut factory = CommandFactory::new();
//!     let mut graph = BlockGraph::new();
//!     let snap = SnapManager::new();
//!
//!     // Place the first block; the others start loose on the canvas.
//!     let a = graph.insert(Block::new(
//!         factory.create(CommandKind::MoveForward),
//!         Vec2::ZERO,
//!     ));
//!     let b = graph.insert(Block::new(
//!         factory.create(CommandKind::TurnRight),
//!         Vec2::new(300.0, 300.0),
//!     ));
//!     let c = graph.insert(Block::new(
//!         factory.create(CommandKind::MoveForward),
//!         Vec2::new(600.0, 600.0),
//!     ));
//!
//!     // Simulate dragging each loose block to just under the chain's tail,
//!     // then releasing; within snap distance the manager wires the edge.
//!     graph.get_mut(b).ok_or("missing block")?.position = Vec2::new(2.0, 50.0);
//!     snap.end_drag(&mut graph, b, Vec2::new(300.0, 300.0));
//!     graph.get_mut(c).ok_or("missing block")?.position = Vec2::new(2.0, 98.0);
//!     snap.end_drag(&mut graph, c, Vec2::new(600.0, 600.0));
//!
//!     // Run the assembled chain.
//!     let timers = Arc::new(TokioTimers::new());
//!     let robot = Arc::new(SimRobot::new(timers.clone()));
//!     let executor = Executor::new(timers);
//!
//!     let mut events = executor.subscribe();
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     let entry = graph.entry_block().ok_or("no entry block")?;
//!     let summary = executor.run(&graph, entry, robot.clone()).await?;
//!
//!     println!(
//!         "ran {}/{} steps, final pose {:?}",
//!         summary.steps_completed,
//!         summary.total_steps,
//!         robot.pose()
//!     );
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod exec;
pub mod geometry;
pub mod graph;
pub mod prelude;
pub mod promise;
pub mod robot;
pub mod sequence;
pub mod snap;
pub mod timers;
