//! Common test utilities for building block programs and execution stacks.
use tsunagi::prelude::*;

/// Builds a graph whose blocks are already wired into one chain in the given
/// order, returning the graph and the entry block id.
#[allow(dead_code)]
pub fn build_chain(kinds: &[CommandKind]) -> (BlockGraph, BlockId) {
    let mut factory = CommandFactory::new();
    let mut graph = BlockGraph::new();

    let mut ids = Vec::new();
    for (index, kind) in kinds.iter().enumerate() {
        let position = Vec2::new(0.0, index as f32 * Block::HEIGHT);
        ids.push(graph.insert(Block::new(factory.create(*kind), position)));
    }
    for pair in ids.windows(2) {
        graph.connect(PortRef::output(pair[0], 0), PortRef::input(pair[1]));
    }

    let entry = ids[0];
    (graph, entry)
}

/// Builds a chain of `count` wait blocks of `seconds` each.
#[allow(dead_code)]
pub fn build_wait_chain(count: usize, seconds: f64) -> (BlockGraph, BlockId) {
    let mut factory = CommandFactory::new();
    let mut graph = BlockGraph::new();

    let mut ids = Vec::new();
    for index in 0..count {
        let position = Vec2::new(0.0, index as f32 * Block::HEIGHT);
        let command = factory.create_with_params(CommandKind::Wait, vec![seconds]);
        ids.push(graph.insert(Block::new(command, position)));
    }
    for pair in ids.windows(2) {
        graph.connect(PortRef::output(pair[0], 0), PortRef::input(pair[1]));
    }

    let entry = ids[0];
    (graph, entry)
}

/// A ready-to-run execution stack on the tokio clock: timers, a simulated
/// robot, and an engine sharing them.
#[allow(dead_code)]
pub fn build_stack() -> (Arc<TokioTimers>, Arc<SimRobot>, Executor) {
    let timers = Arc::new(TokioTimers::new());
    let robot = Arc::new(SimRobot::new(timers.clone()));
    let executor = Executor::new(timers.clone());
    (timers, robot, executor)
}

/// Drains every event currently buffered on a subscription.
#[allow(dead_code)]
pub fn drain_events(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ExecEvent>) -> Vec<ExecEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The `progress` values of the `StepCompleted` events in order.
#[allow(dead_code)]
pub fn completed_progresses(events: &[ExecEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            ExecEvent::StepCompleted { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect()
}
