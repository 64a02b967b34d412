//! The snap subsystem: decides whether a block being repositioned is close
//! enough to attach to the rest of the program, and applies the attachment
//! while keeping the graph's edges and visual adjacency intact.

use crate::geometry::Vec2;
use crate::graph::{AnchorProvider, BlockGraph, BlockId, OffsetAnchors, PortRef};
use ahash::AHashSet;
use std::collections::VecDeque;
use tracing::debug;

/// Default attachment radius in program-area units.
pub const DEFAULT_SNAP_DISTANCE: f32 = 50.0;

/// How a prospective snap would connect the moving block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    /// Nothing in range.
    None,
    /// The moving block's output attaches to a host's input
    /// (the moving block becomes upstream).
    OutputToInput,
    /// The moving block's input attaches to a host's output
    /// (the moving block becomes downstream).
    InputToOutput,
}

/// The outcome of a proximity scan.
#[derive(Debug, Clone, Copy)]
pub struct SnapInfo {
    /// The nearest compatible connector, when one exists at all.
    pub target: Option<PortRef>,
    pub kind: SnapKind,
    /// `true` iff a target was found within the snap distance.
    pub can_snap: bool,
    pub distance: f32,
}

impl SnapInfo {
    fn none() -> Self {
        Self {
            target: None,
            kind: SnapKind::None,
            can_snap: false,
            distance: f32::MAX,
        }
    }
}

/// Builds and rewires connector edges from spatial proximity.
///
/// Candidate blocks are scanned in ascending id order and only a strictly
/// smaller distance replaces the current best, so equidistant candidates
/// resolve to the lowest block id.
pub struct SnapManager {
    snap_distance: f32,
    anchors: Box<dyn AnchorProvider>,
}

impl Default for SnapManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapManager {
    pub fn new() -> Self {
        Self::with_anchors(Box::new(OffsetAnchors))
    }

    /// Uses a custom anchor resolver, e.g. one backed by measured UI
    /// geometry instead of the stored offsets.
    pub fn with_anchors(anchors: Box<dyn AnchorProvider>) -> Self {
        Self {
            snap_distance: DEFAULT_SNAP_DISTANCE,
            anchors,
        }
    }

    pub fn snap_distance(&self) -> f32 {
        self.snap_distance
    }

    pub fn set_snap_distance(&mut self, distance: f32) {
        self.snap_distance = distance.max(0.0);
    }

    /// Finds the nearest *input* connector for the moving block's primary
    /// output. Only an unconnected output searches; the moving block itself
    /// is excluded from the scan.
    pub fn find_nearest_input(&self, graph: &BlockGraph, moving: BlockId) -> SnapInfo {
        let origin_port = PortRef::output(moving, 0);
        let already_connected = graph
            .connector(origin_port)
            .is_some_and(|c| c.connected_to.is_some());
        if already_connected {
            return SnapInfo::none();
        }
        self.find_nearest(graph, moving, origin_port, |id| PortRef::input(id))
    }

    /// Finds the nearest *output* connector for the moving block's input.
    /// Only an unfed input searches.
    pub fn find_nearest_output(&self, graph: &BlockGraph, moving: BlockId) -> SnapInfo {
        if graph.incoming(moving).is_some() {
            return SnapInfo::none();
        }
        let origin_port = PortRef::input(moving);
        self.find_nearest(graph, moving, origin_port, |id| PortRef::output(id, 0))
    }

    fn find_nearest(
        &self,
        graph: &BlockGraph,
        moving: BlockId,
        origin_port: PortRef,
        candidate_port: impl Fn(BlockId) -> PortRef,
    ) -> SnapInfo {
        let Some(origin_connector) = graph.connector(origin_port) else {
            return SnapInfo::none();
        };
        let origin_connector = origin_connector.clone();
        let Some(origin) = self.anchors.anchor_of(graph, origin_port) else {
            return SnapInfo::none();
        };

        let mut best = SnapInfo::none();
        for id in graph.ids_sorted() {
            if id == moving {
                continue;
            }
            let port = candidate_port(id);
            let Some(candidate) = graph.connector(port) else {
                continue;
            };
            if !origin_connector.can_connect_to(candidate) {
                continue;
            }
            let Some(anchor) = self.anchors.anchor_of(graph, port) else {
                continue;
            };
            let distance = origin.distance(anchor);
            if distance < best.distance {
                best.target = Some(port);
                best.distance = distance;
            }
        }

        if best.target.is_some() && best.distance <= self.snap_distance {
            best.can_snap = true;
            best.kind = match origin_port.direction {
                crate::graph::Direction::Output => SnapKind::OutputToInput,
                crate::graph::Direction::Input => SnapKind::InputToOutput,
            };
        }
        best
    }

    /// Attempts to attach the moving block after a drag. The output→input
    /// direction is tried first, then input→output. Returns the applied
    /// snap kind, or `None` when nothing was in range (no mutation).
    pub fn try_snap(&self, graph: &mut BlockGraph, moving: BlockId) -> Option<SnapKind> {
        let to_input = self.find_nearest_input(graph, moving);
        if to_input.can_snap {
            if let Some(target) = to_input.target {
                self.attach_output_to_input(graph, moving, target);
                return Some(SnapKind::OutputToInput);
            }
        }
        let to_output = self.find_nearest_output(graph, moving);
        if to_output.can_snap {
            if let Some(target) = to_output.target {
                self.attach_input_to_output(graph, moving, target);
                return Some(SnapKind::InputToOutput);
            }
        }
        None
    }

    /// Finishes a drag: snaps if possible, otherwise restores the block to
    /// its pre-drag position `origin` exactly.
    pub fn end_drag(&self, graph: &mut BlockGraph, moving: BlockId, origin: Vec2) -> SnapKind {
        match self.try_snap(graph, moving) {
            Some(kind) => kind,
            None => {
                if let Some(block) = graph.get_mut(moving) {
                    block.position = origin;
                }
                SnapKind::None
            }
        }
    }

    /// Attaches the moving block's primary output to `target_input`,
    /// translating the moving block so the two anchors coincide.
    ///
    /// If the target input is already fed by another block, the moving block
    /// is spliced into the chain between the two.
    pub fn attach_output_to_input(
        &self,
        graph: &mut BlockGraph,
        moving: BlockId,
        target_input: PortRef,
    ) {
        if target_input.block == moving {
            return;
        }
        if graph.get(moving).is_none() || graph.connector(target_input).is_none() {
            return;
        }
        match graph.incoming(target_input.block) {
            Some(feeder) => self.splice_between(graph, feeder, moving, target_input),
            None => {
                self.align(graph, moving, PortRef::output(moving, 0), target_input);
                graph.connect(PortRef::output(moving, 0), target_input);
                debug!(upstream = moving, downstream = target_input.block, "connected output to input");
            }
        }
    }

    /// Attaches the moving block's input to `target_output`; the moving
    /// block becomes downstream. A previous edge leaving `target_output` is
    /// replaced.
    pub fn attach_input_to_output(
        &self,
        graph: &mut BlockGraph,
        moving: BlockId,
        target_output: PortRef,
    ) {
        if target_output.block == moving {
            return;
        }
        if graph.get(moving).is_none() || graph.connector(target_output).is_none() {
            return;
        }
        self.align(graph, moving, PortRef::input(moving), target_output);
        graph.disconnect_output(target_output);
        graph.connect(target_output, PortRef::input(moving));
        debug!(upstream = target_output.block, downstream = moving, "connected input to output");
    }

    /// Splices `moving` between `feeder`'s block and `target_input`'s block:
    /// realigns and rewires so the chain reads feeder → moving → target,
    /// then cascades the realignment down the rest of the chain.
    fn splice_between(
        &self,
        graph: &mut BlockGraph,
        feeder: PortRef,
        moving: BlockId,
        target_input: PortRef,
    ) {
        self.align(graph, moving, PortRef::input(moving), feeder);
        graph.disconnect_output(feeder);
        graph.connect(feeder, PortRef::input(moving));

        self.align(
            graph,
            target_input.block,
            target_input,
            PortRef::output(moving, 0),
        );
        graph.connect(PortRef::output(moving, 0), target_input);
        debug!(
            upstream = feeder.block,
            inserted = moving,
            downstream = target_input.block,
            "spliced block into chain"
        );

        self.cascade_realign(graph, target_input.block);
    }

    /// Walks the chain below `start` and snaps every downstream block's
    /// input anchor onto its feeder's output anchor. Pure repositioning:
    /// edges are never touched. Iterative with a visited set, so a chain
    /// that accidentally loops still terminates.
    pub fn cascade_realign(&self, graph: &mut BlockGraph, start: BlockId) {
        let mut visited = AHashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(next) = graph.next_of(current) else {
                continue;
            };
            self.align(graph, next, PortRef::input(next), PortRef::output(current, 0));
            queue.push_back(next);
        }
    }

    /// Drag-start contract: breaks the block's incoming and outgoing edges
    /// immediately so the graph never holds an edge to a block mid-flight.
    pub fn detach(&self, graph: &mut BlockGraph, block: BlockId) {
        if graph.get(block).is_none() {
            return;
        }
        if let Some(feeder) = graph.incoming(block) {
            graph.disconnect_output(feeder);
        }
        if let Some(b) = graph.get_mut(block) {
            for output in &mut b.outputs {
                output.connected_to = None;
            }
        }
        debug!(block, "detached block");
    }

    /// Translates `block` so that its connector `port` lands exactly on the
    /// anchor of `target`.
    fn align(&self, graph: &mut BlockGraph, block: BlockId, port: PortRef, target: PortRef) {
        let (Some(goal), Some(current)) = (
            self.anchors.anchor_of(graph, target),
            self.anchors.anchor_of(graph, port),
        ) else {
            return;
        };
        let offset = goal - current;
        if let Some(b) = graph.get_mut(block) {
            b.position = b.position + offset;
        }
    }
}
