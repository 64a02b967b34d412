//! The physical connection graph: blocks, their connectors, and the edges
//! formed between them by snapping.

mod block;

pub use block::{Block, BlockId, Connector, Direction, ParamType, PortRef};

use crate::geometry::Vec2;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

/// Resolves the world-space anchor of a connector.
///
/// The default [`OffsetAnchors`] reads the block position plus the
/// connector's stored offset; a presentation layer can substitute its own
/// measured geometry. Implementations must be pure reads.
pub trait AnchorProvider: Send + Sync {
    fn anchor_of(&self, graph: &BlockGraph, port: PortRef) -> Option<Vec2>;
}

/// Default anchor resolver: block position + connector offset.
#[derive(Debug, Default, Clone, Copy)]
pub struct OffsetAnchors;

impl AnchorProvider for OffsetAnchors {
    fn anchor_of(&self, graph: &BlockGraph, port: PortRef) -> Option<Vec2> {
        graph.anchor_of(port)
    }
}

/// Id-indexed arena of blocks plus the edges stored on their output
/// connectors.
///
/// Mutating operations handed unknown blocks or connectors are silent no-ops:
/// they originate from best-effort spatial queries during live dragging and
/// must never fail loudly.
#[derive(Debug, Default, Clone)]
pub struct BlockGraph {
    blocks: AHashMap<BlockId, Block>,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block, returning its id for convenience.
    pub fn insert(&mut self, block: Block) -> BlockId {
        let id = block.id;
        self.blocks.insert(id, block);
        id
    }

    /// Removes a block, first clearing any edge that points at it so no
    /// other block's connector is left dangling.
    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        if let Some(feeder) = self.incoming(id) {
            self.disconnect_output(feeder);
        }
        self.blocks.remove(&id)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Block ids in ascending order; every scan that has to be deterministic
    /// (tie-breaks, entry discovery) iterates in this order.
    pub fn ids_sorted(&self) -> Vec<BlockId> {
        self.blocks.keys().copied().sorted().collect()
    }

    /// Looks up the connector a [`PortRef`] addresses.
    pub fn connector(&self, port: PortRef) -> Option<&Connector> {
        let block = self.get(port.block)?;
        match port.direction {
            Direction::Input => block.input.as_ref(),
            Direction::Output => block.outputs.get(port.index),
        }
    }

    pub fn connector_mut(&mut self, port: PortRef) -> Option<&mut Connector> {
        let block = self.get_mut(port.block)?;
        match port.direction {
            Direction::Input => block.input.as_mut(),
            Direction::Output => block.outputs.get_mut(port.index),
        }
    }

    /// World-space anchor of a connector: block position + stored offset.
    pub fn anchor_of(&self, port: PortRef) -> Option<Vec2> {
        let block = self.get(port.block)?;
        let connector = self.connector(port)?;
        Some(block.position + connector.offset)
    }

    /// The output connector currently feeding `id`'s input, found by
    /// scanning all blocks' outputs (inputs store no back-pointer).
    pub fn incoming(&self, id: BlockId) -> Option<PortRef> {
        for candidate in self.ids_sorted() {
            let Some(block) = self.get(candidate) else {
                continue;
            };
            for (index, output) in block.outputs.iter().enumerate() {
                if let Some(target) = output.connected_to {
                    if target.block == id {
                        return Some(PortRef::output(candidate, index));
                    }
                }
            }
        }
        None
    }

    /// The block downstream of `id` along its primary output edge.
    ///
    /// This is the single traversal primitive the execution engine uses.
    pub fn next_of(&self, id: BlockId) -> Option<BlockId> {
        self.get(id)?
            .primary_output()?
            .connected_to
            .map(|port| port.block)
    }

    /// Candidate entry point: the lowest-id block whose input has no
    /// incoming edge, or `None` for an empty graph.
    pub fn entry_block(&self) -> Option<BlockId> {
        let mut fed = AHashSet::new();
        for block in self.blocks.values() {
            for output in &block.outputs {
                if let Some(target) = output.connected_to {
                    fed.insert(target.block);
                }
            }
        }
        self.blocks
            .keys()
            .copied()
            .sorted()
            .find(|id| !fed.contains(id))
    }

    /// Sets the directed edge `output.connected_to = input`.
    ///
    /// An input holds at most one incoming edge: a previous feeder of
    /// `input` is disconnected first. Silent no-op unless both connectors
    /// exist, the directions are output→input, the blocks differ, and the
    /// parameter types are compatible.
    pub fn connect(&mut self, output: PortRef, input: PortRef) {
        if output.direction != Direction::Output || input.direction != Direction::Input {
            return;
        }
        if output.block == input.block {
            return;
        }
        let compatible = match (self.connector(output), self.connector(input)) {
            (Some(out), Some(inp)) => out.can_connect_to(inp),
            _ => false,
        };
        if !compatible {
            return;
        }
        if let Some(feeder) = self.incoming(input.block) {
            self.disconnect_output(feeder);
        }
        if let Some(out) = self.connector_mut(output) {
            out.connected_to = Some(input);
        }
    }

    /// Clears the edge leaving `output`, if any. Silent no-op otherwise.
    pub fn disconnect_output(&mut self, output: PortRef) {
        if output.direction != Direction::Output {
            return;
        }
        if let Some(out) = self.connector_mut(output) {
            out.connected_to = None;
        }
    }
}
