use crate::command::Command;
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier of a block in a [`BlockGraph`](super::BlockGraph); equal to the
/// id of the command the block carries.
pub type BlockId = u64;

/// Which way a connector faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

/// Parameter typing for connectors, reserved for value-passing blocks.
/// `Untyped` connectors accept anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParamType {
    #[default]
    Untyped,
    Number,
    Text,
    Boolean,
    Vector,
}

/// Addresses one connector on one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub block: BlockId,
    pub direction: Direction,
    /// Index into the block's output list; always 0 for inputs.
    pub index: usize,
}

impl PortRef {
    pub fn input(block: BlockId) -> Self {
        Self {
            block,
            direction: Direction::Input,
            index: 0,
        }
    }

    pub fn output(block: BlockId, index: usize) -> Self {
        Self {
            block,
            direction: Direction::Output,
            index,
        }
    }
}

/// A directional attachment point owned by a block.
///
/// An edge is stored only on the output side: `connected_to` on an input
/// connector is always `None`, and the output feeding an input is discovered
/// by scanning every block's outputs. Lookup is O(blocks × outputs), which is
/// fine at UI-interaction scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    pub direction: Direction,
    /// Anchor offset from the owning block's origin.
    pub offset: Vec2,
    pub param_type: ParamType,
    pub connected_to: Option<PortRef>,
}

impl Connector {
    pub fn new(direction: Direction, offset: Vec2) -> Self {
        Self {
            direction,
            offset,
            param_type: ParamType::default(),
            connected_to: None,
        }
    }

    /// Whether an edge between this connector and `other` would be legal:
    /// opposite directions and compatible parameter types.
    pub fn can_connect_to(&self, other: &Connector) -> bool {
        if self.direction == other.direction {
            return false;
        }
        self.param_type == ParamType::Untyped
            || other.param_type == ParamType::Untyped
            || self.param_type == other.param_type
    }
}

/// A graph vertex: one command, an optional input connector, and one or more
/// output connectors (the first is the primary one execution follows).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub command: Command,
    pub position: Vec2,
    pub input: Option<Connector>,
    pub outputs: Vec<Connector>,
}

impl Block {
    /// Standard block footprint in program-area units.
    pub const WIDTH: f32 = 160.0;
    pub const HEIGHT: f32 = 48.0;

    /// Creates a block with the standard connector layout: input anchored at
    /// the top-center edge, a single primary output at the bottom-center.
    pub fn new(command: Command, position: Vec2) -> Self {
        let id = command.id;
        Self {
            id,
            command,
            position,
            input: Some(Connector::new(
                Direction::Input,
                Vec2::new(Self::WIDTH / 2.0, 0.0),
            )),
            outputs: vec![Connector::new(
                Direction::Output,
                Vec2::new(Self::WIDTH / 2.0, Self::HEIGHT),
            )],
        }
    }

    pub fn primary_output(&self) -> Option<&Connector> {
        self.outputs.first()
    }

    pub fn primary_output_mut(&mut self) -> Option<&mut Connector> {
        self.outputs.first_mut()
    }
}
