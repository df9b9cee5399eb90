use smallvec::{smallvec, SmallVec};
use crate::vector::Vector2;
use super::quad::Quad;

/// What an arena slot currently holds.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Empty,
    /// Body indices. Exactly one, except for a leaf at the depth cap where
    /// coincident bodies pile up.
    Leaf { bodies: SmallVec<[usize; 1]> },
    /// Index of the first of four consecutive child slots.
    Branch { children: usize },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub quad: Quad,
    pub center_of_mass: Vector2,
    pub total_mass: f64,
    /// Slot visited after this subtree in pre-order; 0 ends the walk.
    pub next: usize,
    pub depth: u32,
}

impl Node {
    pub fn new(next: usize, quad: Quad, depth: u32) -> Self {
        Self {
            kind: NodeKind::Empty,
            quad,
            center_of_mass: Vector2::zero(),
            total_mass: 0.0,
            next,
            depth,
        }
    }

    pub(super) fn leaf(&mut self, body: usize, pos: Vector2, mass: f64) {
        self.kind = NodeKind::Leaf { bodies: smallvec![body] };
        self.center_of_mass = pos;
        self.total_mass = mass;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, NodeKind::Empty)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.kind, NodeKind::Branch { .. })
    }

    pub fn children(&self) -> Option<[usize; 4]> {
        match self.kind {
            NodeKind::Branch { children } => {
                Some([children, children + 1, children + 2, children + 3])
            }
            _ => None,
        }
    }

    pub fn bodies(&self) -> &[usize] {
        match &self.kind {
            NodeKind::Leaf { bodies } => bodies.as_slice(),
            _ => &[],
        }
    }
}
