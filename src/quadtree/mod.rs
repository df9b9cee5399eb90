pub mod node;
pub mod quad;

pub use node::{Node, NodeKind};
pub use quad::Quad;

mod quadtree;
pub use quadtree::{NodeRef, Quadtree, MAX_DEPTH};
