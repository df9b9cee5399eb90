use super::node::{Node, NodeKind};
use super::quad::Quad;
use crate::body::Body;
use crate::profile_scope;
use crate::vector::Vector2;

/// Subdivision stops at this depth; further bodies routed to a leaf this
/// deep are aggregated into it instead.
pub const MAX_DEPTH: u32 = 40;

/// Barnes-Hut quadtree stored as a flat arena of nodes.
///
/// The tree is rebuilt from scratch every step. `clear` drops the nodes but
/// keeps the arena's capacity, so steady-state rebuilds do not allocate.
/// A branch's four children always occupy consecutive slots, and every node
/// records the slot that follows its subtree in pre-order (`next`), which
/// lets queries walk the tree without a stack.
pub struct Quadtree {
    pub t_sq: f64,
    pub e_sq: f64,
    nodes: Vec<Node>,
}

/// Copyable summary of a slot's contents, read before mutating the arena.
#[derive(Clone, Copy)]
enum Occupant {
    Vacant,
    Body(usize),
    Children(usize),
}

impl Quadtree {
    pub const ROOT: usize = 0;

    pub fn new(theta: f64, epsilon: f64) -> Self {
        Self {
            t_sq: theta * theta,
            e_sq: epsilon * epsilon,
            nodes: Vec::new(),
        }
    }

    pub fn theta(&self) -> f64 {
        self.t_sq.sqrt()
    }

    pub fn epsilon(&self) -> f64 {
        self.e_sq.sqrt()
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.t_sq = theta * theta;
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.e_sq = epsilon * epsilon;
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Rebuild the tree for `bodies`: root quad from their bounding box, then
    /// every body inserted in order.
    pub fn build(&mut self, bodies: &[Body]) {
        profile_scope!("quadtree_build");
        self.clear();
        if bodies.is_empty() {
            return;
        }

        self.nodes.reserve(2 * bodies.len() + 1);
        self.nodes.push(Node::new(0, Quad::new_containing(bodies), 0));
        for index in 0..bodies.len() {
            self.insert(bodies, index);
        }

        #[cfg(feature = "debug_quadtree")]
        println!(
            "Quadtree::build: {} bodies, {} nodes, depth {}",
            bodies.len(),
            self.nodes.len(),
            self.depth()
        );
    }

    /// Insert `bodies[index]`. The root quad must already contain its
    /// position; an empty tree gets a root sized for this body alone.
    pub fn insert(&mut self, bodies: &[Body], index: usize) {
        if self.nodes.is_empty() {
            let quad = Quad::new_containing(&bodies[index..=index]);
            self.nodes.push(Node::new(0, quad, 0));
        }
        self.insert_at(Self::ROOT, bodies, index);
    }

    fn occupant(&self, node: usize) -> Occupant {
        match &self.nodes[node].kind {
            NodeKind::Empty => Occupant::Vacant,
            NodeKind::Leaf { bodies } => Occupant::Body(bodies[0]),
            NodeKind::Branch { children } => Occupant::Children(*children),
        }
    }

    fn insert_at(&mut self, node: usize, bodies: &[Body], index: usize) {
        let body = &bodies[index];
        match self.occupant(node) {
            Occupant::Vacant => {
                self.nodes[node].leaf(index, body.pos, body.mass);
            }
            Occupant::Body(_) if self.nodes[node].depth >= MAX_DEPTH => {
                let n = &mut self.nodes[node];
                if let NodeKind::Leaf { bodies } = &mut n.kind {
                    bodies.push(index);
                }
                let mass = n.total_mass + body.mass;
                n.center_of_mass = (n.center_of_mass * n.total_mass + body.pos * body.mass) / mass;
                n.total_mass = mass;
            }
            Occupant::Body(existing) => {
                let children = self.subdivide(node);
                let quad = self.nodes[node].quad;
                self.insert_at(children + quad.quadrant_of(bodies[existing].pos), bodies, existing);
                self.insert_at(children + quad.quadrant_of(body.pos), bodies, index);
                self.aggregate(node);
            }
            Occupant::Children(children) => {
                let quadrant = self.nodes[node].quad.quadrant_of(body.pos);
                self.insert_at(children + quadrant, bodies, index);
                self.aggregate(node);
            }
        }
    }

    /// Turn `node` into a branch with four empty children appended to the
    /// arena. Returns the first child's slot.
    fn subdivide(&mut self, node: usize) -> usize {
        let children = self.nodes.len();
        let parent = &self.nodes[node];
        let depth = parent.depth + 1;
        let nexts = [children + 1, children + 2, children + 3, parent.next];
        let quads = parent.quad.subdivide();
        for i in 0..4 {
            self.nodes.push(Node::new(nexts[i], quads[i], depth));
        }
        self.nodes[node].kind = NodeKind::Branch { children };
        children
    }

    /// Recompute a branch's mass and center of mass from its children.
    fn aggregate(&mut self, node: usize) {
        let NodeKind::Branch { children } = self.nodes[node].kind else {
            return;
        };
        let mut mass = 0.0;
        let mut weighted = Vector2::zero();
        for child in &self.nodes[children..children + 4] {
            if child.total_mass > 0.0 {
                mass += child.total_mass;
                weighted += child.center_of_mass * child.total_mass;
            }
        }
        let n = &mut self.nodes[node];
        n.total_mass = mass;
        n.center_of_mass = if mass > 0.0 { weighted / mass } else { n.quad.center };
    }

    /// Approximate gravitational acceleration at `pos` (G = 1).
    ///
    /// Leaves are always taken as point masses; a branch is taken whole when
    /// `size² < θ² · d²`, otherwise its children are visited. Contributions
    /// use Plummer softening, `d · m / (d² + ε²)^1.5`, and a node whose center
    /// of mass sits on `pos` contributes nothing, which removes the self-term.
    pub fn acceleration_at(&self, pos: Vector2) -> Vector2 {
        self.walk(pos).0
    }

    /// Number of nodes the acceleration query at `pos` touches.
    pub fn nodes_visited(&self, pos: Vector2) -> usize {
        self.walk(pos).1
    }

    fn walk(&self, pos: Vector2) -> (Vector2, usize) {
        let mut acc = Vector2::zero();
        let mut visited = 0;
        if self.nodes.is_empty() {
            return (acc, visited);
        }

        let mut node = Self::ROOT;
        loop {
            visited += 1;
            let n = &self.nodes[node];
            let descend_into = match n.kind {
                NodeKind::Empty => None,
                NodeKind::Leaf { .. } => {
                    acc += self.point_mass(n, pos);
                    None
                }
                NodeKind::Branch { children } => {
                    let d_sq = (n.center_of_mass - pos).mag_sq();
                    if n.quad.size * n.quad.size < self.t_sq * d_sq {
                        acc += self.point_mass(n, pos);
                        None
                    } else {
                        Some(children)
                    }
                }
            };

            if let Some(children) = descend_into {
                node = children;
                continue;
            }
            if n.next == 0 {
                break;
            }
            node = n.next;
        }

        (acc, visited)
    }

    pub fn acceleration(&self, body: &Body) -> Vector2 {
        self.acceleration_at(body.pos)
    }

    fn point_mass(&self, node: &Node, pos: Vector2) -> Vector2 {
        let d = node.center_of_mass - pos;
        let d_sq = d.mag_sq();
        if d_sq <= f64::EPSILON {
            return Vector2::zero();
        }
        let soft = d_sq + self.e_sq;
        d * (node.total_mass / (soft * soft.sqrt()))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of the deepest node, 0 for a root-only or empty tree.
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.node(Self::ROOT)
    }

    pub fn node(&self, index: usize) -> Option<NodeRef<'_>> {
        (index < self.nodes.len()).then_some(NodeRef { tree: self, index })
    }
}

/// Borrowed view of one node, for recursive traversal by a renderer.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Quadtree,
    index: usize,
}

impl<'a> NodeRef<'a> {
    fn get(&self) -> &'a Node {
        let tree = self.tree;
        &tree.nodes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn quad(&self) -> Quad {
        self.get().quad
    }

    pub fn center_of_mass(&self) -> Vector2 {
        self.get().center_of_mass
    }

    pub fn total_mass(&self) -> f64 {
        self.get().total_mass
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.get().is_leaf()
    }

    pub fn is_branch(&self) -> bool {
        self.get().is_branch()
    }

    /// Indices of the bodies held by a leaf; empty otherwise.
    pub fn bodies(&self) -> &'a [usize] {
        self.get().bodies()
    }

    pub fn children(&self) -> Option<[NodeRef<'a>; 4]> {
        let tree = self.tree;
        self.get()
            .children()
            .map(|c| c.map(|index| NodeRef { tree, index }))
    }
}
