use crate::body::Body;
use crate::vector::Vector2;
use std::collections::HashMap;

/// Uniform grid over the plane, keyed by integer cell coordinates so it needs
/// no fixed domain. Used as the collision broad phase for large body counts.
pub struct SpatialHash {
    pub cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>, // indices of bodies per cell
}

impl SpatialHash {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(f64::MIN_POSITIVE),
            cells: HashMap::new(),
        }
    }

    /// Change the cell size. Existing buckets are keyed by the old size, so
    /// they are dropped when the size actually changes.
    pub fn set_cell_size(&mut self, cell_size: f64) {
        let cell_size = cell_size.max(f64::MIN_POSITIVE);
        if cell_size != self.cell_size {
            self.cells.clear();
            self.cell_size = cell_size;
        }
    }

    /// Re-bucket all bodies. Cells still occupied keep their allocations;
    /// cells left empty are removed so the map tracks only occupied space.
    pub fn rebuild(&mut self, bodies: &[Body]) {
        self.cells.values_mut().for_each(Vec::clear);
        for (i, b) in bodies.iter().enumerate() {
            let key = self.coord(b.pos);
            self.cells.entry(key).or_default().push(i);
        }
        self.cells.retain(|_, indices| !indices.is_empty());
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn coord(&self, pos: Vector2) -> (i64, i64) {
        (
            (pos.x / self.cell_size).floor() as i64,
            (pos.y / self.cell_size).floor() as i64,
        )
    }

    pub fn cell(&self, key: (i64, i64)) -> &[usize] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices stored in the 3×3 block of cells around body `i`, excluding `i`.
    pub fn neighbors(&self, bodies: &[Body], i: usize) -> Vec<usize> {
        let (cx, cy) = self.coord(bodies[i].pos);
        let mut neighbors = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                neighbors.extend(self.cell((cx + dx, cy + dy)).iter().filter(|&&j| j != i));
            }
        }
        neighbors
    }

    /// Unordered pairs `(i, j)`, `i < j`, from the same or adjacent cells whose
    /// discs overlap. Each pair appears once; the list is sorted.
    pub fn overlapping_pairs(&self, bodies: &[Body]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..bodies.len() {
            for j in self.neighbors(bodies, i) {
                if j > i && overlapping(&bodies[i], &bodies[j]) {
                    pairs.push((i, j));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}

/// Strict overlap test: `|pB - pA| < rA + rB`.
pub fn overlapping(a: &Body, b: &Body) -> bool {
    let r = a.radius + b.radius;
    (b.pos - a.pos).mag_sq() < r * r
}
