use crate::body::Body;
use crate::vector::Vector2;

/// Relative padding added on each side of the body bounding box.
pub const RELATIVE_PAD: f64 = 0.1;
/// Absolute padding floor; keeps the root quad non-degenerate when all
/// bodies coincide.
pub const MIN_PAD: f64 = 1.0;

/// Axis-aligned square covering `center ± size / 2` on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub center: Vector2,
    pub size: f64,
}

impl Quad {
    pub fn new(center: Vector2, size: f64) -> Self {
        Self { center, size }
    }

    /// Smallest centered square around `bodies`, padded by the larger of 10%
    /// of the extent and 1.0 on every side.
    pub fn new_containing(bodies: &[Body]) -> Self {
        if bodies.is_empty() {
            return Self { center: Vector2::zero(), size: 1.0 };
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for body in bodies {
            min_x = min_x.min(body.pos.x);
            min_y = min_y.min(body.pos.y);
            max_x = max_x.max(body.pos.x);
            max_y = max_y.max(body.pos.y);
        }

        let center = Vector2::new(min_x + max_x, min_y + max_y) * 0.5;
        let extent = (max_x - min_x).max(max_y - min_y);
        let pad = (extent * RELATIVE_PAD).max(MIN_PAD);

        Self { center, size: extent + 2.0 * pad }
    }

    /// Quadrant index of `pos`: bit 0 set when east of center, bit 1 set when
    /// north of center. A coordinate equal to the center counts as west/south.
    /// 0 = SW, 1 = SE, 2 = NW, 3 = NE.
    pub fn quadrant_of(&self, pos: Vector2) -> usize {
        let east = (pos.x > self.center.x) as usize;
        let north = (pos.y > self.center.y) as usize;
        (north << 1) | east
    }

    pub fn into_quadrant(mut self, quadrant: usize) -> Self {
        self.size *= 0.5;
        self.center.x += ((quadrant & 1) as f64 - 0.5) * self.size;
        self.center.y += ((quadrant >> 1) as f64 - 0.5) * self.size;
        self
    }

    pub fn subdivide(&self) -> [Quad; 4] {
        [0, 1, 2, 3].map(|i| self.into_quadrant(i))
    }

    pub fn min(&self) -> Vector2 {
        self.center - Vector2::broadcast(self.size * 0.5)
    }

    pub fn max(&self) -> Vector2 {
        self.center + Vector2::broadcast(self.size * 0.5)
    }

    /// Closed-interval containment on both axes.
    pub fn contains(&self, pos: Vector2) -> bool {
        let (min, max) = (self.min(), self.max());
        pos.x >= min.x && pos.x <= max.x && pos.y >= min.y && pos.y <= max.y
    }
}
