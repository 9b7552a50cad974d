//! Map coordinates, floor constants and node-aligned tile bounds.
#![forbid(unsafe_code)]

use core::cmp::Ordering;

/// Side of one tile in pixels at zoom 1.
pub const TILE_SIZE: i32 = 32;
/// The surface floor. Floors with a larger z are underground.
pub const GROUND_LAYER: i32 = 7;
pub const MAP_MAX_LAYER: i32 = 15;
pub const MAP_LAYERS: usize = (MAP_MAX_LAYER + 1) as usize;
pub const MAP_MAX_WIDTH: i32 = 65000;
pub const MAP_MAX_HEIGHT: i32 = 65000;

/// A node covers `NODE_SIZE x NODE_SIZE` tiles on every floor.
pub const NODE_SHIFT: i32 = 2;
pub const NODE_SIZE: i32 = 1 << NODE_SHIFT;
pub const NODE_MASK: i32 = NODE_SIZE - 1;
pub const NODE_TILES: usize = (NODE_SIZE * NODE_SIZE) as usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..=MAP_MAX_WIDTH).contains(&self.x)
            && (0..=MAP_MAX_HEIGHT).contains(&self.y)
            && (0..=MAP_MAX_LAYER).contains(&self.z)
    }

    #[inline]
    pub fn node(&self) -> NodeCoord {
        NodeCoord::containing(self.x, self.y)
    }

    /// Index of this tile inside its node's floor array.
    #[inline]
    pub fn node_index(&self) -> usize {
        ((self.x & NODE_MASK) * NODE_SIZE + (self.y & NODE_MASK)) as usize
    }

    #[inline]
    pub fn is_underground(&self) -> bool {
        self.z > GROUND_LAYER
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.z
            .cmp(&other.z)
            .then(self.y.cmp(&other.y))
            .then(self.x.cmp(&other.x))
    }
}

/// Node grid coordinate (tile coordinate >> NODE_SHIFT).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeCoord {
    pub nx: i32,
    pub ny: i32,
}

impl NodeCoord {
    #[inline]
    pub const fn new(nx: i32, ny: i32) -> Self {
        Self { nx, ny }
    }

    #[inline]
    pub fn containing(x: i32, y: i32) -> Self {
        Self {
            nx: x >> NODE_SHIFT,
            ny: y >> NODE_SHIFT,
        }
    }

    /// Tile coordinate of the node's top-left corner.
    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        (self.nx << NODE_SHIFT, self.ny << NODE_SHIFT)
    }
}

/// Pixel offset applied to a floor when it is projected onto the screen.
///
/// Floors at or above ground step up-left by one tile per floor above the
/// surface; underground floors are offset relative to the viewed floor.
#[inline]
pub fn layer_offset(z: i32, current_floor: i32) -> i32 {
    if z <= GROUND_LAYER {
        (GROUND_LAYER - z) * TILE_SIZE
    } else {
        TILE_SIZE * (current_floor - z)
    }
}

/// Inclusive rectangle of tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileBounds {
    #[inline]
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grows the rectangle by `tiles` on every side.
    pub fn expanded(&self, tiles: i32) -> Self {
        Self::new(
            self.min_x - tiles,
            self.min_y - tiles,
            self.max_x + tiles,
            self.max_y + tiles,
        )
    }

    /// Clamps to the valid map area.
    pub fn clamped(&self) -> Self {
        Self::new(
            self.min_x.clamp(0, MAP_MAX_WIDTH),
            self.min_y.clamp(0, MAP_MAX_HEIGHT),
            self.max_x.clamp(0, MAP_MAX_WIDTH),
            self.max_y.clamp(0, MAP_MAX_HEIGHT),
        )
    }

    /// Snaps both corners outward onto node origins, so the rectangle covers
    /// whole nodes.
    pub fn node_aligned(&self) -> Self {
        Self::new(
            self.min_x & !NODE_MASK,
            self.min_y & !NODE_MASK,
            (self.max_x & !NODE_MASK) + NODE_MASK,
            (self.max_y & !NODE_MASK) + NODE_MASK,
        )
    }

    /// Origins of every node touched by the rectangle, row-major.
    pub fn node_origins(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let sx = self.min_x & !NODE_MASK;
        let sy = self.min_y & !NODE_MASK;
        let ex = self.max_x & !NODE_MASK;
        let ey = self.max_y & !NODE_MASK;
        let empty = self.is_empty();
        (sy..=ey)
            .step_by(NODE_SIZE as usize)
            .filter(move |_| !empty)
            .flat_map(move |y| (sx..=ex).step_by(NODE_SIZE as usize).map(move |x| (x, y)))
    }

    /// Node coordinates touched by the rectangle, row-major.
    pub fn nodes(&self) -> impl Iterator<Item = NodeCoord> + use<> {
        self.node_origins()
            .map(|(x, y)| NodeCoord::containing(x, y))
    }

    pub fn node_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let w = ((self.max_x >> NODE_SHIFT) - (self.min_x >> NODE_SHIFT) + 1) as usize;
        let h = ((self.max_y >> NODE_SHIFT) - (self.min_y >> NODE_SHIFT) + 1) as usize;
        w * h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ordering_is_z_major(a in any::<Position>(), b in any::<Position>()) {
            if a.z != b.z {
                prop_assert_eq!(a.cmp(&b), a.z.cmp(&b.z));
            } else if a.y != b.y {
                prop_assert_eq!(a.cmp(&b), a.y.cmp(&b.y));
            } else {
                prop_assert_eq!(a.cmp(&b), a.x.cmp(&b.x));
            }
        }
    }

    #[test]
    fn offsets_above_and_below_ground() {
        assert_eq!(layer_offset(7, 7), 0);
        assert_eq!(layer_offset(6, 7), TILE_SIZE);
        assert_eq!(layer_offset(0, 7), 7 * TILE_SIZE);
        assert_eq!(layer_offset(9, 8), -TILE_SIZE);
        assert_eq!(layer_offset(8, 8), 0);
    }
}
