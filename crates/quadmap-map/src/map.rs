use hashbrown::HashMap;
use quadmap_geom::{MAP_LAYERS, NodeCoord, Position, TileBounds};

use crate::node::MapNode;
use crate::tile::{Tile, TileLocation};

/// Sparse node-indexed map. Nodes appear on first write (or on demand in
/// live sessions) and every write bumps the owning node's stamp.
#[derive(Debug)]
pub struct SpatialMap {
    nodes: HashMap<NodeCoord, MapNode>,
    stamp: u64,
    default_visible: bool,
}

impl Default for SpatialMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialMap {
    /// A locally owned map: every node is visible as soon as it exists.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            stamp: 0,
            default_visible: true,
        }
    }

    /// A map streamed from a live host: nodes start hidden until loaded.
    pub fn new_live() -> Self {
        Self {
            default_visible: false,
            ..Self::new()
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        !self.default_visible
    }

    #[inline]
    fn next_stamp(&mut self) -> u64 {
        self.stamp = self.stamp.wrapping_add(1).max(1);
        self.stamp
    }

    pub fn current_stamp(&self) -> u64 {
        self.stamp
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn get_leaf(&self, x: i32, y: i32) -> Option<&MapNode> {
        self.nodes.get(&NodeCoord::containing(x, y))
    }

    #[inline]
    pub fn get_leaf_mut(&mut self, x: i32, y: i32) -> Option<&mut MapNode> {
        self.nodes.get_mut(&NodeCoord::containing(x, y))
    }

    pub fn create_leaf(&mut self, x: i32, y: i32) -> &mut MapNode {
        let coord = NodeCoord::containing(x, y);
        let visible = self.default_visible;
        self.nodes
            .entry(coord)
            .or_insert_with(|| MapNode::new(coord, visible))
    }

    /// Calls `f` for every existing node intersecting `bounds`, row-major.
    pub fn visit_leaves(&self, bounds: &TileBounds, mut f: impl FnMut(&MapNode)) {
        if bounds.is_empty() || self.nodes.is_empty() {
            return;
        }
        if bounds.node_count() <= self.nodes.len() {
            for coord in bounds.nodes() {
                if let Some(node) = self.nodes.get(&coord) {
                    f(node);
                }
            }
        } else {
            let lo = NodeCoord::containing(bounds.min_x, bounds.min_y);
            let hi = NodeCoord::containing(bounds.max_x, bounds.max_y);
            let mut hits: Vec<&MapNode> = self
                .nodes
                .values()
                .filter(|n| {
                    let c = n.coord();
                    c.nx >= lo.nx && c.nx <= hi.nx && c.ny >= lo.ny && c.ny <= hi.ny
                })
                .collect();
            hits.sort_by_key(|n| (n.coord().ny, n.coord().nx));
            for node in hits {
                f(node);
            }
        }
    }

    pub fn location(&self, pos: Position) -> Option<&TileLocation> {
        self.get_leaf(pos.x, pos.y)?.location(pos)
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.location(pos)?.tile()
    }

    /// Runs `f` on the location at `pos`, creating node and floor as needed,
    /// then stamps the node. Returns `None` for out-of-range positions.
    pub fn edit_location<R>(
        &mut self,
        pos: Position,
        f: impl FnOnce(&mut TileLocation) -> R,
    ) -> Option<R> {
        if !pos.is_valid() {
            return None;
        }
        let stamp = self.next_stamp();
        let node = self.create_leaf(pos.x, pos.y);
        let loc = node.floor_mut(pos.z)?.location_mut(pos)?;
        let out = f(loc);
        if let Some(tile) = loc.tile.as_mut() {
            tile.modified = true;
            tile.last_modified = stamp;
        }
        node.touch(stamp);
        Some(out)
    }

    /// Places `tile` at its own position, replacing whatever was there.
    pub fn set_tile(&mut self, tile: Tile) -> Option<Tile> {
        let pos = tile.position;
        self.edit_location(pos, move |loc| loc.tile.replace(tile))
            .flatten()
    }

    pub fn remove_tile(&mut self, pos: Position) -> Option<Tile> {
        self.get_leaf(pos.x, pos.y)?.location(pos)?.tile.as_ref()?;
        self.edit_location(pos, |loc| loc.tile.take()).flatten()
    }

    pub fn with_tile_mut<R>(&mut self, pos: Position, f: impl FnOnce(&mut Tile) -> R) -> Option<R> {
        self.tile(pos)?;
        self.edit_location(pos, |loc| loc.tile.as_mut().map(f)).flatten()
    }

    /// Records that a live host delivered the contents of a node half.
    pub fn mark_node_loaded(&mut self, x: i32, y: i32, underground: bool) {
        let stamp = self.next_stamp();
        let node = self.create_leaf(x, y);
        node.set_visible(underground, true);
        node.set_requested(underground, false);
        node.touch(stamp);
    }

    pub fn tile_count(&self) -> usize {
        self.nodes
            .values()
            .map(|n| {
                (0..MAP_LAYERS as i32)
                    .filter_map(|z| n.floor(z))
                    .map(|f| f.tile_count())
                    .sum::<usize>()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Item;

    #[test]
    fn stamps_are_monotonic_and_nonzero() {
        let mut map = SpatialMap::new();
        map.stamp = u64::MAX;
        let s = map.next_stamp();
        assert_eq!(s, 1);
        assert_eq!(map.next_stamp(), 2);
    }

    #[test]
    fn edits_mark_tiles_modified() {
        let mut map = SpatialMap::new();
        let pos = Position::new(10, 10, 7);
        map.set_tile(Tile::new(pos).with_ground(Item::new(100)));
        let tile = map.tile(pos).expect("tile");
        assert!(tile.modified);
        assert_eq!(tile.last_modified, map.current_stamp());
        assert_eq!(map.get_leaf(10, 10).map(|n| n.last_modified()), Some(map.current_stamp()));
    }

    #[test]
    fn invalid_positions_are_ignored() {
        let mut map = SpatialMap::new();
        assert!(map.set_tile(Tile::new(Position::new(-1, 0, 7))).is_none());
        assert!(map.edit_location(Position::new(0, 0, 16), |_| ()).is_none());
        assert_eq!(map.node_count(), 0);
    }
}
