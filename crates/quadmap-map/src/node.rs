use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use quadmap_geom::{MAP_LAYERS, NODE_SIZE, NODE_TILES, NodeCoord, Position};

use crate::tile::TileLocation;

/// The 4x4 block of locations one node holds on one floor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Floor {
    locations: Vec<TileLocation>,
}

impl Floor {
    pub fn new(node: NodeCoord, z: i32) -> Self {
        let (ox, oy) = node.origin();
        let mut locations = Vec::with_capacity(NODE_TILES);
        for lx in 0..NODE_SIZE {
            for ly in 0..NODE_SIZE {
                locations.push(TileLocation::new(Position::new(ox + lx, oy + ly, z)));
            }
        }
        Self { locations }
    }

    #[inline]
    pub fn locations(&self) -> &[TileLocation] {
        &self.locations
    }

    #[inline]
    pub fn location(&self, pos: Position) -> Option<&TileLocation> {
        self.locations.get(pos.node_index())
    }

    #[inline]
    pub fn location_mut(&mut self, pos: Position) -> Option<&mut TileLocation> {
        self.locations.get_mut(pos.node_index())
    }

    pub fn tile_count(&self) -> usize {
        self.locations.iter().filter(|l| l.tile.is_some()).count()
    }
}

/// A lazily created cell of the spatial index.
///
/// Floors are shared behind `Arc` and cloned on write, so a snapshot taken by
/// a background build stays consistent while the editor keeps mutating.
#[derive(Debug)]
pub struct MapNode {
    coord: NodeCoord,
    floors: [Option<Arc<Floor>>; MAP_LAYERS],
    last_modified: AtomicU64,
    visible: [AtomicBool; 2],
    requested: [AtomicBool; 2],
}

#[inline]
fn half(underground: bool) -> usize {
    usize::from(underground)
}

impl MapNode {
    pub fn new(coord: NodeCoord, visible: bool) -> Self {
        Self {
            coord,
            floors: Default::default(),
            last_modified: AtomicU64::new(0),
            visible: [AtomicBool::new(visible), AtomicBool::new(visible)],
            requested: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    #[inline]
    pub fn coord(&self) -> NodeCoord {
        self.coord
    }

    #[inline]
    pub fn floor(&self, z: i32) -> Option<&Floor> {
        self.floors.get(z as usize)?.as_deref()
    }

    /// O(1) snapshot for handing a floor to another thread.
    #[inline]
    pub fn floor_snapshot(&self, z: i32) -> Option<Arc<Floor>> {
        self.floors.get(z as usize)?.clone()
    }

    /// Mutable access, creating the floor if needed. Clones the floor when a
    /// snapshot of it is still alive.
    pub fn floor_mut(&mut self, z: i32) -> Option<&mut Floor> {
        let coord = self.coord;
        let slot = self.floors.get_mut(z as usize)?;
        let arc = slot.get_or_insert_with(|| Arc::new(Floor::new(coord, z)));
        Some(Arc::make_mut(arc))
    }

    pub fn location(&self, pos: Position) -> Option<&TileLocation> {
        self.floor(pos.z)?.location(pos)
    }

    #[inline]
    pub fn last_modified(&self) -> u64 {
        self.last_modified.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn touch(&self, stamp: u64) {
        self.last_modified.store(stamp, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_visible(&self, underground: bool) -> bool {
        self.visible[half(underground)].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_visible(&self, underground: bool, visible: bool) {
        self.visible[half(underground)].store(visible, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_requested(&self, underground: bool) -> bool {
        self.requested[half(underground)].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_requested(&self, underground: bool, requested: bool) {
        self.requested[half(underground)].store(requested, Ordering::Relaxed);
    }

    /// Marks the half as requested; true only for the caller that flipped it.
    #[inline]
    pub fn try_request(&self, underground: bool) -> bool {
        self.requested[half(underground)]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}
