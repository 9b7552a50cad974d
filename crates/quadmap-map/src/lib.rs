//! Sparse, node-indexed tile map shared by the editor and the renderer.
#![forbid(unsafe_code)]

pub mod map;
pub mod node;
pub mod tile;

pub use map::SpatialMap;
pub use node::{Floor, MapNode};
pub use tile::{Creature, Direction, Item, ItemId, MapFlags, Spawn, Tile, TileLocation};
