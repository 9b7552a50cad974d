use fastnoise_lite::{FastNoiseLite, NoiseType};
use quadmap_geom::{GROUND_LAYER, MAP_MAX_LAYER, NODE_SIZE, Position};
use quadmap_map::{Creature, Item, MapFlags, SpatialMap, Spawn, Tile};

pub const GRASS: u16 = 100;
pub const SAND: u16 = 101;
pub const WATER: u16 = 102;
pub const GRASS_BORDER: u16 = 200;
pub const TREE: u16 = 300;
pub const TORCH: u16 = 400;
pub const WALL_LAMP: u16 = 401;
pub const GOLD_COIN: u16 = 500;
pub const STONE_WALL: u16 = 600;
pub const RAT: u16 = 1;

const DEMO_HOUSE: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ground {
    Water,
    Sand,
    Grass,
}

fn ground_at(height: f32) -> Ground {
    if height < -0.35 {
        Ground::Water
    } else if height < -0.2 {
        Ground::Sand
    } else {
        Ground::Grass
    }
}

/// Noise terrain on the surface floor with a walled house, its upper floor
/// and a cave patch below ground.
pub fn generate(size: i32, seed: i32) -> SpatialMap {
    let mut height = FastNoiseLite::with_seed(seed);
    height.set_noise_type(Some(NoiseType::OpenSimplex2));
    height.set_frequency(Some(0.03));
    let mut forest = FastNoiseLite::with_seed(seed.wrapping_add(1));
    forest.set_noise_type(Some(NoiseType::OpenSimplex2));
    forest.set_frequency(Some(0.09));

    let size = size.max(NODE_SIZE);
    let n = size as usize;
    let mut grounds = Vec::with_capacity(n * n);
    for y in 0..size {
        for x in 0..size {
            grounds.push(ground_at(height.get_noise_2d(x as f32, y as f32)));
        }
    }
    let at = |x: i32, y: i32| grounds[(y * size + x) as usize];

    let mut map = SpatialMap::new();
    for y in 0..size {
        for x in 0..size {
            let g = at(x, y);
            let ground = match g {
                Ground::Water => WATER,
                Ground::Sand => SAND,
                Ground::Grass => GRASS,
            };
            let mut tile =
                Tile::new(Position::new(x, y, GROUND_LAYER)).with_ground(Item::new(ground));
            if g == Ground::Grass {
                let near_sand = [(-1, 0), (1, 0), (0, -1), (0, 1)].iter().any(|(dx, dy)| {
                    let (nx, ny) = (x + dx, y + dy);
                    (0..size).contains(&nx) && (0..size).contains(&ny) && at(nx, ny) == Ground::Sand
                });
                if near_sand {
                    tile = tile.with_item(Item::new(GRASS_BORDER));
                }
                let h = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17));
                if forest.get_noise_2d(x as f32, y as f32) > 0.55 {
                    tile = tile.with_item(Item::new(TREE));
                } else if h % 97 == 0 {
                    tile = tile.with_item(Item::new(TORCH));
                } else if h % 211 == 0 {
                    let count = ((x + y) % 60 + 1) as u16;
                    tile = tile.with_item(Item::with_subtype(GOLD_COIN, count));
                }
                if h % 389 == 0 {
                    tile.creature = Some(Creature {
                        name: "rat".into(),
                        look_type: RAT,
                        ..Default::default()
                    });
                }
                if h % 503 == 0 {
                    tile.spawn = Some(Spawn {
                        radius: 3,
                        selected: false,
                    });
                }
            }
            map.set_tile(tile);
        }
    }

    place_house(&mut map, size);
    place_cave(&mut map, size);
    map
}

/// A 6x5 walled house near the map centre with a second storey.
fn place_house(map: &mut SpatialMap, size: i32) {
    let (x0, y0) = (size / 2 - 3, size / 2 - 2);
    let (x1, y1) = (x0 + 5, y0 + 4);
    for z in [GROUND_LAYER, GROUND_LAYER - 1] {
        for y in y0..=y1 {
            for x in x0..=x1 {
                let edge = x == x0 || x == x1 || y == y0 || y == y1;
                let mut tile = Tile::new(Position::new(x, y, z)).with_ground(Item::new(SAND));
                if edge {
                    tile = tile.with_item(Item::new(STONE_WALL));
                } else {
                    tile.house_id = DEMO_HOUSE;
                    tile.flags.set(MapFlags::PROTECTION_ZONE);
                }
                if z == GROUND_LAYER && y == y0 + 1 && x == x0 + 2 {
                    tile = tile.with_item(Item::new(WALL_LAMP));
                }
                map.set_tile(tile);
            }
        }
    }
    let door = Position::new(x0 + 2, y1 + 1, GROUND_LAYER);
    map.edit_location(door, |loc| loc.house_exits.push(DEMO_HOUSE));
}

/// A lit cave pocket two floors under the house.
fn place_cave(map: &mut SpatialMap, size: i32) {
    let z = (GROUND_LAYER + 2).min(MAP_MAX_LAYER);
    let (cx, cy) = (size / 4, size / 4);
    for y in cy - 4..=cy + 4 {
        for x in cx - 4..=cx + 4 {
            if (x - cx) * (x - cx) + (y - cy) * (y - cy) > 16 {
                continue;
            }
            let mut tile = Tile::new(Position::new(x, y, z)).with_ground(Item::new(SAND));
            if x == cx && y == cy {
                tile = tile.with_item(Item::new(TORCH));
            }
            map.set_tile(tile);
        }
    }
}

/// Copies the node containing (x, y) from `src` into `dst` for the floors a
/// live host would send, then marks that half loaded. Returns tiles copied.
pub fn stream_node(src: &SpatialMap, dst: &mut SpatialMap, x: i32, y: i32, underground: bool) -> usize {
    let floors = if underground {
        GROUND_LAYER + 1..=MAP_MAX_LAYER
    } else {
        0..=GROUND_LAYER
    };
    let mut copied = 0;
    if let Some(node) = src.get_leaf(x, y) {
        for z in floors {
            let Some(floor) = node.floor(z) else {
                continue;
            };
            for loc in floor.locations() {
                if loc.tile.is_none() && loc.house_exits.is_empty() {
                    continue;
                }
                let incoming = loc.clone();
                if dst
                    .edit_location(loc.position, move |slot| *slot = incoming)
                    .is_some()
                {
                    copied += usize::from(loc.tile.is_some());
                }
            }
        }
    }
    dst.mark_node_loaded(x, y, underground);
    copied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate(32, 7);
        let b = generate(32, 7);
        assert_eq!(a.tile_count(), b.tile_count());
        for y in 0..32 {
            for x in 0..32 {
                let p = Position::new(x, y, GROUND_LAYER);
                assert_eq!(a.tile(p), b.tile(p));
            }
        }
    }

    #[test]
    fn every_surface_tile_has_ground() {
        let map = generate(16, 3);
        for y in 0..16 {
            for x in 0..16 {
                let t = map.tile(Position::new(x, y, GROUND_LAYER)).expect("tile");
                assert!(t.ground.is_some());
            }
        }
    }

    #[test]
    fn house_has_an_upper_floor_and_an_exit() {
        let map = generate(32, 1);
        let centre = Position::new(16, 16, GROUND_LAYER);
        assert_eq!(map.tile(centre).expect("floor").house_id, DEMO_HOUSE);
        assert!(map.tile(Position::new(16, 16, GROUND_LAYER - 1)).is_some());
        let exit = map.location(Position::new(15, 19, GROUND_LAYER)).expect("exit");
        assert!(exit.has_house_exit(DEMO_HOUSE));
    }

    #[test]
    fn streaming_a_node_copies_only_its_half() {
        let src = generate(32, 5);
        let mut dst = SpatialMap::new_live();
        let copied = stream_node(&src, &mut dst, 8, 8, false);
        assert_eq!(copied, 16);
        let node = dst.get_leaf(8, 8).expect("node");
        assert!(node.is_visible(false));
        assert!(!node.is_visible(true));
        assert!(dst.tile(Position::new(9, 9, GROUND_LAYER)).is_some());
        assert!(dst.tile(Position::new(12, 9, GROUND_LAYER)).is_none());
    }
}
