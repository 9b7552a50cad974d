use quadmap_items::ItemTypes;
use quadmap_map::Tile;

use crate::color::Rgba;
use crate::options::DrawingOptions;

const HIGHLIGHT_FACTORS: [u32; 5] = [192, 154, 123, 102, 84];
/// 0.7^n in 8.8 fixed point, n = 1..=9.
const SPAWN_FACTORS: [u32; 9] = [179, 125, 88, 61, 43, 30, 21, 15, 10];

#[inline]
fn scale(c: u8, f: u32) -> u8 {
    ((u32::from(c) * f) >> 8) as u8
}

pub fn is_blocking(tile: &Tile, items: &dyn ItemTypes) -> bool {
    tile.ground
        .iter()
        .chain(tile.items.iter())
        .any(|i| items.item_type(i.id).is_some_and(|t| t.is_blocking()))
}

/// Stable per-house colour, never too dark.
pub fn house_color(house_id: u32) -> Rgba {
    let mut h = house_id;
    h = ((h >> 16) ^ h).wrapping_mul(0x45d9f3b);
    h = ((h >> 16) ^ h).wrapping_mul(0x45d9f3b);
    h = (h >> 16) ^ h;
    let (mut r, mut g, mut b) = ((h & 0xff) as u8, ((h >> 8) & 0xff) as u8, ((h >> 16) & 0xff) as u8);
    if r < 50 && g < 50 && b < 50 {
        r += 100;
        g += 100;
        b += 100;
    }
    Rgba::rgb(r, g, b)
}

/// Minimap colour of the topmost item that has one, else of the ground.
pub fn minimap_color(tile: &Tile, items: &dyn ItemTypes) -> Rgba {
    let c = tile
        .items
        .iter()
        .rev()
        .chain(tile.ground.iter())
        .filter_map(|i| items.item_type(i.id))
        .map(|t| t.minimap_color)
        .find(|c| *c != 0)
        .unwrap_or(0);
    Rgba::from_8bit(c)
}

/// Editor tint for a tile's ground and borders.
pub fn tile_color(
    tile: &Tile,
    items: &dyn ItemTypes,
    options: &DrawingOptions,
    current_house_id: u32,
    spawn_count: u16,
) -> Rgba {
    let (mut r, mut g, mut b) = (255u8, 255u8, 255u8);
    if !options.has_color_modifications() {
        return Rgba::WHITE;
    }
    let show_special = options.only_colors || options.show_special_tiles;

    if options.show_blocking && !tile.is_empty() && is_blocking(tile, items) {
        g = scale(g, 171);
        b = scale(b, 171);
    }

    if options.highlight_items {
        let top_is_border = tile
            .items
            .last()
            .and_then(|i| items.item_type(i.id))
            .is_some_and(|t| t.is_border());
        let n = tile.items.len();
        if n > 0 && !top_is_border {
            let f = HIGHLIGHT_FACTORS[n.min(5) - 1];
            g = scale(g, f);
            r = scale(r, f);
        }
    }

    if options.show_spawns && spawn_count > 0 {
        let f = SPAWN_FACTORS
            .get(usize::from(spawn_count) - 1)
            .copied()
            .unwrap_or(10);
        g = scale(g, f);
        b = scale(b, f);
    }

    if options.show_houses && tile.is_house_tile() {
        let hc = house_color(tile.house_id);
        let tint = |c: u8, h: u8| ((u32::from(c) * u32::from(h) + u32::from(c)) >> 8) as u8;
        r = tint(r, hc.r);
        g = tint(g, hc.g);
        b = tint(b, hc.b);
        if tile.house_id == current_house_id && options.highlight_pulse > 0.0 {
            let boost = options.highlight_pulse.min(1.0) * 0.6;
            let lift = |c: u8| (f32::from(c) + f32::from(255 - c) * boost).min(255.0) as u8;
            r = lift(r);
            g = lift(g);
            b = lift(b);
        }
    } else if show_special && tile.flags.is_pz() {
        r >>= 1;
        b >>= 1;
    }

    if show_special && tile.flags.is_pvp_zone() {
        g = r >> 2;
        b = scale(b, 171);
    }
    if show_special && tile.flags.is_no_logout() {
        b >>= 1;
    }
    if show_special && tile.flags.is_no_pvp() {
        g >>= 1;
    }
    Rgba::rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadmap_geom::Position;
    use quadmap_items::ItemDatabase;
    use quadmap_map::{Item, MapFlags};

    fn plain() -> Tile {
        Tile::new(Position::new(1, 1, 7)).with_ground(Item::new(1))
    }

    #[test]
    fn untouched_tile_is_white() {
        let db = ItemDatabase::new();
        assert_eq!(tile_color(&plain(), &db, &DrawingOptions::default(), 0, 0), Rgba::WHITE);
    }

    #[test]
    fn protection_zone_halves_red_and_blue() {
        let db = ItemDatabase::new();
        let mut t = plain();
        t.flags.set(MapFlags::PROTECTION_ZONE);
        assert_eq!(
            tile_color(&t, &db, &DrawingOptions::default(), 0, 0),
            Rgba::rgb(127, 255, 127)
        );
    }

    #[test]
    fn spawn_fades_green_and_blue() {
        let db = ItemDatabase::new();
        let c = tile_color(&plain(), &db, &DrawingOptions::default(), 0, 1);
        assert_eq!(c, Rgba::rgb(255, 178, 178));
        let many = tile_color(&plain(), &db, &DrawingOptions::default(), 0, 40);
        assert_eq!(many, Rgba::rgb(255, 9, 9));
    }

    #[test]
    fn house_colour_is_stable_and_bright_enough() {
        for id in 1..500 {
            let c = house_color(id);
            assert_eq!(c, house_color(id));
            assert!(c.r >= 50 || c.g >= 50 || c.b >= 50);
        }
    }
}
