use quadmap_geom::TILE_SIZE;
use quadmap_items::{EditorSprite, SpriteProvider};
use quadmap_map::TileLocation;

use crate::color::Rgba;
use crate::options::DrawingOptions;
use crate::surface::DrawSurface;

/// Editor markers a location carries, resolved against the current house.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarkerFlags {
    pub has_waypoint: bool,
    pub is_house_exit: bool,
    pub has_house_exit_match: bool,
    pub is_town_exit: bool,
    pub has_spawn: bool,
    pub is_spawn_selected: bool,
}

impl MarkerFlags {
    pub fn from_location(loc: &TileLocation, current_house_id: u32) -> Self {
        let spawn = loc.tile().and_then(|t| t.spawn);
        Self {
            has_waypoint: loc.waypoint_count > 0,
            is_house_exit: loc.is_house_exit(),
            has_house_exit_match: current_house_id != 0 && loc.has_house_exit(current_house_id),
            is_town_exit: loc.town_exit,
            has_spawn: spawn.is_some(),
            is_spawn_selected: spawn.is_some_and(|s| s.selected),
        }
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.has_waypoint || self.is_house_exit || self.is_town_exit || self.has_spawn
    }
}

pub const WAYPOINT_TINT: Rgba = Rgba::rgb(64, 64, 255);
pub const HOUSE_EXIT_MATCH_TINT: Rgba = Rgba::rgb(64, 255, 255);
pub const HOUSE_EXIT_TINT: Rgba = Rgba::rgb(64, 64, 255);
pub const TOWN_TEMPLE_TINT: Rgba = Rgba::new(255, 255, 64, 170);
pub const SPAWN_SELECTED_TINT: Rgba = Rgba::rgb(128, 128, 128);

/// Draws the marker sprites for one tile, in waypoint, house exit, temple,
/// spawn order. Returns how many were drawn.
pub fn draw_markers(
    surface: &mut dyn DrawSurface,
    sprites: &dyn SpriteProvider,
    x: i32,
    y: i32,
    flags: &MarkerFlags,
    options: &DrawingOptions,
) -> usize {
    let mut drawn = 0;
    let mut blit = |kind: EditorSprite, tint: Rgba| {
        if let Some(region) = sprites.editor_sprite(kind) {
            let s = TILE_SIZE as f32;
            surface.draw_sprite(x as f32, y as f32, s, s, &region, tint);
            drawn += 1;
        }
    };
    if !options.ingame && flags.has_waypoint && options.show_waypoints {
        blit(EditorSprite::Waypoint, WAYPOINT_TINT);
    }
    if flags.is_house_exit && options.show_houses {
        let tint = if flags.has_house_exit_match {
            HOUSE_EXIT_MATCH_TINT
        } else {
            HOUSE_EXIT_TINT
        };
        blit(EditorSprite::HouseExit, tint);
    }
    if options.show_towns && flags.is_town_exit {
        blit(EditorSprite::TownTemple, TOWN_TEMPLE_TINT);
    }
    if flags.has_spawn && options.show_spawns {
        let tint = if flags.is_spawn_selected {
            SPAWN_SELECTED_TINT
        } else {
            Rgba::WHITE
        };
        blit(EditorSprite::Spawn, tint);
    }
    drawn
}
