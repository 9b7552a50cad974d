//! Editor overlays drawn on top of the composed floors: grid, selection,
//! brush preview, collaborator cursors and the in-game view box.

use quadmap_geom::{GROUND_LAYER, Position, TILE_SIZE};
use quadmap_items::ItemId;
use quadmap_map::SpatialMap;

use crate::color::Rgba;
use crate::surface::DrawSurface;
use crate::tile_renderer::TileRenderer;
use crate::view::RenderView;

pub const GRID_COLOR: Rgba = Rgba::new(255, 255, 255, 128);
pub const SELECTION_FILL: Rgba = Rgba::new(255, 255, 255, 51);
pub const BRUSH_COLOR: Rgba = Rgba::new(0, 166, 0, 128);
pub const BRUSH_ALT_COLOR: Rgba = Rgba::new(0, 166, 0, 128);
pub const INVALID_COLOR: Rgba = Rgba::new(166, 0, 0, 128);
pub const VALID_COLOR: Rgba = Rgba::new(0, 166, 0, 128);
pub const GHOST_TINT: Rgba = Rgba::new(160, 160, 160, 160);
pub const CREATURE_GHOST_TINT: Rgba = Rgba::new(255, 255, 255, 160);
pub const MISSING_GHOST: Rgba = Rgba::new(128, 128, 255, 64);
const INGAME_SIDE: Rgba = Rgba::new(0, 0, 0, 200);

/// Tiles visible in the game client around the player.
pub const CLIENT_VIEW_WIDTH: i32 = 18;
pub const CLIENT_VIEW_HEIGHT: i32 = 14;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrushShape {
    #[default]
    Square,
    Circle,
}

/// What the active brush paints, with the data its preview needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrushKind {
    /// Places a specific item; previewed as a translucent sprite.
    Item { item_id: ItemId },
    /// Ground, carpets, tables and other auto-bordering brushes.
    Terrain,
    House { house_id: u32 },
    Zone { flags: u32 },
    HouseExit { house_id: u32 },
    Waypoint { name: String },
    Spawn { radius: i32 },
    Creature { look_type: u16 },
    Eraser,
}

impl BrushKind {
    fn base_color(&self) -> Rgba {
        match self {
            Self::House { .. } | Self::Zone { .. } => BRUSH_ALT_COLOR,
            Self::Spawn { .. } | Self::Eraser => INVALID_COLOR,
            _ => BRUSH_COLOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrushPreview {
    pub kind: BrushKind,
    pub shape: BrushShape,
    /// Radius in tiles; 0 covers only the tile under the cursor.
    pub size: i32,
    pub center: Position,
}

impl BrushPreview {
    /// Offsets covered by the brush footprint, row-major.
    pub fn footprint(&self) -> Vec<(i32, i32)> {
        let size = self.size.max(0);
        let shape = match self.kind {
            BrushKind::Spawn { .. } => BrushShape::Square,
            _ => self.shape,
        };
        let mut out = Vec::new();
        for dy in -size..=size {
            for dx in -size..=size {
                let inside = match shape {
                    BrushShape::Square => true,
                    BrushShape::Circle => f64::from(dx * dx + dy * dy).sqrt() < f64::from(size) + 0.005,
                };
                if inside {
                    out.push((dx, dy));
                }
            }
        }
        out
    }
}

/// Selection rectangle in logical screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionBox {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveCursor {
    pub pos: Position,
    pub color: Rgba,
}

/// UI state the overlay pass reads each frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayState {
    pub selection: Option<SelectionBox>,
    pub brush: Option<BrushPreview>,
    pub live_cursors: Vec<LiveCursor>,
}

fn can_draw(kind: &BrushKind, map: &SpatialMap, pos: Position) -> bool {
    let tile = map.tile(pos);
    match kind {
        BrushKind::HouseExit { house_id } => {
            tile.is_some_and(|t| t.ground.is_some() && (t.house_id == 0 || t.house_id != *house_id))
        }
        BrushKind::Waypoint { .. } => tile.is_some_and(|t| t.ground.is_some()),
        _ => true,
    }
}

pub fn draw_grid(surface: &mut dyn DrawSurface, view: &RenderView) {
    let b = view.floor_bounds(view.floor);
    if b.is_empty() {
        return;
    }
    let offset = view.layer_offset(view.floor);
    let ox = view.scroll_x + offset;
    let oy = view.scroll_y + offset;
    let x0 = (b.min_x * TILE_SIZE - ox) as f32;
    let x1 = ((b.max_x + 1) * TILE_SIZE - ox) as f32;
    let y0 = (b.min_y * TILE_SIZE - oy) as f32;
    let y1 = ((b.max_y + 1) * TILE_SIZE - oy) as f32;
    for y in b.min_y..=b.max_y {
        let sy = (y * TILE_SIZE - oy) as f32;
        surface.fill_rect(x0, sy, x1 - x0, 1.0, GRID_COLOR);
    }
    for x in b.min_x..=b.max_x {
        let sx = (x * TILE_SIZE - ox) as f32;
        surface.fill_rect(sx, y0, 1.0, y1 - y0, GRID_COLOR);
    }
}

pub fn draw_selection(surface: &mut dyn DrawSurface, selection: &SelectionBox) {
    let x = selection.start.0.min(selection.end.0);
    let y = selection.start.1.min(selection.end.1);
    let w = (selection.end.0 - selection.start.0).abs();
    let h = (selection.end.1 - selection.start.1).abs();
    surface.fill_rect(x, y, w, h, SELECTION_FILL);
    surface.outline_rect(x, y, w.max(1.0), h.max(1.0), Rgba::WHITE);
}

/// Collaborator cursors. Cursors on the other side of the ground layer are
/// hidden; cursors on floors above the viewed one are faded.
pub fn draw_live_cursors(surface: &mut dyn DrawSurface, view: &RenderView, cursors: &[LiveCursor]) {
    let s = TILE_SIZE as f32;
    for c in cursors {
        if c.pos.z <= GROUND_LAYER && view.floor > GROUND_LAYER {
            continue;
        }
        if c.pos.z > GROUND_LAYER && view.floor <= GROUND_LAYER + 1 {
            continue;
        }
        let mut color = c.color;
        if c.pos.z < view.floor {
            color.a = (color.a / 2).max(64);
        }
        let (x, y) = view.screen_position(c.pos.x, c.pos.y, c.pos.z);
        surface.fill_rect(x as f32, y as f32, s, s, color);
    }
}

/// Darkens everything outside the area a game client would show around
/// the viewport centre and outlines that area.
pub fn draw_ingame_box(surface: &mut dyn DrawSurface, view: &RenderView) {
    let offset = view.layer_offset(view.floor);
    let start_x = (view.scroll_x + offset).div_euclid(TILE_SIZE);
    let start_y = (view.scroll_y + offset).div_euclid(TILE_SIZE);
    let cx = start_x + (view.logical_width / (2 * TILE_SIZE) as f32) as i32 - CLIENT_VIEW_WIDTH / 2;
    let cy = start_y + (view.logical_height / (2 * TILE_SIZE) as f32) as i32 - CLIENT_VIEW_HEIGHT / 2;
    let (bx0, by0) = view.screen_position(cx, cy, view.floor);
    let (bx1, by1) = view.screen_position(cx + CLIENT_VIEW_WIDTH, cy + CLIENT_VIEW_HEIGHT, view.floor);
    let (bx0, by0, bx1, by1) = (bx0 as f32, by0 as f32, bx1 as f32, by1 as f32);
    let (w, h) = (view.logical_width, view.logical_height);

    if bx0 > 0.0 {
        surface.fill_rect(0.0, 0.0, bx0, h, INGAME_SIDE);
    }
    if bx1 < w {
        surface.fill_rect(bx1, 0.0, w - bx1, h, INGAME_SIDE);
    }
    if by0 > 0.0 {
        surface.fill_rect(bx0, 0.0, bx1 - bx0, by0, INGAME_SIDE);
    }
    if by1 < h {
        surface.fill_rect(bx0, by1, bx1 - bx0, h - by1, INGAME_SIDE);
    }
    let s = TILE_SIZE as f32;
    let red = Rgba::rgb(255, 0, 0);
    let green = Rgba::rgb(0, 255, 0);
    surface.outline_rect(bx0, by0, bx1 - bx0, by1 - by0, red);
    surface.outline_rect(bx0 + s, by0 + s, bx1 - bx0 - 2.0 * s, by1 - by0 - 2.0 * s, green);
    let px = bx0 + s + ((CLIENT_VIEW_WIDTH - 3) / 2) as f32 * s;
    let py = by0 + s + ((CLIENT_VIEW_HEIGHT - 3) / 2) as f32 * s;
    surface.outline_rect(px, py, s, s, green);
}

/// Brush footprint under the cursor. One dispatch on the brush kind picks
/// how each covered tile is previewed.
pub fn draw_brush_preview(
    surface: &mut dyn DrawSurface,
    renderer: &TileRenderer,
    view: &RenderView,
    map: &SpatialMap,
    brush: &BrushPreview,
) -> usize {
    let s = TILE_SIZE as f32;
    let base = brush.kind.base_color();
    let mut drawn = 0;
    for (dx, dy) in brush.footprint() {
        let pos = Position::new(brush.center.x + dx, brush.center.y + dy, view.floor);
        let Some((x, y)) = view.tile_visible(pos.x, pos.y, pos.z) else {
            continue;
        };
        match &brush.kind {
            BrushKind::Item { item_id } => {
                if !renderer.draw_item_ghost(surface, *item_id, pos, (x, y), GHOST_TINT) {
                    surface.outline_rect(x as f32, y as f32, s, s, MISSING_GHOST);
                }
            }
            BrushKind::Creature { look_type } => {
                if !renderer.draw_creature_ghost(surface, *look_type, (x, y), CREATURE_GHOST_TINT) {
                    surface.outline_rect(x as f32, y as f32, s, s, MISSING_GHOST);
                }
            }
            kind @ (BrushKind::HouseExit { .. } | BrushKind::Waypoint { .. }) => {
                let c = if can_draw(kind, map, pos) {
                    VALID_COLOR
                } else {
                    INVALID_COLOR
                };
                surface.fill_rect(x as f32, y as f32, s, s, c);
            }
            BrushKind::Terrain
            | BrushKind::House { .. }
            | BrushKind::Zone { .. }
            | BrushKind::Spawn { .. }
            | BrushKind::Eraser => {
                surface.fill_rect(x as f32, y as f32, s, s, base);
            }
        }
        drawn += 1;
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brush(kind: BrushKind, shape: BrushShape, size: i32) -> BrushPreview {
        BrushPreview {
            kind,
            shape,
            size,
            center: Position::new(10, 10, 7),
        }
    }

    #[test]
    fn footprints() {
        assert_eq!(brush(BrushKind::Terrain, BrushShape::Square, 0).footprint(), vec![(0, 0)]);
        assert_eq!(brush(BrushKind::Terrain, BrushShape::Square, 1).footprint().len(), 9);
        let circle = brush(BrushKind::Eraser, BrushShape::Circle, 1).footprint();
        assert_eq!(circle.len(), 5);
        assert!(!circle.contains(&(1, 1)));
        let spawn = brush(BrushKind::Spawn { radius: 3 }, BrushShape::Circle, 1).footprint();
        assert_eq!(spawn.len(), 9);
    }

    #[test]
    fn kinds_pick_their_colours() {
        assert_eq!(BrushKind::Eraser.base_color(), INVALID_COLOR);
        assert_eq!(BrushKind::House { house_id: 1 }.base_color(), BRUSH_ALT_COLOR);
        assert_eq!(BrushKind::Terrain.base_color(), BRUSH_COLOR);
    }
}
