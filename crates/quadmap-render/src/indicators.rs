use quadmap_geom::{Position, TILE_SIZE};
use quadmap_items::{EditorSprite, SpriteProvider};

use crate::color::Rgba;
use crate::surface::DrawSurface;
use crate::view::RenderView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorIndicator {
    pub pos: Position,
    pub locked: bool,
    pub south: bool,
    pub east: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HookIndicator {
    pub pos: Position,
    pub south: bool,
    pub east: bool,
}

/// Door and hook requests gathered while tiles are drawn, drawn later on
/// top of everything. Stored in map space so cached chunks can carry them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileOverlays {
    pub doors: Vec<DoorIndicator>,
    pub hooks: Vec<HookIndicator>,
}

const LOCKED: Rgba = Rgba::rgb(255, 0, 0);
const UNLOCKED: Rgba = Rgba::rgb(102, 255, 0);
const HOOK_FILL: Rgba = Rgba::new(0, 120, 215, 200);
const ICON: f32 = 12.0;
const ARROW: f32 = 10.0;
const HEAD: f32 = 4.0;
const SHAFT: f32 = 2.0;

impl TileOverlays {
    pub fn clear(&mut self) {
        self.doors.clear();
        self.hooks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty() && self.hooks.is_empty()
    }

    pub fn extend_from(&mut self, other: &TileOverlays) {
        self.doors.extend_from_slice(&other.doors);
        self.hooks.extend_from_slice(&other.hooks);
    }

    /// Doors show on the current floor only; hooks on any visible floor.
    pub fn draw(&self, surface: &mut dyn DrawSurface, sprites: &dyn SpriteProvider, view: &RenderView) {
        let half = TILE_SIZE as f32 / 2.0;
        for d in &self.doors {
            if d.pos.z != view.floor {
                continue;
            }
            let Some((x, y)) = view.tile_visible(d.pos.x, d.pos.y, d.pos.z) else {
                continue;
            };
            let (x, y) = (x as f32, y as f32);
            let mut anchors = Vec::with_capacity(2);
            if d.south {
                anchors.push((x, y + half));
            }
            if d.east {
                anchors.push((x + half, y));
            }
            if anchors.is_empty() {
                anchors.push((x + half, y + half));
            }
            let (kind, color) = if d.locked {
                (EditorSprite::DoorLocked, LOCKED)
            } else {
                (EditorSprite::DoorUnlocked, UNLOCKED)
            };
            let icon = sprites.editor_sprite(kind);
            for (cx, cy) in anchors {
                let (ix, iy) = (cx - ICON / 2.0, cy - ICON / 2.0);
                match &icon {
                    Some(region) => surface.draw_sprite(ix, iy, ICON, ICON, region, color),
                    None => surface.fill_rect(ix, iy, ICON, ICON, color),
                }
            }
        }
        for h in &self.hooks {
            let Some((x, y)) = view.tile_visible(h.pos.x, h.pos.y, h.pos.z) else {
                continue;
            };
            let (x, y) = (x as f32, y as f32);
            if h.south {
                let (cx, cy) = (x, y + half);
                surface.fill_rect(cx - SHAFT / 2.0, cy - (ARROW - HEAD), SHAFT, ARROW - HEAD, HOOK_FILL);
                surface.fill_rect(cx - HEAD / 2.0, cy - ARROW, HEAD, HEAD, HOOK_FILL);
            }
            if h.east {
                let (cx, cy) = (x + half, y);
                surface.fill_rect(cx - (ARROW - HEAD), cy - SHAFT / 2.0, ARROW - HEAD, SHAFT, HOOK_FILL);
                surface.fill_rect(cx - ARROW, cy - HEAD / 2.0, HEAD, HEAD, HOOK_FILL);
            }
        }
    }
}
