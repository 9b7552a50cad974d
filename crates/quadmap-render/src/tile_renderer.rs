//! Turns one tile location into sprite draws, light entries and overlay
//! requests.

use std::sync::Arc;

use quadmap_geom::{Position, TILE_SIZE};
use quadmap_items::{
    BorderAlignment, EditorSprite, ItemId, ItemType, ItemTypes, SpriteMeta, SpritePatterns,
    SpriteProvider,
};
use quadmap_map::{Creature, Direction, Item, Tile, TileLocation};

use crate::color::Rgba;
use crate::indicators::{DoorIndicator, HookIndicator, TileOverlays};
use crate::light::LightSink;
use crate::markers::{MarkerFlags, draw_markers};
use crate::options::DrawingOptions;
use crate::pattern::{TileHooks, apply_subtype, resolve_patterns};
use crate::surface::DrawSurface;
use crate::tile_color::{minimap_color, tile_color};
use crate::tooltip::TooltipCollector;
use crate::view::{RenderView, ZOOM_DETAIL_LIMIT};

/// Animation preview only runs when zoomed in this far.
pub const ANIMATION_ZOOM_LIMIT: f32 = 2.0;

/// Everything a tile draw reads besides the tile itself.
#[derive(Clone, Copy, Debug)]
pub struct DrawContext<'a> {
    pub view: &'a RenderView,
    pub options: &'a DrawingOptions,
    pub current_house_id: u32,
    pub clock_ms: u64,
    /// Extra alpha multiplier for the whole draw (translucent upper floors).
    pub alpha: u8,
}

impl<'a> DrawContext<'a> {
    pub fn new(view: &'a RenderView, options: &'a DrawingOptions) -> Self {
        Self {
            view,
            options,
            current_house_id: 0,
            clock_ms: 0,
            alpha: 255,
        }
    }

    #[inline]
    pub fn animating(&self) -> bool {
        self.options.show_preview && self.view.zoom <= ANIMATION_ZOOM_LIMIT
    }

    #[inline]
    fn clock(&self) -> Option<u64> {
        self.animating().then_some(self.clock_ms)
    }
}

/// Output sinks for a tile draw. Lights and overlays are optional so
/// callers that only want sprites can skip them.
pub struct TileTargets<'a> {
    pub surface: &'a mut dyn DrawSurface,
    pub lights: Option<&'a mut dyn LightSink>,
    pub overlays: Option<&'a mut TileOverlays>,
}

impl<'a> TileTargets<'a> {
    pub fn sprites_only(surface: &'a mut dyn DrawSurface) -> Self {
        Self {
            surface,
            lights: None,
            overlays: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileDrawOutcome {
    /// The tile existed, passed filters and culling.
    pub drawn: bool,
    /// Something on the tile animates or pulses and must be redrawn every
    /// frame.
    pub dynamic: bool,
}

pub struct TileRenderer {
    items: Arc<dyn ItemTypes>,
    sprites: Arc<dyn SpriteProvider>,
}

fn tile_hooks(tile: &Tile, items: &dyn ItemTypes) -> TileHooks {
    let mut hooks = TileHooks::default();
    for t in tile.items.iter().filter_map(|i| items.item_type(i.id)) {
        hooks.south |= t.hook_south();
        hooks.east |= t.hook_east();
    }
    hooks
}

fn house_item_tint(tile: &Tile, options: &DrawingOptions, current_house_id: u32) -> Rgba {
    let mut c = Rgba::WHITE;
    if options.extended_house_shader && options.show_houses && tile.is_house_tile() {
        if tile.house_id == current_house_id {
            c.r /= 2;
        } else {
            c.r /= 2;
            c.g /= 2;
        }
    }
    c
}

impl TileRenderer {
    pub fn new(items: Arc<dyn ItemTypes>, sprites: Arc<dyn SpriteProvider>) -> Self {
        Self { items, sprites }
    }

    #[inline]
    pub fn items(&self) -> &dyn ItemTypes {
        self.items.as_ref()
    }

    #[inline]
    pub fn sprites(&self) -> &dyn SpriteProvider {
        self.sprites.as_ref()
    }

    /// Draws one location. With `explicit` the given coordinates are used
    /// verbatim and culling is skipped; otherwise the view positions and
    /// culls the tile.
    pub fn draw_tile(
        &self,
        targets: &mut TileTargets<'_>,
        ctx: &DrawContext<'_>,
        location: &TileLocation,
        explicit: Option<(i32, i32)>,
    ) -> TileDrawOutcome {
        let mut out = TileDrawOutcome::default();
        let Some(tile) = location.tile() else {
            return out;
        };
        let options = ctx.options;
        if options.only_modified && !tile.modified {
            return out;
        }
        let pos = location.position;
        let (draw_x, draw_y) = match explicit {
            Some(xy) => xy,
            None => match ctx.view.tile_visible(pos.x, pos.y, pos.z) {
                Some(xy) => xy,
                None => return out,
            },
        };
        out.drawn = true;

        let items = self.items.as_ref();
        let as_minimap = options.as_minimap;
        let only_colors = as_minimap || options.only_colors;
        let color = if as_minimap {
            Rgba::WHITE
        } else {
            tile_color(tile, items, options, ctx.current_house_id, location.spawn_count)
        };
        let tinted = color != Rgba::WHITE;
        if !as_minimap
            && options.show_houses
            && options.highlight_pulse > 0.0
            && tile.is_house_tile()
            && tile.house_id == ctx.current_house_id
        {
            // pulse tint changes every frame
            out.dynamic = true;
        }
        let hooks = tile_hooks(tile, items);
        let mut cursor = (draw_x, draw_y);
        let s = TILE_SIZE as f32;

        if only_colors {
            if as_minimap {
                let c = minimap_color(tile, items).scale_alpha(ctx.alpha);
                targets.surface.fill_rect(draw_x as f32, draw_y as f32, s, s, c);
            } else if tinted {
                let c = color.with_alpha(128).scale_alpha(ctx.alpha);
                targets.surface.fill_rect(draw_x as f32, draw_y as f32, s, s, c);
            }
        } else if let Some(ground) = &tile.ground {
            self.draw_item(targets, ctx, tile, ground, hooks, color, &mut cursor, &mut out);
        } else if options.always_show_zones && tinted {
            if let Some(region) = self.sprites.editor_sprite(EditorSprite::Zone) {
                let c = color.with_alpha(60).scale_alpha(ctx.alpha);
                targets
                    .surface
                    .draw_sprite(draw_x as f32, draw_y as f32, s, s, &region, c);
            }
        }

        let items_shown = ctx.view.zoom < ZOOM_DETAIL_LIMIT || !options.hide_items_when_zoomed;
        if !only_colors {
            if items_shown {
                let house_tint = house_item_tint(tile, options, ctx.current_house_id);
                for item in &tile.items {
                    let border = items.item_type(item.id).is_some_and(|t| t.is_border());
                    let tint = if border { color } else { house_tint };
                    self.draw_item(targets, ctx, tile, item, hooks, tint, &mut cursor, &mut out);
                }
                if let Some(creature) = &tile.creature {
                    if options.show_creatures {
                        self.draw_creature(targets.surface, ctx, creature, cursor);
                    }
                }
            }
            if ctx.view.zoom < ZOOM_DETAIL_LIMIT {
                let flags = MarkerFlags::from_location(location, ctx.current_house_id);
                if flags.any() {
                    draw_markers(
                        targets.surface,
                        self.sprites.as_ref(),
                        draw_x,
                        draw_y,
                        &flags,
                        options,
                    );
                }
            }
        }

        if options.should_draw_lights() {
            if let Some(sink) = targets.lights.as_deref_mut() {
                self.add_lights(sink, tile, items_shown);
            }
        }
        out
    }

    fn add_lights(&self, sink: &mut dyn LightSink, tile: &Tile, items_shown: bool) {
        let p = tile.position;
        let items = self.items.as_ref();
        if let Some(t) = tile.ground.as_ref().and_then(|g| items.item_type(g.id)) {
            if t.has_light() {
                sink.add_light(p.x, p.y, p.z, t.light);
            }
        }
        if !items_shown {
            return;
        }
        for t in tile.items.iter().filter_map(|i| items.item_type(i.id)) {
            if t.has_light() {
                sink.add_light(p.x, p.y, p.z, t.light);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_item(
        &self,
        targets: &mut TileTargets<'_>,
        ctx: &DrawContext<'_>,
        tile: &Tile,
        item: &Item,
        hooks: TileHooks,
        tint: Rgba,
        cursor: &mut (i32, i32),
        out: &mut TileDrawOutcome,
    ) {
        let Some(it) = self.items.item_type(item.id) else {
            return;
        };
        let options = ctx.options;
        let pos = tile.position;

        if !options.ingame && options.highlight_locked_doors && it.is_door() {
            if let Some(overlays) = targets.overlays.as_deref_mut() {
                let (south, east) = match it.border_alignment {
                    BorderAlignment::Horizontal => (true, false),
                    BorderAlignment::Vertical => (false, true),
                    BorderAlignment::None => (false, false),
                };
                overlays.doors.push(DoorIndicator {
                    pos,
                    locked: item.locked,
                    south,
                    east,
                });
            }
        }

        let mut tint = tint;
        if !options.ingame && item.selected {
            tint = tint.halved_rgb();
        }
        let s = TILE_SIZE as f32;
        if it.is_meta() {
            if options.show_tech_items && !options.ingame {
                let a = ((255u32 * 171) >> 8) as u8;
                let c = Rgba::new(tint.r, 0, 0, a).scale_alpha(ctx.alpha);
                targets
                    .surface
                    .fill_rect(cursor.0 as f32, cursor.1 as f32, s, s, c);
            }
            return;
        }
        if it.sprite_id == 0 || (it.is_pickupable() && !options.show_items) {
            return;
        }
        let Some(spr) = self.sprites.sprite(it.sprite_id) else {
            return;
        };

        let screen_x = cursor.0 - spr.draw_offset_x;
        let screen_y = cursor.1 - spr.draw_offset_y;
        cursor.0 -= spr.draw_height;
        cursor.1 -= spr.draw_height;

        let clock = ctx.clock();
        if clock.is_some() && spr.is_animated() {
            out.dynamic = true;
        }
        let patterns = apply_subtype(
            resolve_patterns(Some(spr), it, item.subtype, hooks, pos, clock),
            spr,
        );

        let multi = spr.width > 1 || spr.height > 1;
        let mut alpha = tint.a;
        if options.transparent_items
            && (!it.is_ground() || multi)
            && !it.is_splash()
            && (!it.is_border() || multi)
        {
            alpha /= 2;
        }
        let tint = tint.with_alpha(alpha).scale_alpha(ctx.alpha);
        self.blit_cells(targets.surface, spr, &patterns, screen_x, screen_y, tint, u32::from(spr.layers));

        if !options.ingame && options.show_hooks && (it.hook_south() || it.hook_east()) {
            if let Some(overlays) = targets.overlays.as_deref_mut() {
                overlays.hooks.push(HookIndicator {
                    pos,
                    south: it.hook_south(),
                    east: it.hook_east(),
                });
            }
        }

        if !options.ingame && options.show_light_strength {
            self.draw_light_strength(targets.surface, it, *cursor);
        }
    }

    /// Every covered cell and layer, each cell one tile further up-left.
    #[allow(clippy::too_many_arguments)]
    fn blit_cells(
        &self,
        surface: &mut dyn DrawSurface,
        spr: &SpriteMeta,
        patterns: &SpritePatterns,
        screen_x: i32,
        screen_y: i32,
        tint: Rgba,
        layers: u32,
    ) {
        let s = TILE_SIZE as f32;
        for cx in 0..u32::from(spr.width.max(1)) {
            for cy in 0..u32::from(spr.height.max(1)) {
                for layer in 0..layers.max(1) {
                    let Some(image) = spr.image_at(cx, cy, layer, patterns) else {
                        continue;
                    };
                    let Some(region) = self.sprites.region(image) else {
                        surface.report_missing_sprite(image);
                        continue;
                    };
                    let x = screen_x - cx as i32 * TILE_SIZE;
                    let y = screen_y - cy as i32 * TILE_SIZE;
                    surface.draw_sprite(x as f32, y as f32, s, s, &region, tint);
                }
            }
        }
    }

    fn draw_light_strength(&self, surface: &mut dyn DrawSurface, it: &ItemType, at: (i32, i32)) {
        if !it.has_light() {
            return;
        }
        let c = Rgba::from_8bit(it.light.color);
        let start = (TILE_SIZE - i32::from(it.light.intensity)).max(16);
        let size = (TILE_SIZE - start) as f32;
        let (x, y) = ((at.0 + start) as f32, (at.1 + start) as f32);
        surface.fill_rect(x - 2.0, y - 2.0, size + 2.0, size + 2.0, Rgba::BLACK);
        surface.fill_rect(x - 1.0, y - 1.0, size, size, c);
    }

    fn draw_creature(
        &self,
        surface: &mut dyn DrawSurface,
        ctx: &DrawContext<'_>,
        creature: &Creature,
        at: (i32, i32),
    ) {
        let Some(spr) = self.sprites.creature_sprite(creature.look_type) else {
            return;
        };
        let patterns = SpritePatterns {
            x: creature.direction.pattern() % u32::from(spr.pattern_x.max(1)),
            ..SpritePatterns::default()
        };
        let mut tint = Rgba::WHITE;
        if creature.selected {
            tint = tint.halved_rgb();
        }
        let tint = tint.scale_alpha(ctx.alpha);
        // Outfit layer 1 is the colour mask; only the base layer is drawn.
        self.blit_cells(
            surface,
            spr,
            &patterns,
            at.0 - spr.draw_offset_x,
            at.1 - spr.draw_offset_y,
            tint,
            1,
        );
    }

    /// Translucent preview of an item type at a screen position, as brushes
    /// show it under the cursor. False when the type has nothing to draw.
    pub fn draw_item_ghost(
        &self,
        surface: &mut dyn DrawSurface,
        item_id: ItemId,
        pos: Position,
        at: (i32, i32),
        tint: Rgba,
    ) -> bool {
        let Some(it) = self.items.item_type(item_id) else {
            return false;
        };
        let Some(spr) = self.sprites.sprite(it.sprite_id) else {
            return false;
        };
        let patterns = apply_subtype(
            resolve_patterns(Some(spr), it, 1, TileHooks::default(), pos, None),
            spr,
        );
        self.blit_cells(
            surface,
            spr,
            &patterns,
            at.0 - spr.draw_offset_x,
            at.1 - spr.draw_offset_y,
            tint,
            u32::from(spr.layers),
        );
        true
    }

    /// Creature outfit facing south, used by the creature brush preview.
    pub fn draw_creature_ghost(
        &self,
        surface: &mut dyn DrawSurface,
        look_type: u16,
        at: (i32, i32),
        tint: Rgba,
    ) -> bool {
        let Some(spr) = self.sprites.creature_sprite(look_type) else {
            return false;
        };
        let patterns = SpritePatterns {
            x: Direction::South.pattern() % u32::from(spr.pattern_x.max(1)),
            ..SpritePatterns::default()
        };
        self.blit_cells(
            surface,
            spr,
            &patterns,
            at.0 - spr.draw_offset_x,
            at.1 - spr.draw_offset_y,
            tint,
            1,
        );
        true
    }

    /// Collects item tooltips for tiles on the current floor.
    pub fn capture_tooltips(
        &self,
        location: &TileLocation,
        view: &RenderView,
        options: &DrawingOptions,
        tooltips: &mut TooltipCollector,
    ) {
        if !options.show_tooltips || location.position.z != view.floor {
            return;
        }
        if let Some(tile) = location.tile() {
            tooltips.capture(tile, self.items.as_ref());
        }
    }
}
