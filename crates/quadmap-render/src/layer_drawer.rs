//! Direct (uncached) drawing of one floor, in local or live mode.

use quadmap_geom::{NODE_SIZE, TILE_SIZE};
use quadmap_map::{MapNode, SpatialMap};

use crate::color::Rgba;
use crate::live::{LiveClient, is_underground_floor, request_node};
use crate::tile_renderer::{DrawContext, TileRenderer, TileTargets};
use crate::tooltip::TooltipCollector;

/// Fill drawn over a node whose contents have not arrived yet.
pub const LOADING_PLACEHOLDER: Rgba = Rgba::new(255, 0, 255, 128);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerDrawStats {
    pub nodes: usize,
    pub tiles: usize,
    pub placeholders: usize,
    pub requests: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MapLayerDrawer;

impl MapLayerDrawer {
    pub fn new() -> Self {
        Self
    }

    /// Draws floor `z`. With a live client, unloaded nodes get a placeholder
    /// and a one-time fetch request instead of tiles.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        targets: &mut TileTargets<'_>,
        renderer: &TileRenderer,
        ctx: &DrawContext<'_>,
        map: &SpatialMap,
        z: i32,
        live: Option<&dyn LiveClient>,
        mut tooltips: Option<&mut TooltipCollector>,
    ) -> LayerDrawStats {
        let mut stats = LayerDrawStats::default();
        let bounds = ctx.view.floor_bounds(z).node_aligned();
        if bounds.is_empty() {
            return stats;
        }
        let mut draw_node = |targets: &mut TileTargets<'_>, node: &MapNode, stats: &mut LayerDrawStats| {
            stats.nodes += 1;
            let Some(floor) = node.floor(z) else {
                return;
            };
            for loc in floor.locations() {
                if renderer.draw_tile(targets, ctx, loc, None).drawn {
                    stats.tiles += 1;
                    if let Some(tips) = tooltips.as_deref_mut() {
                        renderer.capture_tooltips(loc, ctx.view, ctx.options, tips);
                    }
                }
            }
        };

        match live {
            None => map.visit_leaves(&bounds, |node| draw_node(targets, node, &mut stats)),
            Some(client) => {
                let underground = is_underground_floor(z);
                for (x, y) in bounds.node_origins() {
                    let node = map.get_leaf(x, y);
                    if let Some(node) = node.filter(|n| n.is_visible(underground)) {
                        draw_node(targets, node, &mut stats);
                        continue;
                    }
                    let (sx, sy) = ctx.view.screen_position(x, y, z);
                    let side = NODE_SIZE * TILE_SIZE;
                    if ctx.view.is_rect_visible(sx, sy, side, side, 0) {
                        let c = LOADING_PLACEHOLDER.scale_alpha(ctx.alpha);
                        targets
                            .surface
                            .fill_rect(sx as f32, sy as f32, side as f32, side as f32, c);
                        stats.placeholders += 1;
                    }
                    match node {
                        Some(node) => {
                            if request_node(node, underground, client) {
                                stats.requests += 1;
                            }
                        }
                        None => {
                            log::trace!(target: "live", "no leaf at ({x}, {y}); prepare_live_nodes not run")
                        }
                    }
                }
            }
        }
        stats
    }
}
