//! Whole-frame composition: floors back to front, lighting, overlays.

use std::sync::Arc;

use quadmap_items::AtlasRegion;
use quadmap_map::SpatialMap;

use crate::chunk::RebuildQueue;
use crate::chunk_manager::{ChunkFrameStats, ChunkManager};
use crate::color::Rgba;
use crate::indicators::TileOverlays;
use crate::layer_drawer::{LayerDrawStats, MapLayerDrawer};
use crate::light::LightBuffer;
use crate::light_map::{LightMap, LightMapGenerator};
use crate::live::LiveClient;
use crate::options::DrawingOptions;
use crate::overlay::{self, OverlayState};
use crate::surface::{DrawSurface, SpriteInstance};
use crate::tile_renderer::{DrawContext, TileRenderer, TileTargets};
use crate::tooltip::TooltipCollector;
use crate::view::{Camera, RenderView};

pub const SHADE_COLOR: Rgba = Rgba::new(0, 0, 0, 128);
/// Alpha of the floor above the viewed one when drawn see-through.
pub const TRANSPARENT_FLOOR_ALPHA: u8 = 96;

/// Per-frame inputs owned by the editor.
///
/// In a live session the caller runs `prepare_live_nodes` on the map before
/// building this, so every node in view exists and can track its request.
pub struct FrameInput<'a> {
    pub map: &'a SpatialMap,
    pub camera: &'a Camera,
    pub options: &'a DrawingOptions,
    pub current_house_id: u32,
    pub clock_ms: u64,
    pub live: Option<&'a dyn LiveClient>,
    pub overlay: &'a OverlayState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub floors: usize,
    pub tiles: usize,
    pub chunks_visible: usize,
    pub chunks_hit: usize,
    pub chunks_rebuilt: usize,
    pub jobs_submitted: usize,
    pub results_applied: usize,
    pub results_discarded: usize,
    pub placeholders: usize,
    pub live_requests: usize,
    pub lights: usize,
    pub sprites: usize,
    pub fills: usize,
    pub pruned: usize,
}

impl FrameStats {
    fn add_chunks(&mut self, c: &ChunkFrameStats) {
        self.chunks_visible += c.visible;
        self.chunks_hit += c.hits;
        self.chunks_rebuilt += c.rebuilt;
        self.jobs_submitted += c.submitted;
        self.tiles += c.tiles;
    }

    fn add_layer(&mut self, l: &LayerDrawStats) {
        self.tiles += l.tiles;
        self.placeholders += l.placeholders;
        self.live_requests += l.requests;
    }
}

/// Forwards to the real surface while counting what went through.
struct CountingSurface<'a> {
    inner: &'a mut dyn DrawSurface,
    sprites: usize,
    fills: usize,
}

impl DrawSurface for CountingSurface<'_> {
    fn draw_sprite(&mut self, x: f32, y: f32, w: f32, h: f32, region: &AtlasRegion, tint: Rgba) {
        self.sprites += 1;
        self.inner.draw_sprite(x, y, w, h, region, tint);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.fills += 1;
        self.inner.fill_rect(x, y, w, h, color);
    }

    fn outline_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.fills += 1;
        self.inner.outline_rect(x, y, w, h, color);
    }

    fn submit_instances(&mut self, instances: &[SpriteInstance], dx: f32, dy: f32) {
        self.sprites += instances.len();
        self.inner.submit_instances(instances, dx, dy);
    }

    fn report_missing_sprite(&mut self, image_id: u32) {
        self.inner.report_missing_sprite(image_id);
    }
}

pub struct MapDrawer {
    renderer: Arc<TileRenderer>,
    chunks: ChunkManager,
    layers: MapLayerDrawer,
    lights: LightBuffer,
    light_maps: LightMapGenerator,
    overlays: TileOverlays,
    tooltips: TooltipCollector,
    view: Option<RenderView>,
    frame: u64,
}

impl MapDrawer {
    pub fn new(renderer: Arc<TileRenderer>, max_age_frames: u64, light_texel_size: u32) -> Self {
        Self {
            chunks: ChunkManager::new(Arc::clone(&renderer), max_age_frames),
            renderer,
            layers: MapLayerDrawer::new(),
            lights: LightBuffer::new(),
            light_maps: LightMapGenerator::new(light_texel_size),
            overlays: TileOverlays::default(),
            tooltips: TooltipCollector::default(),
            view: None,
            frame: 0,
        }
    }

    pub fn renderer(&self) -> &Arc<TileRenderer> {
        &self.renderer
    }

    pub fn chunks(&self) -> &ChunkManager {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut ChunkManager {
        &mut self.chunks
    }

    pub fn lights(&self) -> &LightBuffer {
        &self.lights
    }

    pub fn light_map(&self) -> &LightMap {
        self.light_maps.last()
    }

    pub fn light_maps_mut(&mut self) -> &mut LightMapGenerator {
        &mut self.light_maps
    }

    pub fn tooltips(&self) -> &TooltipCollector {
        &self.tooltips
    }

    pub fn overlays(&self) -> &TileOverlays {
        &self.overlays
    }

    /// View of the most recent frame.
    pub fn view(&self) -> Option<&RenderView> {
        self.view.as_ref()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Draws one frame. `jobs` enables background chunk rebuilds; without
    /// it stale chunks are rebuilt inline.
    pub fn draw_frame(
        &mut self,
        surface: &mut dyn DrawSurface,
        input: &FrameInput<'_>,
        jobs: Option<&dyn RebuildQueue>,
    ) -> FrameStats {
        self.frame = self.frame.wrapping_add(1);
        let options = input.options;
        let view = RenderView::setup(input.camera, options);
        self.view = Some(view);
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        self.lights.clear();
        self.overlays.clear();
        self.tooltips.clear();

        let mut out = CountingSurface {
            inner: surface,
            sprites: 0,
            fills: 0,
        };
        let cached = options.use_chunk_cache && input.live.is_none();
        if cached {
            self.chunks
                .begin_frame(self.frame, options, input.current_house_id, &view, jobs);
        }
        let ctx = DrawContext {
            view: &view,
            options,
            current_house_id: input.current_house_id,
            clock_ms: input.clock_ms,
            alpha: 255,
        };
        let renderer = Arc::clone(&self.renderer);

        for z in view.floors() {
            if z == view.floor && view.start_z != view.end_z && options.show_shade {
                out.fill_rect(0.0, 0.0, view.logical_width, view.logical_height, SHADE_COLOR);
            }
            stats.floors += 1;
            if cached {
                let c = self.chunks.draw_floor(
                    &mut out,
                    &mut self.lights,
                    &mut self.overlays,
                    input.map,
                    &view,
                    z,
                    input.current_house_id,
                    input.clock_ms,
                    jobs,
                );
                stats.add_chunks(&c);
                if z == view.floor && options.show_tooltips {
                    self.capture_tooltips(input.map, &view, options);
                }
            } else {
                let tooltips = (z == view.floor).then_some(&mut self.tooltips);
                let mut targets = TileTargets {
                    surface: &mut out,
                    lights: Some(&mut self.lights),
                    overlays: Some(&mut self.overlays),
                };
                let l = self
                    .layers
                    .draw(&mut targets, &renderer, &ctx, input.map, z, input.live, tooltips);
                stats.add_layer(&l);
            }
        }
        if cached {
            let c = self.chunks.frame_stats();
            stats.results_applied = c.applied;
            stats.results_discarded = c.discarded;
        }

        if options.transparent_floors && view.floor != 0 && view.floor != 8 {
            let upper = DrawContext {
                alpha: TRANSPARENT_FLOOR_ALPHA,
                ..ctx
            };
            let mut targets = TileTargets::sprites_only(&mut out);
            self.layers
                .draw(&mut targets, &renderer, &upper, input.map, view.floor - 1, None, None);
        }

        if options.should_draw_lights() {
            self.light_maps.generate(&view, self.lights.lights(), options);
        }
        stats.lights = self.lights.len();

        if !options.ingame {
            self.overlays.draw(&mut out, renderer.sprites(), &view);
            if options.show_grid {
                overlay::draw_grid(&mut out, &view);
            }
            if let Some(selection) = &input.overlay.selection {
                overlay::draw_selection(&mut out, selection);
            }
            if let Some(brush) = &input.overlay.brush {
                overlay::draw_brush_preview(&mut out, &renderer, &view, input.map, brush);
            }
            if input.live.is_some() {
                overlay::draw_live_cursors(&mut out, &view, &input.overlay.live_cursors);
            }
        }
        if options.show_ingame_box {
            overlay::draw_ingame_box(&mut out, &view);
        }

        if cached {
            stats.pruned = self.chunks.end_frame();
        }
        stats.sprites = out.sprites;
        stats.fills = out.fills;
        stats
    }

    fn capture_tooltips(&mut self, map: &SpatialMap, view: &RenderView, options: &DrawingOptions) {
        let bounds = view.floor_bounds(view.floor).node_aligned();
        let renderer = &self.renderer;
        let tooltips = &mut self.tooltips;
        map.visit_leaves(&bounds, |node| {
            let Some(floor) = node.floor(view.floor) else {
                return;
            };
            for loc in floor.locations() {
                if view.is_tile_visible(loc.position.x, loc.position.y, loc.position.z) {
                    renderer.capture_tooltips(loc, view, options, tooltips);
                }
            }
        });
    }
}
