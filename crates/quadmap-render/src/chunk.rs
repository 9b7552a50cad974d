//! Cached per-(node, floor) geometry and the work orders that rebuild it.

use std::sync::Arc;

use quadmap_geom::{GROUND_LAYER, NODE_SHIFT, NodeCoord, TILE_SIZE};
use quadmap_map::Floor;

use crate::indicators::TileOverlays;
use crate::light::LightCollector;
use crate::options::DrawingOptions;
use crate::surface::{DrawSurface, SpriteCollector, SpriteInstance};
use crate::tile_renderer::{DrawContext, TileRenderer, TileTargets};
use crate::view::RenderView;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub nx: i32,
    pub ny: i32,
    pub z: i32,
}

impl ChunkKey {
    #[inline]
    pub const fn new(nx: i32, ny: i32, z: i32) -> Self {
        Self { nx, ny, z }
    }

    #[inline]
    pub fn from_node(node: NodeCoord, z: i32) -> Self {
        Self::new(node.nx, node.ny, z)
    }

    /// Tile coordinate of the chunk's top-left corner.
    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        (self.nx << NODE_SHIFT, self.ny << NODE_SHIFT)
    }

    #[inline]
    pub fn is_underground(&self) -> bool {
        self.z > GROUND_LAYER
    }
}

/// Geometry and side data captured from one chunk build. Positions are in
/// world pixels (tile * 32) with no scroll or floor offset applied.
#[derive(Clone, Debug, Default)]
pub struct ChunkData {
    pub instances: Vec<SpriteInstance>,
    pub lights: LightCollector,
    pub overlays: TileOverlays,
    pub tiles: usize,
    pub dynamic: bool,
    pub missing: Vec<u32>,
}

/// Builds the geometry for one floor of one node. Pure: reads only the
/// snapshot and context, touches no render-thread state.
pub fn build_chunk_data(floor: Option<&Floor>, renderer: &TileRenderer, ctx: &DrawContext<'_>) -> ChunkData {
    let Some(floor) = floor else {
        return ChunkData::default();
    };
    let mut sprites = SpriteCollector::new(renderer.sprites().white_pixel());
    let mut lights = LightCollector::new();
    let mut overlays = TileOverlays::default();
    let mut tiles = 0;
    let mut dynamic = false;
    {
        let mut targets = TileTargets {
            surface: &mut sprites,
            lights: Some(&mut lights),
            overlays: Some(&mut overlays),
        };
        for loc in floor.locations() {
            let p = loc.position;
            let explicit = (p.x * TILE_SIZE, p.y * TILE_SIZE);
            let out = renderer.draw_tile(&mut targets, ctx, loc, Some(explicit));
            tiles += usize::from(out.drawn);
            dynamic |= out.dynamic;
        }
    }
    if sprites.dropped_fills() > 0 {
        log::debug!(
            target: "chunks",
            "{} flat fills dropped: atlas has no white pixel",
            sprites.dropped_fills()
        );
    }
    let missing = sprites.missing().to_vec();
    ChunkData {
        instances: sprites.into_instances(),
        lights,
        overlays,
        tiles,
        dynamic,
        missing,
    }
}

/// Render-thread side of a chunk: its current geometry plus the node stamp
/// the geometry was built from.
#[derive(Clone, Debug)]
pub struct RenderChunk {
    key: ChunkKey,
    data: ChunkData,
    last_rendered: Option<u64>,
    pending: Option<u64>,
    missing_unreported: bool,
}

impl RenderChunk {
    pub fn new(key: ChunkKey) -> Self {
        Self {
            key,
            data: ChunkData::default(),
            last_rendered: None,
            pending: None,
            missing_unreported: false,
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    #[inline]
    pub fn data(&self) -> &ChunkData {
        &self.data
    }

    #[inline]
    pub fn last_rendered(&self) -> Option<u64> {
        self.last_rendered
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.last_rendered.is_some()
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.data.dynamic
    }

    /// Needs a rebuild: never built, built from another node stamp, or
    /// holding animated content.
    #[inline]
    pub fn is_stale(&self, node_stamp: u64) -> bool {
        self.data.dynamic || self.last_rendered != Some(node_stamp)
    }

    /// Stamp of the build currently queued for this chunk, if any.
    #[inline]
    pub fn pending(&self) -> Option<u64> {
        self.pending
    }

    pub fn mark_pending(&mut self, stamp: u64) {
        self.pending = Some(stamp);
    }

    /// Forgets a queued build that will never report back.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Hands the missing images of the current build to `surface`, once per
    /// build.
    pub fn report_missing(&mut self, surface: &mut dyn DrawSurface) -> usize {
        if !std::mem::take(&mut self.missing_unreported) {
            return 0;
        }
        for &image in &self.data.missing {
            surface.report_missing_sprite(image);
        }
        self.data.missing.len()
    }

    /// Synchronous rebuild on the calling thread.
    pub fn rebuild(
        &mut self,
        floor: Option<&Floor>,
        renderer: &TileRenderer,
        ctx: &DrawContext<'_>,
        stamp: u64,
    ) {
        let data = build_chunk_data(floor, renderer, ctx);
        self.apply(data, stamp);
    }

    /// Installs built geometry unless a newer build is already present.
    /// Returns whether it was applied.
    pub fn apply(&mut self, data: ChunkData, stamp: u64) -> bool {
        if self.pending.is_some_and(|p| p <= stamp) {
            self.pending = None;
        }
        if self.last_rendered.is_some_and(|prev| stamp < prev) {
            return false;
        }
        self.missing_unreported = !data.missing.is_empty();
        self.data = data;
        self.last_rendered = Some(stamp);
        true
    }

    /// Submits the cached geometry translated into screen space.
    pub fn submit(&self, surface: &mut dyn DrawSurface, view: &RenderView) {
        if self.data.instances.is_empty() {
            return;
        }
        let offset = view.layer_offset(self.key.z);
        let dx = -(view.scroll_x + offset) as f32;
        let dy = -(view.scroll_y + offset) as f32;
        surface.submit_instances(&self.data.instances, dx, dy);
    }
}

/// Work order for a background build. Owns everything it reads.
#[derive(Clone)]
pub struct ChunkBuildJob {
    pub key: ChunkKey,
    pub floor: Option<Arc<Floor>>,
    pub stamp: u64,
    /// Cache generation the job was issued under; results from an older
    /// generation are dropped.
    pub generation: u64,
    pub view: RenderView,
    pub options: Arc<DrawingOptions>,
    pub current_house_id: u32,
    pub clock_ms: u64,
    pub renderer: Arc<TileRenderer>,
}

impl ChunkBuildJob {
    pub fn run(self) -> ChunkBuildResult {
        let ctx = DrawContext {
            view: &self.view,
            options: &self.options,
            current_house_id: self.current_house_id,
            clock_ms: self.clock_ms,
            alpha: 255,
        };
        let data = build_chunk_data(self.floor.as_deref(), &self.renderer, &ctx);
        ChunkBuildResult {
            key: self.key,
            stamp: self.stamp,
            generation: self.generation,
            data,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChunkBuildResult {
    pub key: ChunkKey,
    pub stamp: u64,
    pub generation: u64,
    pub data: ChunkData,
}

/// Anything that can run chunk builds off the render thread.
pub trait RebuildQueue {
    /// Enqueues without blocking. False if the queue no longer accepts work.
    fn submit(&self, job: ChunkBuildJob) -> bool;
    /// Drains every finished result without blocking.
    fn poll(&self) -> Vec<ChunkBuildResult>;
    /// False once the queue has shut down. Builds it accepted earlier may
    /// never come back.
    fn is_open(&self) -> bool {
        true
    }
}
