//! Per-frame driver of the chunk cache: staleness checks, rebuild
//! scheduling, result application and submission.

use std::sync::Arc;

use quadmap_map::SpatialMap;

use crate::chunk::{ChunkBuildJob, ChunkKey, RebuildQueue};
use crate::chunk_cache::{ChunkCache, ChunkCacheStats};
use crate::indicators::TileOverlays;
use crate::light::LightBuffer;
use crate::options::DrawingOptions;
use crate::surface::DrawSurface;
use crate::tile_renderer::{ANIMATION_ZOOM_LIMIT, DrawContext, TileRenderer};
use crate::view::{RenderView, ZOOM_DETAIL_LIMIT};

/// Frames a chunk may go untouched before it is pruned.
pub const DEFAULT_MAX_AGE_FRAMES: u64 = 600;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkFrameStats {
    pub visible: usize,
    pub hits: usize,
    pub rebuilt: usize,
    pub submitted: usize,
    pub applied: usize,
    pub discarded: usize,
    pub tiles: usize,
    pub missing: usize,
}

impl ChunkFrameStats {
    fn add(&mut self, o: &ChunkFrameStats) {
        self.visible += o.visible;
        self.hits += o.hits;
        self.rebuilt += o.rebuilt;
        self.submitted += o.submitted;
        self.applied += o.applied;
        self.discarded += o.discarded;
        self.tiles += o.tiles;
        self.missing += o.missing;
    }
}

/// Everything cached geometry depends on besides the node contents.
#[derive(Clone, Debug, PartialEq)]
struct Fingerprint {
    options: DrawingOptions,
    current_house_id: u32,
    detail_zoom: bool,
    animating: bool,
}

impl Fingerprint {
    fn of(options: &DrawingOptions, house: u32, view: &RenderView) -> Self {
        Self {
            options: DrawingOptions {
                highlight_pulse: 0.0,
                ..options.clone()
            },
            current_house_id: house,
            detail_zoom: view.zoom < ZOOM_DETAIL_LIMIT,
            animating: options.show_preview && view.zoom <= ANIMATION_ZOOM_LIMIT,
        }
    }
}

pub struct ChunkManager {
    cache: ChunkCache,
    renderer: Arc<TileRenderer>,
    options: Arc<DrawingOptions>,
    fingerprint: Option<Fingerprint>,
    generation: u64,
    frame: u64,
    max_age: u64,
    stats: ChunkFrameStats,
}

impl ChunkManager {
    pub fn new(renderer: Arc<TileRenderer>, max_age: u64) -> Self {
        Self {
            cache: ChunkCache::new(),
            renderer,
            options: Arc::new(DrawingOptions::default()),
            fingerprint: None,
            generation: 0,
            frame: 0,
            max_age,
            stats: ChunkFrameStats::default(),
        }
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> ChunkCacheStats {
        self.cache.stats()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_max_age(&mut self, max_age: u64) {
        self.max_age = max_age;
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Starts a frame: clears the cache when the drawing state changed, then
    /// applies every finished build.
    pub fn begin_frame(
        &mut self,
        frame: u64,
        options: &DrawingOptions,
        current_house_id: u32,
        view: &RenderView,
        jobs: Option<&dyn RebuildQueue>,
    ) {
        self.frame = frame;
        self.stats = ChunkFrameStats::default();
        let fp = Fingerprint::of(options, current_house_id, view);
        if self.fingerprint.as_ref() != Some(&fp) {
            if !self.cache.is_empty() {
                log::debug!(
                    target: "chunks",
                    "drawing state changed; dropping {} cached chunks",
                    self.cache.len()
                );
            }
            self.clear();
            self.fingerprint = Some(fp);
        }
        if *self.options != *options {
            self.options = Arc::new(options.clone());
        }
        if let Some(jobs) = jobs {
            self.apply_results(jobs);
        }
    }

    fn apply_results(&mut self, jobs: &dyn RebuildQueue) {
        for result in jobs.poll() {
            if result.generation != self.generation {
                self.stats.discarded += 1;
                continue;
            }
            let Some(chunk) = self.cache.peek_mut(result.key) else {
                self.stats.discarded += 1;
                continue;
            };
            if chunk.apply(result.data, result.stamp) {
                self.stats.applied += 1;
            } else {
                log::trace!(target: "chunks", "older build for {:?} discarded", result.key);
                self.stats.discarded += 1;
            }
        }
    }

    /// Draws floor `z` from cached chunks, rebuilding stale ones. Geometry
    /// and lights of built chunks are submitted even while a newer build is
    /// outstanding.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_floor(
        &mut self,
        surface: &mut dyn DrawSurface,
        lights: &mut LightBuffer,
        overlays: &mut TileOverlays,
        map: &SpatialMap,
        view: &RenderView,
        z: i32,
        current_house_id: u32,
        clock_ms: u64,
        jobs: Option<&dyn RebuildQueue>,
    ) -> ChunkFrameStats {
        let mut fs = ChunkFrameStats::default();
        let bounds = view.floor_bounds(z).node_aligned();
        let frame = self.frame;
        let generation = self.generation;
        let renderer = Arc::clone(&self.renderer);
        let options = Arc::clone(&self.options);
        let ctx = DrawContext {
            view,
            options: &options,
            current_house_id,
            clock_ms,
            alpha: 255,
        };
        let draw_lights = options.should_draw_lights();
        let cache = &mut self.cache;

        map.visit_leaves(&bounds, |node| {
            let Some(floor) = node.floor(z) else {
                return;
            };
            if floor.tile_count() == 0 {
                return;
            }
            fs.visible += 1;
            let key = ChunkKey::from_node(node.coord(), z);
            let stamp = node.last_modified();
            let chunk = cache.get_or_create(key, frame);

            if !chunk.is_stale(stamp) {
                fs.hits += 1;
            } else {
                let queued = match jobs {
                    Some(q) if !chunk.is_dynamic() => {
                        if !q.is_open() {
                            if chunk.pending().is_some() {
                                log::debug!(target: "chunks", "queued build for {key:?} lost at shutdown");
                                chunk.clear_pending();
                            }
                            false
                        } else if chunk.pending().is_some() {
                            true
                        } else {
                            let job = ChunkBuildJob {
                                key,
                                floor: node.floor_snapshot(z),
                                stamp,
                                generation,
                                view: *view,
                                options: Arc::clone(&options),
                                current_house_id,
                                clock_ms,
                                renderer: Arc::clone(&renderer),
                            };
                            if q.submit(job) {
                                chunk.mark_pending(stamp);
                                fs.submitted += 1;
                                true
                            } else {
                                log::warn!(target: "chunks", "job queue closed; rebuilding {key:?} inline");
                                chunk.clear_pending();
                                false
                            }
                        }
                    }
                    _ => false,
                };
                if !queued {
                    chunk.rebuild(Some(floor), &renderer, &ctx, stamp);
                    fs.rebuilt += 1;
                }
            }

            if chunk.is_built() {
                fs.missing += chunk.report_missing(surface);
                let data = chunk.data();
                chunk.submit(surface, view);
                if draw_lights {
                    lights.merge(&data.lights);
                }
                overlays.extend_from(&data.overlays);
                fs.tiles += data.tiles;
            }
        });
        self.stats.add(&fs);
        fs
    }

    /// Drops chunks not touched within the age horizon.
    pub fn end_frame(&mut self) -> usize {
        let pruned = self.cache.prune(self.frame, self.max_age);
        if pruned > 0 {
            log::trace!(target: "chunks", "pruned {pruned} chunks at frame {}", self.frame);
        }
        pruned
    }

    /// Totals since `begin_frame`, including applied and discarded results.
    pub fn frame_stats(&self) -> ChunkFrameStats {
        self.stats
    }
}
