use std::sync::Arc;
use std::time::{Duration, Instant};

use quadmap_geom::{GROUND_LAYER, Position, TILE_SIZE};
use quadmap_map::SpatialMap;
use quadmap_render::{
    BrushKind, BrushPreview, BrushShape, Camera, ChunkCacheStats, FrameInput, FrameStats,
    LiveClient, LiveCursor, MapDrawer, OverlayState, QueuedLiveClient, RebuildQueue,
    RecordingSurface, RenderView, Rgba, TileRenderer, prepare_live_nodes,
};
use quadmap_runtime::JobSystem;

use crate::config::AppConfig;
use crate::demo_map;
use crate::watch::ConfigWatcher;

/// Knobs the command line can force over the config file.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOverrides {
    pub frames: Option<u64>,
    pub sync: bool,
    pub live: bool,
}

#[derive(Clone, Debug, Default)]
pub struct BenchReport {
    pub frames: u64,
    pub live: bool,
    pub workers: usize,
    pub elapsed: Duration,
    pub frame_ms: Vec<f64>,
    pub totals: FrameStats,
    pub cache: ChunkCacheStats,
    pub nodes_streamed: usize,
    pub jobs_dropped: usize,
    pub reloads: usize,
}

impl BenchReport {
    fn add(&mut self, s: &FrameStats) {
        let t = &mut self.totals;
        t.frame = s.frame;
        t.floors += s.floors;
        t.tiles += s.tiles;
        t.chunks_visible += s.chunks_visible;
        t.chunks_hit += s.chunks_hit;
        t.chunks_rebuilt += s.chunks_rebuilt;
        t.jobs_submitted += s.jobs_submitted;
        t.results_applied += s.results_applied;
        t.results_discarded += s.results_discarded;
        t.placeholders += s.placeholders;
        t.live_requests += s.live_requests;
        t.lights += s.lights;
        t.sprites += s.sprites;
        t.fills += s.fills;
        t.pruned += s.pruned;
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.frame_ms.is_empty() {
            return 0.0;
        }
        let mut sorted = self.frame_ms.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn hit_rate(&self) -> f64 {
        let visible = self.totals.chunks_visible;
        if visible == 0 {
            0.0
        } else {
            self.totals.chunks_hit as f64 / visible as f64
        }
    }

    pub fn to_markdown(&self) -> String {
        let mean = if self.frame_ms.is_empty() {
            0.0
        } else {
            self.frame_ms.iter().sum::<f64>() / self.frame_ms.len() as f64
        };
        let frames = self.frames.max(1) as f64;
        let mut out = String::new();
        out.push_str("| Mode | Frames | Workers | Mean (ms) | P50 (ms) | P95 (ms) | Max (ms) |\n");
        out.push_str("|------|--------|---------|-----------|----------|----------|----------|\n");
        out.push_str(&format!(
            "| {} | {} | {} | {:.3} | {:.3} | {:.3} | {:.3} |\n\n",
            if self.live { "live" } else { "local" },
            self.frames,
            self.workers,
            mean,
            self.percentile(0.5),
            self.percentile(0.95),
            self.percentile(1.0),
        ));
        out.push_str("| Per frame | Tiles | Sprites | Lights | Chunks | Hit rate | Rebuilt | Jobs | Placeholders |\n");
        out.push_str("|-----------|-------|---------|--------|--------|----------|---------|------|--------------|\n");
        out.push_str(&format!(
            "| avg | {:.1} | {:.1} | {:.1} | {:.1} | {:.1}% | {:.2} | {:.2} | {:.2} |\n\n",
            self.totals.tiles as f64 / frames,
            self.totals.sprites as f64 / frames,
            self.totals.lights as f64 / frames,
            self.totals.chunks_visible as f64 / frames,
            self.hit_rate() * 100.0,
            self.totals.chunks_rebuilt as f64 / frames,
            self.totals.jobs_submitted as f64 / frames,
            self.totals.placeholders as f64 / frames,
        ));
        out.push_str(&format!(
            "cache: {} entries, {} hits, {} misses, {} evicted; results applied {}, discarded {}; \
             jobs dropped at stop {}; nodes streamed {}; config reloads {}\n",
            self.cache.entries,
            self.cache.hits,
            self.cache.misses,
            self.cache.evictions,
            self.totals.results_applied,
            self.totals.results_discarded,
            self.jobs_dropped,
            self.nodes_streamed,
            self.reloads,
        ));
        out
    }
}

/// Camera pan that sweeps the map diagonally and bounces at the edges.
fn pan(frame: u64, speed: i32, map_px: i32, screen: i32) -> i32 {
    let span = (map_px - screen).max(1) as i64;
    let travel = (frame as i64 * i64::from(speed)).rem_euclid(2 * span);
    (if travel > span { 2 * span - travel } else { travel }) as i32
}

/// Toggles a torch on a few tiles spread over the map so nodes keep
/// going stale.
fn apply_edits(map: &mut SpatialMap, frame: u64, count: u32, size: i32) {
    for i in 0..u64::from(count) {
        let h = frame.wrapping_mul(2_654_435_761).wrapping_add(i.wrapping_mul(40_503));
        let x = (h % size as u64) as i32;
        let y = ((h / size as u64) % size as u64) as i32;
        map.with_tile_mut(Position::new(x, y, GROUND_LAYER), |t| {
            if t.items.last().is_some_and(|it| it.id == demo_map::TORCH) {
                t.items.pop();
            } else {
                t.items.push(quadmap_map::Item::new(demo_map::TORCH));
            }
        });
    }
}

fn overlay_for(view: &RenderView, frame: u64, live: bool) -> OverlayState {
    let (cx, cy) = view.map_position(view.logical_width / 2.0, view.logical_height / 2.0);
    let center = Position::new(cx, cy, view.floor);
    let kind = match (frame / 120) % 3 {
        0 => BrushKind::Item {
            item_id: demo_map::TORCH,
        },
        1 => BrushKind::Creature {
            look_type: demo_map::RAT,
        },
        _ => BrushKind::Spawn { radius: 2 },
    };
    let live_cursors = if live {
        vec![LiveCursor {
            pos: Position::new(cx + 3, cy + 1, view.floor),
            color: Rgba::new(255, 200, 0, 255),
        }]
    } else {
        Vec::new()
    };
    OverlayState {
        selection: None,
        brush: Some(BrushPreview {
            kind,
            shape: BrushShape::Circle,
            size: 1,
            center,
        }),
        live_cursors,
    }
}

/// Headless frame loop over the demo map. Returns per-frame timings and
/// aggregate pipeline counters.
pub fn run(
    renderer: Arc<TileRenderer>,
    config: AppConfig,
    overrides: RunOverrides,
    watcher: Option<&ConfigWatcher>,
) -> BenchReport {
    let mut config = config;
    let live = overrides.live || config.bench.live;
    let frames = overrides.frames.unwrap_or(config.bench.frames);
    let size = config.bench.map_size;

    let started = Instant::now();
    let mut source = demo_map::generate(size, config.bench.seed);
    log::info!(
        "generated {size}x{size} demo map: {} tiles in {:?}",
        source.tile_count(),
        started.elapsed()
    );
    let mut streamed = live.then(SpatialMap::new_live);
    let client = QueuedLiveClient::new();

    let jobs = (config.cache.async_rebuild && !overrides.sync)
        .then(|| JobSystem::with_workers(config.cache.workers));
    let mut drawer = MapDrawer::new(
        renderer,
        config.cache.max_age_frames,
        config.lighting.texel_size,
    );
    drawer.light_maps_mut().set_intensity(config.lighting.intensity);
    let mut options = config.drawing_options();
    let mut surface = RecordingSurface::new();
    let mut report = BenchReport {
        frames,
        live,
        workers: jobs.as_ref().map_or(0, JobSystem::worker_count),
        ..BenchReport::default()
    };

    for frame in 0..frames {
        if let Some(next) = watcher.and_then(ConfigWatcher::poll) {
            drawer.chunks_mut().set_max_age(next.cache.max_age_frames);
            drawer.light_maps_mut().set_intensity(next.lighting.intensity);
            config = next;
            options = config.drawing_options();
            report.reloads += 1;
        }

        let map_px = size * TILE_SIZE;
        let camera = Camera {
            scroll_x: pan(frame, config.bench.scroll_speed, map_px, config.camera.screen_width),
            scroll_y: pan(frame, config.bench.scroll_speed / 2, map_px, config.camera.screen_height),
            ..config.camera
        };
        let view = RenderView::setup(&camera, &options);

        let map = match streamed.as_mut() {
            Some(m) => {
                prepare_live_nodes(m, &view);
                m
            }
            None => &mut source,
        };
        apply_edits(map, frame, config.bench.edits_per_frame, size);

        let overlay = overlay_for(&view, frame, live);
        let input = FrameInput {
            map,
            camera: &camera,
            options: &options,
            current_house_id: 1,
            clock_ms: frame * config.bench.frame_ms,
            live: live.then_some(&client as &dyn LiveClient),
            overlay: &overlay,
        };
        surface.clear();
        let t0 = Instant::now();
        let stats = drawer.draw_frame(
            &mut surface,
            &input,
            jobs.as_ref().map(|j| j as &dyn RebuildQueue),
        );
        report.frame_ms.push(t0.elapsed().as_secs_f64() * 1000.0);
        report.add(&stats);

        if let Some(dst) = streamed.as_mut() {
            for (x, y, underground) in client.take_requests() {
                demo_map::stream_node(&source, dst, x, y, underground);
                report.nodes_streamed += 1;
            }
        }
        if frame > 0 && frame % 120 == 0 {
            let (queued, inflight, completed, _) =
                jobs.as_ref().map_or((0, 0, 0, 0), JobSystem::queue_debug_counts);
            log::debug!(
                target: "chunks",
                "frame {frame}: {} chunks, {:.1}% hits, jobs q={queued} run={inflight} done={completed}",
                drawer.chunks().cache().len(),
                report.hit_rate() * 100.0
            );
        }
    }

    if let Some(jobs) = &jobs {
        jobs.stop();
        report.jobs_dropped = jobs.queue_debug_counts().3;
    }
    report.cache = drawer.chunks().cache_stats();
    report.elapsed = started.elapsed();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadmap_items::{Assets, ItemTypes, SpriteProvider};

    fn renderer() -> Arc<TileRenderer> {
        let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let assets = Assets::load(root.join("assets/items.toml")).unwrap();
        let items: Arc<dyn ItemTypes> = Arc::new(assets.items);
        let sprites: Arc<dyn SpriteProvider> = Arc::new(assets.sprites);
        Arc::new(TileRenderer::new(items, sprites))
    }

    fn small_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.bench.map_size = 48;
        cfg.bench.frames = 30;
        cfg.camera.screen_width = 320;
        cfg.camera.screen_height = 240;
        cfg
    }

    #[test]
    fn pan_bounces_inside_the_map() {
        for f in 0..500 {
            let s = pan(f, 7, 1000, 300);
            assert!((0..=700).contains(&s));
        }
        assert_eq!(pan(0, 7, 1000, 300), 0);
        assert_eq!(pan(100, 7, 1000, 300), 700);
        assert_eq!(pan(101, 7, 1000, 300), 693);
    }

    #[test]
    fn synchronous_local_run_draws_every_frame() {
        let report = run(
            renderer(),
            small_config(),
            RunOverrides {
                sync: true,
                ..RunOverrides::default()
            },
            None,
        );
        assert_eq!(report.frames, 30);
        assert_eq!(report.frame_ms.len(), 30);
        assert_eq!(report.workers, 0);
        assert!(report.totals.tiles > 0);
        assert!(report.totals.chunks_hit > 0);
        assert_eq!(report.totals.jobs_submitted, 0);
        assert!(report.to_markdown().contains("| local | 30 |"));
    }

    #[test]
    fn live_run_streams_nodes_on_request() {
        let report = run(
            renderer(),
            small_config(),
            RunOverrides {
                sync: true,
                live: true,
                frames: Some(5),
            },
            None,
        );
        assert!(report.totals.placeholders > 0);
        assert!(report.nodes_streamed > 0);
        assert_eq!(report.nodes_streamed, report.totals.live_requests);
        assert!(report.totals.tiles > 0);
    }
}
