use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use quadmap_geom::Position;
use quadmap_items::{Assets, ItemTypes, SpriteProvider};
use quadmap_map::{Item, SpatialMap, Tile};
use quadmap_render::{
    Camera, ChunkBuildJob, ChunkBuildResult, ChunkKey, ChunkManager, DrawingOptions, LightBuffer,
    RecordingSurface, RenderView, TileOverlays, TileRenderer,
};
use quadmap_runtime::JobSystem;

const ASSETS: &str = r#"
[atlas]
columns = 8
rows = 8
pages = 1
white_pixel = 0

[[sprites]]
id = 1
images = [1]

[[sprites]]
id = 2
images = [2]

[[items]]
id = 100
name = "grass"
sprite = 1
flags = ["ground"]

[[items]]
id = 300
name = "torch"
sprite = 2
light = { intensity = 8, color = 215 }
"#;

fn renderer() -> Arc<TileRenderer> {
    let assets = Assets::from_toml_str(ASSETS).expect("assets");
    let items: Arc<dyn ItemTypes> = Arc::new(assets.items);
    let sprites: Arc<dyn SpriteProvider> = Arc::new(assets.sprites);
    Arc::new(TileRenderer::new(items, sprites))
}

fn view(options: &DrawingOptions) -> RenderView {
    let camera = Camera {
        screen_width: 640,
        screen_height: 480,
        ..Camera::default()
    };
    RenderView::setup(&camera, options)
}

fn drain_until(jobs: &JobSystem, want: usize) -> Vec<ChunkBuildResult> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut out = Vec::new();
    while out.len() < want && Instant::now() < deadline {
        out.extend(jobs.poll());
        thread::sleep(Duration::from_millis(1));
    }
    out
}

#[test]
fn each_result_carries_its_own_key_and_stamp() {
    let r = renderer();
    let mut map = SpatialMap::new();
    for nx in 0..6 {
        map.set_tile(Tile::new(Position::new(nx * 4, 0, 7)).with_ground(Item::new(100)));
    }
    let options = Arc::new(DrawingOptions::default());
    let v = view(&options);
    let jobs = JobSystem::with_workers(3);

    for nx in 0..6 {
        let node = map.get_leaf(nx * 4, 0).expect("node");
        let job = ChunkBuildJob {
            key: ChunkKey::new(nx, 0, 7),
            floor: node.floor_snapshot(7),
            stamp: 100 + nx as u64,
            generation: 1,
            view: v,
            options: Arc::clone(&options),
            current_house_id: 0,
            clock_ms: 0,
            renderer: Arc::clone(&r),
        };
        assert!(jobs.submit(job));
    }

    let mut results = drain_until(&jobs, 6);
    assert_eq!(results.len(), 6);
    results.sort_by_key(|res| res.key);
    for (nx, res) in results.iter().enumerate() {
        assert_eq!(res.key, ChunkKey::new(nx as i32, 0, 7));
        assert_eq!(res.stamp, 100 + nx as u64);
        assert_eq!(res.generation, 1);
        assert_eq!(res.data.tiles, 1);
        assert_eq!(res.data.instances.len(), 1);
    }
}

#[test]
fn background_builds_reach_the_screen() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(
        Tile::new(Position::new(1, 1, 7))
            .with_ground(Item::new(100))
            .with_item(Item::new(300)),
    );
    map.set_tile(Tile::new(Position::new(9, 1, 7)).with_ground(Item::new(100)));
    let options = DrawingOptions {
        show_lights: true,
        ..DrawingOptions::default()
    };
    let v = view(&options);
    let jobs = JobSystem::with_workers(2);
    let mut mgr = ChunkManager::new(Arc::clone(&r), 100);
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();

    let mut surface = RecordingSurface::new();
    mgr.begin_frame(1, &options, 0, &v, Some(&jobs));
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &v, 7, 0, 0, Some(&jobs));
    assert_eq!(s.submitted, 2);

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut frame = 1;
    let mut applied = 0;
    while applied < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
        frame += 1;
        mgr.begin_frame(frame, &options, 0, &v, Some(&jobs));
        applied += mgr.frame_stats().applied;
    }
    assert_eq!(applied, 2);

    surface.clear();
    lights.clear();
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &v, 7, 0, 0, Some(&jobs));
    assert_eq!((s.hits, s.submitted, s.rebuilt), (2, 0, 0));
    assert_eq!(surface.sprite_count(), 3);
    assert_eq!(lights.len(), 1);
}

#[test]
fn stopped_system_refuses_work_and_manager_falls_back_inline() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(Tile::new(Position::new(2, 2, 7)).with_ground(Item::new(100)));
    let options = DrawingOptions::default();
    let v = view(&options);
    let jobs = JobSystem::with_workers(1);
    jobs.stop();
    assert!(jobs.is_stopped());

    let mut mgr = ChunkManager::new(r, 100);
    let mut surface = RecordingSurface::new();
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();
    mgr.begin_frame(1, &options, 0, &v, Some(&jobs));
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &v, 7, 0, 0, Some(&jobs));
    assert_eq!((s.submitted, s.rebuilt), (0, 1));
    assert_eq!(surface.sprite_count(), 1);
}

#[test]
fn builds_lost_at_shutdown_are_redone_inline() {
    let r = renderer();
    let mut map = SpatialMap::new();
    for ny in 0..3 {
        for nx in 0..4 {
            map.set_tile(Tile::new(Position::new(nx * 4, ny * 4, 7)).with_ground(Item::new(100)));
        }
    }
    let options = DrawingOptions::default();
    let v = view(&options);
    let jobs = JobSystem::with_workers(1);
    let mut mgr = ChunkManager::new(r, 100);
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();

    let mut surface = RecordingSurface::new();
    mgr.begin_frame(1, &options, 0, &v, Some(&jobs));
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &v, 7, 0, 0, Some(&jobs));
    assert_eq!(s.submitted, 12);
    jobs.stop();

    let mut surface = RecordingSurface::new();
    mgr.begin_frame(2, &options, 0, &v, Some(&jobs));
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &v, 7, 0, 0, Some(&jobs));
    assert_eq!(s.submitted, 0);
    assert_eq!(s.hits + s.rebuilt, 12);
    assert_eq!(surface.sprite_count(), 12);

    let mut surface = RecordingSurface::new();
    mgr.begin_frame(3, &options, 0, &v, Some(&jobs));
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &v, 7, 0, 0, Some(&jobs));
    assert_eq!((s.hits, s.rebuilt, s.submitted), (12, 0, 0));
    assert_eq!(surface.sprite_count(), 12);
}
