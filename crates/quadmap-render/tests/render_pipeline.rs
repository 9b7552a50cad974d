use std::cell::RefCell;
use std::sync::Arc;

use quadmap_geom::Position;
use quadmap_items::{Assets, ItemTypes, SpriteProvider};
use quadmap_map::{Item, SpatialMap, Tile};
use quadmap_render::{
    Camera, ChunkBuildJob, ChunkBuildResult, ChunkKey, ChunkManager, DrawContext, DrawingOptions,
    FrameInput, LightBuffer, MapDrawer, OverlayState, QueuedLiveClient, RebuildQueue,
    RecordingSurface, RenderView, TileOverlays, TileRenderer, TileTargets, build_chunk_data,
    prepare_live_nodes,
};

const ASSETS: &str = r#"
[atlas]
columns = 8
rows = 8
pages = 4
white_pixel = 0

[[sprites]]
id = 1
images = [1]

[[sprites]]
id = 2
images = [2]

[[sprites]]
id = 3
images = [3]

[[sprites]]
id = 5
frames = 2
images = [5, 6]
animation = { frame_ms = 100 }

[[items]]
id = 100
name = "grass"
sprite = 1
flags = ["ground"]

[[items]]
id = 200
name = "fence"
sprite = 2
flags = ["border"]

[[items]]
id = 300
name = "torch"
sprite = 3
light = { intensity = 40, color = 215 }

[[items]]
id = 400
name = "flame"
sprite = 5

[[sprites]]
id = 9
images = [999]

[[items]]
id = 900
name = "lost"
sprite = 9
"#;

fn renderer() -> Arc<TileRenderer> {
    let assets = Assets::from_toml_str(ASSETS).expect("assets");
    let items: Arc<dyn ItemTypes> = Arc::new(assets.items);
    let sprites: Arc<dyn SpriteProvider> = Arc::new(assets.sprites);
    Arc::new(TileRenderer::new(items, sprites))
}

fn torch_tile(x: i32, y: i32, z: i32) -> Tile {
    Tile::new(Position::new(x, y, z))
        .with_ground(Item::new(100))
        .with_item(Item::new(200))
        .with_item(Item::new(300))
}

fn view_at(scroll: (i32, i32), options: &DrawingOptions) -> RenderView {
    let camera = Camera {
        scroll_x: scroll.0,
        scroll_y: scroll.1,
        screen_width: 640,
        screen_height: 480,
        ..Camera::default()
    };
    RenderView::setup(&camera, options)
}

/// Holds jobs until the test runs them, in whatever order it likes.
#[derive(Default)]
struct ManualQueue {
    jobs: RefCell<Vec<ChunkBuildJob>>,
    done: RefCell<Vec<ChunkBuildResult>>,
}

impl ManualQueue {
    fn run_reversed(&self) {
        let jobs: Vec<_> = self.jobs.borrow_mut().drain(..).collect();
        let mut done = self.done.borrow_mut();
        for job in jobs.into_iter().rev() {
            done.push(job.run());
        }
    }
}

impl RebuildQueue for ManualQueue {
    fn submit(&self, job: ChunkBuildJob) -> bool {
        self.jobs.borrow_mut().push(job);
        true
    }

    fn poll(&self) -> Vec<ChunkBuildResult> {
        self.done.borrow_mut().drain(..).collect()
    }
}

#[test]
fn ground_border_and_torch_draw_in_order_with_one_light() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(torch_tile(10, 10, 7));
    let options = DrawingOptions {
        show_lights: true,
        ..DrawingOptions::default()
    };
    let view = view_at((0, 0), &options);
    let ctx = DrawContext::new(&view, &options);
    let mut surface = RecordingSurface::new();
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();
    let loc = map.location(Position::new(10, 10, 7)).expect("location");
    {
        let mut targets = TileTargets {
            surface: &mut surface,
            lights: Some(&mut lights),
            overlays: Some(&mut overlays),
        };
        let out = r.draw_tile(&mut targets, &ctx, loc, None);
        assert!(out.drawn);
        assert!(!out.dynamic);
    }

    let sprites = r.sprites();
    let expected: Vec<_> = [1u32, 2, 3]
        .iter()
        .map(|i| sprites.region(*i).expect("region"))
        .collect();
    let drawn: Vec<_> = surface.sprites().map(|s| s.region).collect();
    assert_eq!(drawn, expected);
    assert!(surface.sprites().all(|s| (s.x, s.y) == (320.0, 320.0)));

    assert_eq!(lights.len(), 1);
    let light = lights.lights()[0];
    assert_eq!((light.x, light.y, light.intensity), (10, 10, 40));
}

#[test]
fn chunk_geometry_does_not_depend_on_the_camera() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(torch_tile(5, 6, 7));
    map.set_tile(torch_tile(6, 6, 7));
    let options = DrawingOptions::default();
    let node = map.get_leaf(5, 6).expect("node");
    let floor = node.floor(7);

    let near = view_at((0, 0), &options);
    let far = view_at((9_000, 4_000), &options);
    let a = build_chunk_data(floor, &r, &DrawContext::new(&near, &options));
    let b = build_chunk_data(floor, &r, &DrawContext::new(&far, &options));
    assert_eq!(a.instances, b.instances);
    assert_eq!(a.tiles, 2);
    assert_eq!(a.instances.len(), 6);
    assert_eq!((a.instances[0].x, a.instances[0].y), (160.0, 192.0));
}

#[test]
fn edited_node_is_rebuilt_once_then_served_from_cache() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(torch_tile(2, 2, 7));
    let options = DrawingOptions::default();
    let view = view_at((0, 0), &options);
    let mut mgr = ChunkManager::new(Arc::clone(&r), 10);
    let mut surface = RecordingSurface::new();
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();

    let mut frame = |mgr: &mut ChunkManager, map: &SpatialMap, n: u64| {
        mgr.begin_frame(n, &options, 0, &view, None);
        surface.clear();
        let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, map, &view, 7, 0, 0, None);
        mgr.end_frame();
        (s, surface.sprite_count())
    };

    let (s1, n1) = frame(&mut mgr, &map, 1);
    assert_eq!((s1.rebuilt, s1.hits, n1), (1, 0, 3));
    let (s2, n2) = frame(&mut mgr, &map, 2);
    assert_eq!((s2.rebuilt, s2.hits, n2), (0, 1, 3));

    map.with_tile_mut(Position::new(2, 2, 7), |t| t.items.pop());
    let (s3, n3) = frame(&mut mgr, &map, 3);
    assert_eq!((s3.rebuilt, n3), (1, 2));
}

#[test]
fn results_arriving_out_of_order_update_only_their_own_chunk() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(torch_tile(1, 1, 7));
    map.set_tile(Tile::new(Position::new(9, 1, 7)).with_ground(Item::new(100)));
    let options = DrawingOptions::default();
    let view = view_at((0, 0), &options);
    let mut mgr = ChunkManager::new(Arc::clone(&r), 10);
    let queue = ManualQueue::default();
    let mut surface = RecordingSurface::new();
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();

    mgr.begin_frame(1, &options, 0, &view, Some(&queue));
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &view, 7, 0, 0, Some(&queue));
    assert_eq!((s.submitted, s.rebuilt), (2, 0));
    assert_eq!(surface.sprite_count(), 0);

    // A second frame before any result lands queues nothing new.
    mgr.begin_frame(2, &options, 0, &view, Some(&queue));
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &view, 7, 0, 0, Some(&queue));
    assert_eq!(s.submitted, 0);

    queue.run_reversed();
    mgr.begin_frame(3, &options, 0, &view, Some(&queue));
    assert_eq!(mgr.frame_stats().applied, 2);
    surface.clear();
    let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &view, 7, 0, 0, Some(&queue));
    assert_eq!(s.hits, 2);
    assert_eq!(surface.sprite_count(), 4);

    let cache_view = |nx, ny| {
        mgr.cache()
            .last_access(ChunkKey::new(nx, ny, 7))
            .expect("slot")
    };
    assert_eq!(cache_view(0, 0), 3);
    assert_eq!(cache_view(2, 0), 3);
}

#[test]
fn older_result_never_replaces_newer_geometry() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(torch_tile(1, 1, 7));
    let options = DrawingOptions::default();
    let view = view_at((0, 0), &options);
    let node = map.get_leaf(1, 1).expect("node");
    let key = ChunkKey::new(0, 0, 7);
    let old_stamp = node.last_modified();
    let old = ChunkBuildJob {
        key,
        floor: node.floor_snapshot(7),
        stamp: old_stamp,
        generation: 0,
        view,
        options: Arc::new(options.clone()),
        current_house_id: 0,
        clock_ms: 0,
        renderer: Arc::clone(&r),
    };

    map.with_tile_mut(Position::new(1, 1, 7), |t| t.items.clear());
    let node = map.get_leaf(1, 1).expect("node");
    let new = ChunkBuildJob {
        floor: node.floor_snapshot(7),
        stamp: node.last_modified(),
        ..old.clone()
    };
    assert!(new.stamp > old_stamp);

    let mut chunk = quadmap_render::RenderChunk::new(key);
    let newer = new.run();
    let older = old.run();
    assert_eq!(older.data.instances.len(), 3);
    assert!(chunk.apply(newer.data, newer.stamp));
    assert!(!chunk.apply(older.data, older.stamp));
    assert_eq!(chunk.data().instances.len(), 1);
    assert!(!chunk.is_stale(node.last_modified()));
}

#[test]
fn results_from_before_a_clear_are_dropped() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(torch_tile(1, 1, 7));
    let options = DrawingOptions::default();
    let view = view_at((0, 0), &options);
    let mut mgr = ChunkManager::new(Arc::clone(&r), 10);
    let queue = ManualQueue::default();
    let mut surface = RecordingSurface::new();
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();

    mgr.begin_frame(1, &options, 0, &view, Some(&queue));
    mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &view, 7, 0, 0, Some(&queue));
    queue.run_reversed();

    let changed = DrawingOptions {
        show_tech_items: false,
        ..options.clone()
    };
    mgr.begin_frame(2, &changed, 0, &view, Some(&queue));
    let s = mgr.frame_stats();
    assert_eq!((s.applied, s.discarded), (0, 1));
    assert!(mgr.cache().is_empty());
}

#[test]
fn animated_chunks_rebuild_every_frame() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(
        Tile::new(Position::new(3, 3, 7))
            .with_ground(Item::new(100))
            .with_item(Item::new(400)),
    );
    let options = DrawingOptions {
        show_preview: true,
        ..DrawingOptions::default()
    };
    let view = view_at((0, 0), &options);
    let mut mgr = ChunkManager::new(Arc::clone(&r), 10);
    let mut surface = RecordingSurface::new();
    let mut lights = LightBuffer::new();
    let mut overlays = TileOverlays::default();
    for n in 1..=3 {
        mgr.begin_frame(n, &options, 0, &view, None);
        let s = mgr.draw_floor(&mut surface, &mut lights, &mut overlays, &map, &view, 7, 0, n * 100, None);
        assert_eq!(s.rebuilt, 1);
    }
}

#[test]
fn live_frames_request_each_missing_node_once() {
    let r = renderer();
    let mut map = SpatialMap::new_live();
    let camera = Camera {
        screen_width: 256,
        screen_height: 256,
        ..Camera::default()
    };
    let options = DrawingOptions::default();
    let view = RenderView::setup(&camera, &options);
    prepare_live_nodes(&mut map, &view);
    let client = QueuedLiveClient::new();
    let overlay = OverlayState::default();
    let mut drawer = MapDrawer::new(Arc::clone(&r), 10, 8);
    let mut surface = RecordingSurface::new();

    let input = FrameInput {
        map: &map,
        camera: &camera,
        options: &options,
        current_house_id: 0,
        clock_ms: 0,
        live: Some(&client),
        overlay: &overlay,
    };
    let first = drawer.draw_frame(&mut surface, &input, None);
    let second = drawer.draw_frame(&mut surface, &input, None);
    assert!(first.live_requests > 0);
    assert_eq!(first.live_requests, first.placeholders);
    assert_eq!(second.live_requests, 0);
    assert_eq!(client.take_requests().len(), first.live_requests);
}

#[test]
fn frame_collects_lights_and_builds_a_light_map() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(torch_tile(4, 4, 7));
    map.set_tile(torch_tile(5, 4, 7));
    let camera = Camera {
        screen_width: 320,
        screen_height: 240,
        ..Camera::default()
    };
    let options = DrawingOptions {
        show_lights: true,
        ..DrawingOptions::default()
    };
    let overlay = OverlayState::default();
    let mut drawer = MapDrawer::new(Arc::clone(&r), 10, 8);
    let mut surface = RecordingSurface::new();
    let input = FrameInput {
        map: &map,
        camera: &camera,
        options: &options,
        current_house_id: 0,
        clock_ms: 0,
        live: None,
        overlay: &overlay,
    };
    let stats = drawer.draw_frame(&mut surface, &input, None);
    assert_eq!(stats.lights, 2);
    assert_eq!(stats.tiles, 2);
    assert_eq!(stats.sprites, 6);
    assert!(!drawer.light_map().is_placeholder());

    let again = drawer.draw_frame(&mut surface, &input, None);
    assert_eq!(again.chunks_hit, 1);
    assert_eq!(again.lights, 2);
}

#[test]
fn transparent_upper_floor_is_drawn_faded() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(Tile::new(Position::new(4, 4, 6)).with_ground(Item::new(100)));
    let camera = Camera {
        screen_width: 320,
        screen_height: 240,
        ..Camera::default()
    };
    let options = DrawingOptions {
        transparent_floors: true,
        ..DrawingOptions::default()
    };
    let overlay = OverlayState::default();
    let mut drawer = MapDrawer::new(Arc::clone(&r), 10, 8);
    let mut surface = RecordingSurface::new();
    let input = FrameInput {
        map: &map,
        camera: &camera,
        options: &options,
        current_house_id: 0,
        clock_ms: 0,
        live: None,
        overlay: &overlay,
    };
    drawer.draw_frame(&mut surface, &input, None);
    let faded: Vec<_> = surface.sprites().filter(|s| s.tint.a == 96).collect();
    assert_eq!(faded.len(), 1);
    assert_eq!((faded[0].x, faded[0].y), (96.0, 96.0));
}

fn frame_with(
    drawer: &mut MapDrawer,
    map: &SpatialMap,
    options: &DrawingOptions,
    current_house_id: u32,
) -> RecordingSurface {
    let camera = Camera {
        screen_width: 320,
        screen_height: 240,
        ..Camera::default()
    };
    let overlay = OverlayState::default();
    let input = FrameInput {
        map,
        camera: &camera,
        options,
        current_house_id,
        clock_ms: 0,
        live: None,
        overlay: &overlay,
    };
    let mut surface = RecordingSurface::new();
    drawer.draw_frame(&mut surface, &input, None);
    surface
}

#[test]
fn missing_images_are_reported_on_both_paths() {
    let r = renderer();
    let mut map = SpatialMap::new();
    map.set_tile(
        Tile::new(Position::new(3, 3, 7))
            .with_ground(Item::new(100))
            .with_item(Item::new(900)),
    );
    for use_chunk_cache in [false, true] {
        let options = DrawingOptions {
            use_chunk_cache,
            ..DrawingOptions::default()
        };
        let mut drawer = MapDrawer::new(Arc::clone(&r), 10, 8);
        let surface = frame_with(&mut drawer, &map, &options, 0);
        assert_eq!(surface.missing, vec![999], "use_chunk_cache = {use_chunk_cache}");
        assert_eq!(surface.sprite_count(), 1);
    }

    let options = DrawingOptions::default();
    let mut drawer = MapDrawer::new(Arc::clone(&r), 10, 8);
    frame_with(&mut drawer, &map, &options, 0);
    let again = frame_with(&mut drawer, &map, &options, 0);
    assert!(again.missing.is_empty());
}

#[test]
fn current_house_pulse_matches_between_cached_and_direct() {
    let r = renderer();
    let mut map = SpatialMap::new();
    let mut tile = Tile::new(Position::new(4, 4, 7)).with_ground(Item::new(100));
    tile.house_id = 5;
    map.set_tile(tile);

    let cached_opts = |pulse: f32| DrawingOptions {
        show_houses: true,
        highlight_pulse: pulse,
        ..DrawingOptions::default()
    };
    let direct_opts = |pulse: f32| DrawingOptions {
        use_chunk_cache: false,
        ..cached_opts(pulse)
    };
    let tint = |surface: &RecordingSurface| surface.sprites().next().expect("ground").tint;

    let mut cached = MapDrawer::new(Arc::clone(&r), 10, 8);
    let mut direct = MapDrawer::new(Arc::clone(&r), 10, 8);
    let mut seen = Vec::new();
    for pulse in [0.2, 0.9, 0.5] {
        let a = tint(&frame_with(&mut cached, &map, &cached_opts(pulse), 5));
        let b = tint(&frame_with(&mut direct, &map, &direct_opts(pulse), 5));
        assert_eq!(a, b, "pulse {pulse}");
        seen.push(a);
    }
    assert_ne!(seen[0], seen[1]);
    assert_ne!(seen[1], seen[2]);
}
