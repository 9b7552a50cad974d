//! Chunked tile rendering: pattern resolution, per-tile drawing, chunk
//! caching, floor composition and lighting.
#![forbid(unsafe_code)]

pub mod chunk;
pub mod chunk_cache;
pub mod chunk_manager;
pub mod color;
pub mod frame;
pub mod indicators;
pub mod layer_drawer;
pub mod light;
pub mod light_map;
pub mod live;
pub mod markers;
pub mod options;
pub mod overlay;
pub mod pattern;
pub mod surface;
pub mod tile_color;
pub mod tile_renderer;
pub mod tooltip;
pub mod view;

pub use chunk::{
    ChunkBuildJob, ChunkBuildResult, ChunkData, ChunkKey, RebuildQueue, RenderChunk,
    build_chunk_data,
};
pub use chunk_cache::{ChunkCache, ChunkCacheStats};
pub use chunk_manager::{ChunkFrameStats, ChunkManager, DEFAULT_MAX_AGE_FRAMES};
pub use color::Rgba;
pub use frame::{FrameInput, FrameStats, MapDrawer};
pub use indicators::{DoorIndicator, HookIndicator, TileOverlays};
pub use layer_drawer::{LOADING_PLACEHOLDER, LayerDrawStats, MapLayerDrawer};
pub use light::{Light, LightBuffer, LightCollector, LightSink};
pub use light_map::{LightMap, LightMapGenerator};
pub use live::{LiveClient, QueuedLiveClient, prepare_live_nodes, request_node};
pub use options::DrawingOptions;
pub use overlay::{BrushKind, BrushPreview, BrushShape, LiveCursor, OverlayState, SelectionBox};
pub use pattern::{TileHooks, axis_offset, resolve_patterns, stack_bucket};
pub use surface::{DrawCommand, DrawSurface, RecordingSurface, SpriteCollector, SpriteInstance};
pub use tile_renderer::{DrawContext, TileDrawOutcome, TileRenderer, TileTargets};
pub use tooltip::{Tooltip, TooltipCollector};
pub use view::{Camera, RenderView};
