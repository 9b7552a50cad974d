use quadmap_geom::{GROUND_LAYER, MAP_MAX_LAYER, TILE_SIZE, TileBounds, layer_offset};
use serde::Deserialize;

use crate::options::DrawingOptions;

/// Extra pixels kept around the viewport so sprites that overhang their
/// tile (up and to the left) are not culled early.
pub const SAFETY_MARGIN: i32 = TILE_SIZE * 3;

/// Above this zoom individual lights and markers are too small to matter.
pub const ZOOM_DETAIL_LIMIT: f32 = 10.0;

/// Camera state owned by the UI.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub zoom: f32,
    pub floor: i32,
    pub screen_width: i32,
    pub screen_height: i32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scroll_x: 0,
            scroll_y: 0,
            zoom: 1.0,
            floor: GROUND_LAYER,
            screen_width: 1280,
            screen_height: 720,
        }
    }
}

/// Per-frame view: camera, viewport and the floor range to composite.
/// Computed once per frame and read-only afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderView {
    pub zoom: f32,
    pub floor: i32,
    pub start_z: i32,
    pub end_z: i32,
    pub superend_z: i32,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub screen_width: i32,
    pub screen_height: i32,
    pub logical_width: f32,
    pub logical_height: f32,
}

impl RenderView {
    pub fn setup(camera: &Camera, options: &DrawingOptions) -> Self {
        let floor = camera.floor.clamp(0, MAP_MAX_LAYER);
        let zoom = if camera.zoom.is_finite() && camera.zoom > 0.0 {
            camera.zoom
        } else {
            1.0
        };
        let start_z = if options.show_all_floors {
            if floor <= GROUND_LAYER {
                GROUND_LAYER
            } else {
                (floor + 2).min(MAP_MAX_LAYER)
            }
        } else {
            floor
        };
        let superend_z = if floor > GROUND_LAYER { GROUND_LAYER + 1 } else { 0 };
        let screen_width = camera.screen_width.max(0);
        let screen_height = camera.screen_height.max(0);
        Self {
            zoom,
            floor,
            start_z,
            end_z: floor,
            superend_z,
            scroll_x: camera.scroll_x,
            scroll_y: camera.scroll_y,
            screen_width,
            screen_height,
            logical_width: screen_width as f32 * zoom,
            logical_height: screen_height as f32 * zoom,
        }
    }

    /// Floors to composite, back to front.
    pub fn floors(&self) -> impl Iterator<Item = i32> + use<> {
        let end_z = self.end_z;
        (self.superend_z..=self.start_z).rev().filter(move |z| *z >= end_z)
    }

    #[inline]
    pub fn layer_offset(&self, z: i32) -> i32 {
        layer_offset(z, self.floor)
    }

    #[inline]
    pub fn screen_position(&self, x: i32, y: i32, z: i32) -> (i32, i32) {
        let offset = self.layer_offset(z);
        (
            x * TILE_SIZE - self.scroll_x - offset,
            y * TILE_SIZE - self.scroll_y - offset,
        )
    }

    /// Screen position of a tile, or `None` when it falls outside the
    /// viewport plus margin.
    pub fn tile_visible(&self, x: i32, y: i32, z: i32) -> Option<(i32, i32)> {
        let (sx, sy) = self.screen_position(x, y, z);
        let m = SAFETY_MARGIN as f32;
        let (fx, fy) = (sx as f32, sy as f32);
        if fx < -m || fx > self.logical_width + m || fy < -m || fy > self.logical_height + m {
            None
        } else {
            Some((sx, sy))
        }
    }

    #[inline]
    pub fn is_tile_visible(&self, x: i32, y: i32, z: i32) -> bool {
        self.tile_visible(x, y, z).is_some()
    }

    #[inline]
    pub fn is_pixel_visible(&self, draw_x: i32, draw_y: i32, margin: i32) -> bool {
        self.is_rect_visible(draw_x, draw_y, TILE_SIZE, TILE_SIZE, margin)
    }

    pub fn is_rect_visible(&self, x: i32, y: i32, w: i32, h: i32, margin: i32) -> bool {
        let (lw, lh) = (self.logical_width, self.logical_height);
        !((x + w + margin) < 0
            || (x - margin) as f32 > lw
            || (y + h + margin) < 0
            || (y - margin) as f32 > lh)
    }

    pub fn is_rect_fully_inside(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        x >= 0
            && y >= 0
            && (x + w) as f32 <= self.logical_width
            && (y + h) as f32 <= self.logical_height
    }

    /// Tiles of floor `z` that can land on screen, by inverting the
    /// screen transform. Includes the safety margin; clamped to the map.
    pub fn floor_bounds(&self, z: i32) -> TileBounds {
        let offset = self.layer_offset(z);
        let left = self.scroll_x + offset - TILE_SIZE;
        let top = self.scroll_y + offset - TILE_SIZE;
        let right = self.scroll_x + offset + self.logical_width.ceil() as i32;
        let bottom = self.scroll_y + offset + self.logical_height.ceil() as i32;
        TileBounds::new(
            left.div_euclid(TILE_SIZE),
            top.div_euclid(TILE_SIZE),
            right.div_euclid(TILE_SIZE),
            bottom.div_euclid(TILE_SIZE),
        )
        .expanded(SAFETY_MARGIN / TILE_SIZE)
        .clamped()
    }

    /// Map tile under a screen pixel on the current floor.
    pub fn map_position(&self, screen_x: f32, screen_y: f32) -> (i32, i32) {
        let offset = self.layer_offset(self.floor);
        let px = (screen_x * self.zoom) as i32 + self.scroll_x + offset;
        let py = (screen_y * self.zoom) as i32 + self.scroll_y + offset;
        (px.div_euclid(TILE_SIZE), py.div_euclid(TILE_SIZE))
    }

    #[inline]
    pub fn is_detail_zoom(&self) -> bool {
        self.zoom < ZOOM_DETAIL_LIMIT
    }
}
