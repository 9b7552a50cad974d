use quadmap_items::AtlasRegion;

use crate::color::Rgba;

/// One textured quad in logical (unzoomed) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstance {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub region: AtlasRegion,
    pub tint: Rgba,
}

impl SpriteInstance {
    #[inline]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Where draw calls end up. The GPU backend implements this on the render
/// thread; collectors implement it to capture geometry off-thread.
pub trait DrawSurface {
    fn draw_sprite(&mut self, x: f32, y: f32, w: f32, h: f32, region: &AtlasRegion, tint: Rgba);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);

    fn outline_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.fill_rect(x, y, w, 1.0, color);
        self.fill_rect(x, y + h - 1.0, w, 1.0, color);
        self.fill_rect(x, y + 1.0, 1.0, h - 2.0, color);
        self.fill_rect(x + w - 1.0, y + 1.0, 1.0, h - 2.0, color);
    }

    /// Submits prebuilt geometry shifted by `(dx, dy)`.
    fn submit_instances(&mut self, instances: &[SpriteInstance], dx: f32, dy: f32) {
        for i in instances {
            self.draw_sprite(i.x + dx, i.y + dy, i.w, i.h, &i.region, i.tint);
        }
    }

    fn report_missing_sprite(&mut self, _image_id: u32) {}
}

/// Captures draws as instances; used to build chunk geometry on workers.
#[derive(Clone, Debug, Default)]
pub struct SpriteCollector {
    white: Option<AtlasRegion>,
    instances: Vec<SpriteInstance>,
    missing: Vec<u32>,
    dropped_fills: usize,
}

impl SpriteCollector {
    /// `white` is the atlas region used to express flat fills as quads.
    pub fn new(white: Option<AtlasRegion>) -> Self {
        Self {
            white,
            ..Default::default()
        }
    }

    #[inline]
    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    pub fn missing(&self) -> &[u32] {
        &self.missing
    }

    pub fn dropped_fills(&self) -> usize {
        self.dropped_fills
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.missing.clear();
        self.dropped_fills = 0;
    }

    pub fn into_instances(self) -> Vec<SpriteInstance> {
        self.instances
    }
}

impl DrawSurface for SpriteCollector {
    fn draw_sprite(&mut self, x: f32, y: f32, w: f32, h: f32, region: &AtlasRegion, tint: Rgba) {
        self.instances.push(SpriteInstance {
            x,
            y,
            w,
            h,
            region: *region,
            tint,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        match self.white {
            Some(region) => self.draw_sprite(x, y, w, h, &region, color),
            None => self.dropped_fills += 1,
        }
    }

    fn submit_instances(&mut self, instances: &[SpriteInstance], dx: f32, dy: f32) {
        self.instances
            .extend(instances.iter().map(|i| i.translated(dx, dy)));
    }

    fn report_missing_sprite(&mut self, image_id: u32) {
        self.missing.push(image_id);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Sprite(SpriteInstance),
    Fill {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    },
    Outline {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    },
}

/// Headless surface that records every command in submission order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
    pub batches: usize,
    pub missing: Vec<u32>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.batches = 0;
        self.missing.clear();
    }

    pub fn sprites(&self) -> impl Iterator<Item = &SpriteInstance> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Sprite(s) => Some(s),
            _ => None,
        })
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites().count()
    }

    pub fn fills(&self) -> impl Iterator<Item = (f32, f32, f32, f32, Rgba)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            DrawCommand::Fill { x, y, w, h, color } => Some((x, y, w, h, color)),
            _ => None,
        })
    }
}

impl DrawSurface for RecordingSurface {
    fn draw_sprite(&mut self, x: f32, y: f32, w: f32, h: f32, region: &AtlasRegion, tint: Rgba) {
        self.commands.push(DrawCommand::Sprite(SpriteInstance {
            x,
            y,
            w,
            h,
            region: *region,
            tint,
        }));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.commands.push(DrawCommand::Fill { x, y, w, h, color });
    }

    fn outline_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.commands
            .push(DrawCommand::Outline { x, y, w, h, color });
    }

    fn submit_instances(&mut self, instances: &[SpriteInstance], dx: f32, dy: f32) {
        self.batches += 1;
        self.commands.extend(
            instances
                .iter()
                .map(|i| DrawCommand::Sprite(i.translated(dx, dy))),
        );
    }

    fn report_missing_sprite(&mut self, image_id: u32) {
        self.missing.push(image_id);
    }
}
