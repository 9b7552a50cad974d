use crate::types::SpriteId;

/// UV rectangle of one image inside a layered atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AtlasRegion {
    pub layer: u32,
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

/// Pattern selection for one draw of a sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpritePatterns {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub frame: u32,
    /// Stack bucket or fluid subtype; -1 when not applicable.
    pub subtype: i32,
}

impl Default for SpritePatterns {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            frame: 0,
            subtype: -1,
        }
    }
}

/// Time-driven frame selection for animated sprites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Animator {
    pub durations_ms: Vec<u32>,
    pub start_frame: u32,
}

impl Animator {
    pub fn uniform(frames: u32, frame_ms: u32) -> Self {
        Self {
            durations_ms: vec![frame_ms.max(1); frames.max(1) as usize],
            start_frame: 0,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.durations_ms.len() as u32
    }

    /// Frame shown at `clock_ms` on a looping timeline.
    pub fn frame_at(&self, clock_ms: u64) -> u32 {
        let total: u64 = self.durations_ms.iter().map(|d| u64::from((*d).max(1))).sum();
        if total == 0 {
            return self.start_frame;
        }
        let mut t = clock_ms % total;
        for (i, d) in self.durations_ms.iter().enumerate() {
            let d = u64::from((*d).max(1));
            if t < d {
                return i as u32;
            }
            t -= d;
        }
        self.start_frame
    }
}

/// Layout and image table of one sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteMeta {
    pub id: SpriteId,
    pub width: u8,
    pub height: u8,
    pub layers: u8,
    pub pattern_x: u8,
    pub pattern_y: u8,
    pub pattern_z: u8,
    pub frames: u8,
    pub draw_offset_x: i32,
    pub draw_offset_y: i32,
    pub draw_height: i32,
    pub images: Vec<u32>,
    pub animator: Option<Animator>,
}

impl SpriteMeta {
    /// Single-cell, single-image sprite.
    pub fn simple(id: SpriteId, image: u32) -> Self {
        Self {
            id,
            width: 1,
            height: 1,
            layers: 1,
            pattern_x: 1,
            pattern_y: 1,
            pattern_z: 1,
            frames: 1,
            draw_offset_x: 0,
            draw_offset_y: 0,
            draw_height: 0,
            images: vec![image],
            animator: None,
        }
    }

    pub fn image_count_for_layout(&self) -> usize {
        [
            self.width,
            self.height,
            self.layers,
            self.pattern_x,
            self.pattern_y,
            self.pattern_z,
            self.frames,
        ]
        .iter()
        .map(|v| (*v).max(1) as usize)
        .product()
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.frames > 1 && self.animator.is_some()
    }

    /// Linear image index for a cell, layer and pattern, frame-major.
    /// Indices past the end of the image table wrap around.
    pub fn sprite_index(&self, cx: u32, cy: u32, layer: u32, p: &SpritePatterns) -> usize {
        let d = |v: u8| usize::from(v.max(1));
        let step = |index: usize, dim: usize, add: u32| {
            index.saturating_mul(dim).saturating_add(add as usize)
        };
        let mut index = p.frame as usize % d(self.frames);
        index = step(index, d(self.pattern_z), p.z);
        index = step(index, d(self.pattern_y), p.y);
        index = step(index, d(self.pattern_x), p.x);
        index = step(index, d(self.layers), layer);
        index = step(index, d(self.height), cy);
        index = step(index, d(self.width), cx);
        index % self.images.len().max(1)
    }

    pub fn image_at(&self, cx: u32, cy: u32, layer: u32, p: &SpritePatterns) -> Option<u32> {
        self.images.get(self.sprite_index(cx, cy, layer, p)).copied()
    }
}

/// Editor-only marker and indicator sprites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditorSprite {
    Waypoint,
    HouseExit,
    TownTemple,
    Spawn,
    Zone,
    DoorLocked,
    DoorUnlocked,
    HookSouth,
    HookEast,
}

/// Sprite metadata and atlas lookups required by the tile renderer.
pub trait SpriteProvider: Send + Sync {
    fn sprite(&self, id: SpriteId) -> Option<&SpriteMeta>;
    fn region(&self, image_id: u32) -> Option<AtlasRegion>;
    fn creature_sprite(&self, look_type: u16) -> Option<&SpriteMeta>;
    fn editor_sprite(&self, kind: EditorSprite) -> Option<AtlasRegion>;
    fn white_pixel(&self) -> Option<AtlasRegion>;
}
