use serde::Deserialize;

/// Top-level asset file: atlas layout, sprites, items and editor markers.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AssetsConfig {
    #[serde(default)]
    pub atlas: AtlasDef,
    #[serde(default)]
    pub editor: EditorSpritesDef,
    #[serde(default)]
    pub sprites: Vec<SpriteDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub creatures: Vec<CreatureDef>,
}

/// Atlas is a stack of square pages cut into a uniform grid of cells.
#[derive(Debug, Clone, Deserialize)]
pub struct AtlasDef {
    #[serde(default = "default_cell")]
    pub cell: u32,
    #[serde(default = "default_page_cells")]
    pub columns: u32,
    #[serde(default = "default_page_cells")]
    pub rows: u32,
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// Image id of an opaque white cell, used for flat fills.
    #[serde(default)]
    pub white_pixel: Option<u32>,
}

fn default_cell() -> u32 {
    32
}
fn default_page_cells() -> u32 {
    64
}
fn default_pages() -> u32 {
    16
}

impl Default for AtlasDef {
    fn default() -> Self {
        Self {
            cell: default_cell(),
            columns: default_page_cells(),
            rows: default_page_cells(),
            pages: default_pages(),
            white_pixel: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EditorSpritesDef {
    pub waypoint: Option<u32>,
    pub house_exit: Option<u32>,
    pub town_temple: Option<u32>,
    pub spawn: Option<u32>,
    pub zone: Option<u32>,
    pub door_locked: Option<u32>,
    pub door_unlocked: Option<u32>,
    pub hook_south: Option<u32>,
    pub hook_east: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpriteDef {
    pub id: u16,
    #[serde(default = "one")]
    pub width: u8,
    #[serde(default = "one")]
    pub height: u8,
    #[serde(default = "one")]
    pub layers: u8,
    #[serde(default = "one")]
    pub pattern_x: u8,
    #[serde(default = "one")]
    pub pattern_y: u8,
    #[serde(default = "one")]
    pub pattern_z: u8,
    #[serde(default = "one")]
    pub frames: u8,
    #[serde(default)]
    pub draw_offset: (i32, i32),
    #[serde(default)]
    pub draw_height: i32,
    /// Explicit image ids in index order.
    #[serde(default)]
    pub images: Option<Vec<u32>>,
    /// Alternative to `images`: a consecutive run starting here.
    #[serde(default)]
    pub first_image: Option<u32>,
    #[serde(default)]
    pub animation: Option<AnimationDef>,
}

fn one() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationDef {
    #[serde(default)]
    pub frame_ms: Option<u32>,
    #[serde(default)]
    pub durations_ms: Option<Vec<u32>>,
    #[serde(default)]
    pub start_frame: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LightDef {
    #[serde(default)]
    pub intensity: u8,
    #[serde(default)]
    pub color: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDef {
    pub id: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sprite: u16,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub light: Option<LightDef>,
    #[serde(default)]
    pub minimap: u8,
    #[serde(default)]
    pub border_alignment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatureDef {
    pub look_type: u16,
    pub sprite: u16,
    #[serde(default)]
    pub name: String,
}
