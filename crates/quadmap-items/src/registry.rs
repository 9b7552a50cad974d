use std::fs;
use std::path::Path;

use hashbrown::HashMap;

use crate::config::{AssetsConfig, AtlasDef, EditorSpritesDef, ItemDef, SpriteDef};
use crate::error::ItemsError;
use crate::sprite::{Animator, AtlasRegion, EditorSprite, SpriteMeta, SpriteProvider};
use crate::types::{BorderAlignment, ItemFlags, ItemId, ItemType, SpriteId, SpriteLight};

/// Item-type lookup used by the renderer.
pub trait ItemTypes: Send + Sync {
    fn item_type(&self, id: ItemId) -> Option<&ItemType>;
}

#[derive(Clone, Debug, Default)]
pub struct ItemDatabase {
    types: HashMap<ItemId, ItemType>,
}

impl ItemDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: &[ItemDef]) -> Result<Self, ItemsError> {
        let mut db = ItemDatabase::new();
        for def in defs {
            let mut flags = ItemFlags::empty();
            for name in &def.flags {
                let f = ItemFlags::from_name(name).ok_or_else(|| ItemsError::UnknownFlag {
                    item: def.id,
                    flag: name.clone(),
                })?;
                flags.insert(f);
            }
            let border_alignment = match def.border_alignment.as_deref() {
                Some("horizontal") => BorderAlignment::Horizontal,
                Some("vertical") => BorderAlignment::Vertical,
                _ => BorderAlignment::None,
            };
            let light = def
                .light
                .as_ref()
                .map(|l| SpriteLight::new(l.intensity, l.color))
                .unwrap_or_default();
            db.insert(ItemType {
                id: def.id,
                name: def.name.clone(),
                sprite_id: def.sprite,
                flags,
                light,
                minimap_color: def.minimap,
                border_alignment,
            })?;
        }
        Ok(db)
    }

    pub fn insert(&mut self, ty: ItemType) -> Result<(), ItemsError> {
        if self.types.contains_key(&ty.id) {
            return Err(ItemsError::DuplicateId {
                kind: "item",
                id: u32::from(ty.id),
            });
        }
        self.types.insert(ty.id, ty);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ItemTypes for ItemDatabase {
    fn item_type(&self, id: ItemId) -> Option<&ItemType> {
        self.types.get(&id)
    }
}

/// Sprite metadata plus a grid-addressed layered atlas.
#[derive(Clone, Debug, Default)]
pub struct SpriteCatalog {
    atlas: AtlasDef,
    editor: EditorSpritesDef,
    sprites: HashMap<SpriteId, SpriteMeta>,
    creatures: HashMap<u16, SpriteId>,
}

impl SpriteCatalog {
    pub fn new(atlas: AtlasDef) -> Self {
        Self {
            atlas,
            ..Default::default()
        }
    }

    pub fn from_config(cfg: &AssetsConfig) -> Result<Self, ItemsError> {
        let mut cat = SpriteCatalog::new(cfg.atlas.clone());
        cat.editor = cfg.editor.clone();
        for def in &cfg.sprites {
            cat.insert(sprite_from_def(def)?)?;
        }
        for c in &cfg.creatures {
            if cat.creatures.insert(c.look_type, c.sprite).is_some() {
                return Err(ItemsError::DuplicateId {
                    kind: "creature",
                    id: u32::from(c.look_type),
                });
            }
        }
        Ok(cat)
    }

    pub fn insert(&mut self, meta: SpriteMeta) -> Result<(), ItemsError> {
        if self.sprites.contains_key(&meta.id) {
            return Err(ItemsError::DuplicateId {
                kind: "sprite",
                id: u32::from(meta.id),
            });
        }
        self.sprites.insert(meta.id, meta);
        Ok(())
    }

    pub fn set_editor_sprites(&mut self, editor: EditorSpritesDef) {
        self.editor = editor;
    }

    pub fn map_creature(&mut self, look_type: u16, sprite: SpriteId) {
        self.creatures.insert(look_type, sprite);
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    fn cells_per_page(&self) -> u32 {
        self.atlas.columns.max(1) * self.atlas.rows.max(1)
    }
}

fn sprite_from_def(def: &SpriteDef) -> Result<SpriteMeta, ItemsError> {
    let mut meta = SpriteMeta {
        id: def.id,
        width: def.width.max(1),
        height: def.height.max(1),
        layers: def.layers.max(1),
        pattern_x: def.pattern_x.max(1),
        pattern_y: def.pattern_y.max(1),
        pattern_z: def.pattern_z.max(1),
        frames: def.frames.max(1),
        draw_offset_x: def.draw_offset.0,
        draw_offset_y: def.draw_offset.1,
        draw_height: def.draw_height,
        images: Vec::new(),
        animator: None,
    };
    meta.images = match (&def.images, def.first_image) {
        (Some(list), _) if !list.is_empty() => list.clone(),
        (_, Some(first)) => {
            let n = meta.image_count_for_layout() as u32;
            (first..first + n).collect()
        }
        _ => return Err(ItemsError::MissingImages { sprite: def.id }),
    };
    if let Some(anim) = &def.animation {
        let mut a = match &anim.durations_ms {
            Some(d) if !d.is_empty() => Animator {
                durations_ms: d.clone(),
                start_frame: 0,
            },
            _ => Animator::uniform(u32::from(meta.frames), anim.frame_ms.unwrap_or(500)),
        };
        a.start_frame = anim.start_frame.min(a.frame_count().saturating_sub(1));
        meta.animator = Some(a);
    }
    Ok(meta)
}

impl SpriteProvider for SpriteCatalog {
    fn sprite(&self, id: SpriteId) -> Option<&SpriteMeta> {
        self.sprites.get(&id)
    }

    fn region(&self, image_id: u32) -> Option<AtlasRegion> {
        let per_page = self.cells_per_page();
        let page = image_id / per_page;
        if page >= self.atlas.pages {
            return None;
        }
        let local = image_id % per_page;
        let cols = self.atlas.columns.max(1);
        let rows = self.atlas.rows.max(1);
        let (col, row) = (local % cols, local / cols);
        Some(AtlasRegion {
            layer: page,
            u_min: col as f32 / cols as f32,
            v_min: row as f32 / rows as f32,
            u_max: (col + 1) as f32 / cols as f32,
            v_max: (row + 1) as f32 / rows as f32,
        })
    }

    fn creature_sprite(&self, look_type: u16) -> Option<&SpriteMeta> {
        self.creatures
            .get(&look_type)
            .and_then(|id| self.sprites.get(id))
    }

    fn editor_sprite(&self, kind: EditorSprite) -> Option<AtlasRegion> {
        let e = &self.editor;
        let image = match kind {
            EditorSprite::Waypoint => e.waypoint,
            EditorSprite::HouseExit => e.house_exit,
            EditorSprite::TownTemple => e.town_temple,
            EditorSprite::Spawn => e.spawn,
            EditorSprite::Zone => e.zone,
            EditorSprite::DoorLocked => e.door_locked,
            EditorSprite::DoorUnlocked => e.door_unlocked,
            EditorSprite::HookSouth => e.hook_south,
            EditorSprite::HookEast => e.hook_east,
        }?;
        self.region(image)
    }

    fn white_pixel(&self) -> Option<AtlasRegion> {
        self.atlas.white_pixel.and_then(|id| self.region(id))
    }
}

/// Both halves of an asset file.
pub struct Assets {
    pub items: ItemDatabase,
    pub sprites: SpriteCatalog,
}

impl Assets {
    pub fn from_toml_str(src: &str) -> Result<Self, ItemsError> {
        let cfg: AssetsConfig = toml::from_str(src)?;
        Self::from_config(&cfg)
    }

    pub fn from_config(cfg: &AssetsConfig) -> Result<Self, ItemsError> {
        let items = ItemDatabase::from_defs(&cfg.items)?;
        let sprites = SpriteCatalog::from_config(cfg)?;
        log::info!(
            "loaded {} item types and {} sprites",
            items.len(),
            sprites.len()
        );
        Ok(Self { items, sprites })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ItemsError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ItemsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }
}
