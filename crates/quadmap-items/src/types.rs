pub type ItemId = u16;
pub type SpriteId = u16;

/// Light emitted by an item: radius in tiles and an 8-bit palette colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpriteLight {
    pub intensity: u8,
    pub color: u8,
}

impl SpriteLight {
    #[inline]
    pub const fn new(intensity: u8, color: u8) -> Self {
        Self { intensity, color }
    }

    #[inline]
    pub fn is_lit(&self) -> bool {
        self.intensity > 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BorderAlignment {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Behaviour bits of an item type that influence how it is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ItemFlags(u32);

impl ItemFlags {
    pub const GROUND: ItemFlags = ItemFlags(1 << 0);
    pub const BORDER: ItemFlags = ItemFlags(1 << 1);
    pub const STACKABLE: ItemFlags = ItemFlags(1 << 2);
    pub const HANGABLE: ItemFlags = ItemFlags(1 << 3);
    pub const HOOK_SOUTH: ItemFlags = ItemFlags(1 << 4);
    pub const HOOK_EAST: ItemFlags = ItemFlags(1 << 5);
    pub const SPLASH: ItemFlags = ItemFlags(1 << 6);
    pub const FLUID_CONTAINER: ItemFlags = ItemFlags(1 << 7);
    pub const PICKUPABLE: ItemFlags = ItemFlags(1 << 8);
    pub const META: ItemFlags = ItemFlags(1 << 9);
    pub const DOOR: ItemFlags = ItemFlags(1 << 10);
    pub const BLOCKING: ItemFlags = ItemFlags(1 << 11);

    #[inline]
    pub const fn empty() -> Self {
        ItemFlags(0)
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, other: ItemFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: ItemFlags) {
        self.0 |= other.0;
    }

    pub fn from_name(name: &str) -> Option<ItemFlags> {
        Some(match name {
            "ground" => Self::GROUND,
            "border" => Self::BORDER,
            "stackable" => Self::STACKABLE,
            "hangable" => Self::HANGABLE,
            "hook_south" => Self::HOOK_SOUTH,
            "hook_east" => Self::HOOK_EAST,
            "splash" => Self::SPLASH,
            "fluid_container" => Self::FLUID_CONTAINER,
            "pickupable" => Self::PICKUPABLE,
            "meta" => Self::META,
            "door" => Self::DOOR,
            "blocking" => Self::BLOCKING,
            _ => return None,
        })
    }
}

impl core::ops::BitOr for ItemFlags {
    type Output = ItemFlags;
    fn bitor(self, rhs: ItemFlags) -> ItemFlags {
        ItemFlags(self.0 | rhs.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemType {
    pub id: ItemId,
    pub name: String,
    /// Sprite drawn for this item; 0 means none.
    pub sprite_id: SpriteId,
    pub flags: ItemFlags,
    pub light: SpriteLight,
    pub minimap_color: u8,
    pub border_alignment: BorderAlignment,
}

impl ItemType {
    #[inline]
    pub fn is(&self, flag: ItemFlags) -> bool {
        self.flags.contains(flag)
    }
    #[inline]
    pub fn is_ground(&self) -> bool {
        self.is(ItemFlags::GROUND)
    }
    #[inline]
    pub fn is_border(&self) -> bool {
        self.is(ItemFlags::BORDER)
    }
    #[inline]
    pub fn is_stackable(&self) -> bool {
        self.is(ItemFlags::STACKABLE)
    }
    #[inline]
    pub fn is_hangable(&self) -> bool {
        self.is(ItemFlags::HANGABLE)
    }
    #[inline]
    pub fn is_splash(&self) -> bool {
        self.is(ItemFlags::SPLASH)
    }
    #[inline]
    pub fn is_fluid_container(&self) -> bool {
        self.is(ItemFlags::FLUID_CONTAINER)
    }
    #[inline]
    pub fn is_pickupable(&self) -> bool {
        self.is(ItemFlags::PICKUPABLE)
    }
    #[inline]
    pub fn is_meta(&self) -> bool {
        self.is(ItemFlags::META)
    }
    #[inline]
    pub fn is_door(&self) -> bool {
        self.is(ItemFlags::DOOR)
    }
    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.is(ItemFlags::BLOCKING)
    }
    #[inline]
    pub fn hook_south(&self) -> bool {
        self.is(ItemFlags::HOOK_SOUTH)
    }
    #[inline]
    pub fn hook_east(&self) -> bool {
        self.is(ItemFlags::HOOK_EAST)
    }
    #[inline]
    pub fn has_light(&self) -> bool {
        self.light.is_lit()
    }
}
