use quadmap_geom::Position;

pub type ItemId = u16;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    /// Stack count for stackables, fluid kind for splashes and containers.
    pub subtype: u16,
    pub action_id: u16,
    pub unique_id: u16,
    pub door_id: u8,
    pub locked: bool,
    pub selected: bool,
    pub text: Option<String>,
}

impl Item {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_subtype(id: ItemId, subtype: u16) -> Self {
        Self {
            id,
            subtype,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    #[default]
    South,
    West,
}

impl Direction {
    /// Horizontal pattern column used by outfit sprites.
    #[inline]
    pub fn pattern(self) -> u32 {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Creature {
    pub name: String,
    pub look_type: u16,
    pub direction: Direction,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Spawn {
    pub radius: u8,
    pub selected: bool,
}

/// Zone flags stored on a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MapFlags(pub u32);

impl MapFlags {
    pub const PROTECTION_ZONE: u32 = 1 << 0;
    pub const NO_PVP: u32 = 1 << 2;
    pub const NO_LOGOUT: u32 = 1 << 3;
    pub const PVP_ZONE: u32 = 1 << 4;

    #[inline]
    pub fn has(&self, mask: u32) -> bool {
        self.0 & mask != 0
    }
    #[inline]
    pub fn set(&mut self, mask: u32) {
        self.0 |= mask;
    }
    #[inline]
    pub fn clear(&mut self, mask: u32) {
        self.0 &= !mask;
    }
    #[inline]
    pub fn is_pz(&self) -> bool {
        self.has(Self::PROTECTION_ZONE)
    }
    #[inline]
    pub fn is_no_pvp(&self) -> bool {
        self.has(Self::NO_PVP)
    }
    #[inline]
    pub fn is_no_logout(&self) -> bool {
        self.has(Self::NO_LOGOUT)
    }
    #[inline]
    pub fn is_pvp_zone(&self) -> bool {
        self.has(Self::PVP_ZONE)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub position: Position,
    pub ground: Option<Item>,
    /// Bottom to top; insertion order is draw order.
    pub items: Vec<Item>,
    pub creature: Option<Creature>,
    pub spawn: Option<Spawn>,
    pub house_id: u32,
    pub flags: MapFlags,
    pub selected: bool,
    pub modified: bool,
    pub last_modified: u64,
}

impl Tile {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_ground(mut self, ground: Item) -> Self {
        self.ground = Some(ground);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    #[inline]
    pub fn is_house_tile(&self) -> bool {
        self.house_id != 0
    }

    pub fn is_empty(&self) -> bool {
        self.ground.is_none() && self.items.is_empty() && self.creature.is_none() && self.spawn.is_none()
    }
}

/// One slot of a floor: the tile plus editor metadata that lives beside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileLocation {
    pub position: Position,
    pub tile: Option<Tile>,
    pub waypoint_count: u16,
    /// Number of spawns whose radius covers this location.
    pub spawn_count: u16,
    /// Houses that use this location as their exit.
    pub house_exits: Vec<u32>,
    pub town_exit: bool,
}

impl TileLocation {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    #[inline]
    pub fn tile(&self) -> Option<&Tile> {
        self.tile.as_ref()
    }

    #[inline]
    pub fn is_house_exit(&self) -> bool {
        !self.house_exits.is_empty()
    }

    #[inline]
    pub fn has_house_exit(&self, house_id: u32) -> bool {
        self.house_exits.contains(&house_id)
    }
}
