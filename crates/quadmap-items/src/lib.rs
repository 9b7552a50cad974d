//! Item types, sprite metadata and the asset database feeding the renderer.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod registry;
pub mod sprite;
pub mod types;

pub use error::ItemsError;
pub use registry::{Assets, ItemDatabase, ItemTypes, SpriteCatalog};
pub use sprite::{Animator, AtlasRegion, EditorSprite, SpriteMeta, SpritePatterns, SpriteProvider};
pub use types::{BorderAlignment, ItemFlags, ItemId, ItemType, SpriteId, SpriteLight};
