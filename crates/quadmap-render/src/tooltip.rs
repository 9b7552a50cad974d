use std::fmt::Write as _;

use quadmap_geom::Position;
use quadmap_items::ItemTypes;
use quadmap_map::{Item, Tile};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tooltip {
    pub pos: Position,
    pub text: String,
}

/// Per-frame tooltip capture for the current floor.
#[derive(Clone, Debug, Default)]
pub struct TooltipCollector {
    tips: Vec<Tooltip>,
}

fn describe(item: &Item, items: &dyn ItemTypes) -> Option<String> {
    if item.action_id == 0 && item.unique_id == 0 && item.door_id == 0 && item.text.is_none() {
        return None;
    }
    let mut s = String::new();
    let name = items
        .item_type(item.id)
        .map(|t| t.name.as_str())
        .filter(|n| !n.is_empty());
    match name {
        Some(n) => {
            let _ = write!(s, "{n} ({})", item.id);
        }
        None => {
            let _ = write!(s, "id {}", item.id);
        }
    }
    if item.action_id != 0 {
        let _ = write!(s, " aid:{}", item.action_id);
    }
    if item.unique_id != 0 {
        let _ = write!(s, " uid:{}", item.unique_id);
    }
    if item.door_id != 0 {
        let _ = write!(s, " door:{}", item.door_id);
    }
    if let Some(text) = &item.text {
        let _ = write!(s, " \"{text}\"");
    }
    Some(s)
}

impl TooltipCollector {
    pub fn clear(&mut self) {
        self.tips.clear();
    }

    pub fn tooltips(&self) -> &[Tooltip] {
        &self.tips
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }

    /// Adds one tooltip for the tile if any of its items carry ids or text.
    pub fn capture(&mut self, tile: &Tile, items: &dyn ItemTypes) {
        let lines: Vec<String> = tile
            .ground
            .iter()
            .chain(tile.items.iter())
            .filter_map(|i| describe(i, items))
            .collect();
        if lines.is_empty() {
            return;
        }
        self.tips.push(Tooltip {
            pos: tile.position,
            text: lines.join("\n"),
        });
    }
}
