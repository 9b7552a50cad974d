use serde::Deserialize;

/// What the map view shows and how.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawingOptions {
    pub transparent_floors: bool,
    pub transparent_items: bool,
    pub show_all_floors: bool,
    pub show_shade: bool,

    pub show_creatures: bool,
    pub show_spawns: bool,
    pub show_items: bool,
    pub show_tech_items: bool,
    pub show_waypoints: bool,

    pub show_grid: bool,
    pub show_lights: bool,
    pub show_light_strength: bool,
    pub show_houses: bool,
    pub show_special_tiles: bool,
    pub show_towns: bool,
    pub show_blocking: bool,
    pub show_tooltips: bool,
    pub show_preview: bool,
    pub show_hooks: bool,
    pub show_ingame_box: bool,

    pub highlight_items: bool,
    pub highlight_locked_doors: bool,

    pub ingame: bool,
    pub as_minimap: bool,
    pub only_colors: bool,
    pub only_modified: bool,
    pub always_show_zones: bool,

    pub hide_items_when_zoomed: bool,
    pub extended_house_shader: bool,
    /// 0..=1 blend used to pulse the current house tint.
    pub highlight_pulse: f32,

    pub ambient_light: f32,
    /// 8-bit palette colour of global light; 0 disables it.
    pub global_light_color: u8,

    pub use_chunk_cache: bool,
}

impl Default for DrawingOptions {
    fn default() -> Self {
        Self {
            transparent_floors: false,
            transparent_items: false,
            show_all_floors: true,
            show_shade: true,
            show_creatures: true,
            show_spawns: true,
            show_items: true,
            show_tech_items: true,
            show_waypoints: true,
            show_grid: false,
            show_lights: false,
            show_light_strength: false,
            show_houses: true,
            show_special_tiles: true,
            show_towns: false,
            show_blocking: false,
            show_tooltips: false,
            show_preview: false,
            show_hooks: false,
            show_ingame_box: false,
            highlight_items: false,
            highlight_locked_doors: true,
            ingame: false,
            as_minimap: false,
            only_colors: false,
            only_modified: false,
            always_show_zones: true,
            hide_items_when_zoomed: true,
            extended_house_shader: false,
            highlight_pulse: 0.0,
            ambient_light: 0.5,
            global_light_color: 215,
            use_chunk_cache: true,
        }
    }
}

impl DrawingOptions {
    /// In-game look: no editor overlays or tints.
    pub fn ingame() -> Self {
        Self {
            ingame: true,
            show_grid: false,
            show_houses: false,
            show_special_tiles: false,
            show_blocking: false,
            show_tooltips: false,
            show_preview: false,
            show_tech_items: false,
            ..Self::default()
        }
    }

    #[inline]
    pub fn should_draw_lights(&self) -> bool {
        self.show_lights && !self.as_minimap
    }

    #[inline]
    pub fn should_draw_entities(&self) -> bool {
        (self.show_creatures || self.show_spawns) && !self.as_minimap
    }

    #[inline]
    pub fn has_overlays(&self) -> bool {
        self.show_grid
            || self.show_houses
            || self.show_special_tiles
            || self.show_blocking
            || self.show_tooltips
            || self.show_waypoints
    }

    /// Whether any option can tint tiles away from plain white.
    #[inline]
    pub fn has_color_modifications(&self) -> bool {
        self.show_blocking
            || self.highlight_items
            || self.show_spawns
            || self.show_houses
            || self.show_special_tiles
    }
}
