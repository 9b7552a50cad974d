use hashbrown::HashMap;
use quadmap_geom::{GROUND_LAYER, MAP_MAX_HEIGHT, MAP_MAX_WIDTH};
use quadmap_items::SpriteLight;

/// A light in map tile coordinates, already projected onto the ground floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Light {
    pub x: u16,
    pub y: u16,
    pub color: u8,
    pub intensity: u8,
}

/// Anything that accepts light contributions while tiles are drawn.
pub trait LightSink {
    fn add_light(&mut self, x: i32, y: i32, z: i32, light: SpriteLight);
}

/// Frame-wide light list. One entry per (x, y, colour); a repeated key keeps
/// the strongest intensity.
#[derive(Clone, Debug, Default)]
pub struct LightBuffer {
    lights: Vec<Light>,
    index: HashMap<(u16, u16, u8), usize>,
}

impl LightBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lights.clear();
        self.index.clear();
    }

    #[inline]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Adds a light already expressed in ground-floor coordinates.
    pub fn add_projected(&mut self, x: i32, y: i32, light: SpriteLight) {
        if x <= 0 || x >= MAP_MAX_WIDTH || y <= 0 || y >= MAP_MAX_HEIGHT {
            return;
        }
        let key = (x as u16, y as u16, light.color);
        match self.index.get(&key) {
            Some(&i) => {
                let existing = &mut self.lights[i];
                existing.intensity = existing.intensity.max(light.intensity);
            }
            None => {
                self.index.insert(key, self.lights.len());
                self.lights.push(Light {
                    x: key.0,
                    y: key.1,
                    color: light.color,
                    intensity: light.intensity,
                });
            }
        }
    }

    pub fn merge(&mut self, collected: &LightCollector) {
        for &(x, y, z, light) in collected.entries() {
            self.add_light(x, y, z, light);
        }
    }
}

impl LightSink for LightBuffer {
    fn add_light(&mut self, x: i32, y: i32, z: i32, light: SpriteLight) {
        let (x, y) = if z <= GROUND_LAYER {
            let shift = GROUND_LAYER - z;
            (x - shift, y - shift)
        } else {
            (x, y)
        };
        self.add_projected(x, y, light);
    }
}

/// Append-only light capture used while building a chunk off-thread.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightCollector {
    entries: Vec<(i32, i32, i32, SpriteLight)>,
}

impl LightCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(i32, i32, i32, SpriteLight)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LightSink for LightCollector {
    fn add_light(&mut self, x: i32, y: i32, z: i32, light: SpriteLight) {
        self.entries.push((x, y, z, light));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keeps_max_intensity() {
        let mut buf = LightBuffer::new();
        buf.add_light(20, 20, 7, SpriteLight::new(50, 3));
        buf.add_light(20, 20, 7, SpriteLight::new(200, 3));
        buf.add_light(20, 20, 7, SpriteLight::new(10, 3));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.lights()[0].intensity, 200);
    }

    #[test]
    fn colour_is_part_of_the_key() {
        let mut buf = LightBuffer::new();
        buf.add_light(20, 20, 7, SpriteLight::new(5, 3));
        buf.add_light(20, 20, 7, SpriteLight::new(5, 4));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn upper_floors_shift_toward_origin() {
        let mut buf = LightBuffer::new();
        buf.add_light(20, 20, 5, SpriteLight::new(5, 1));
        buf.add_light(20, 20, 9, SpriteLight::new(5, 1));
        assert_eq!((buf.lights()[0].x, buf.lights()[0].y), (18, 18));
        assert_eq!((buf.lights()[1].x, buf.lights()[1].y), (20, 20));
    }

    #[test]
    fn edge_positions_are_dropped() {
        let mut buf = LightBuffer::new();
        buf.add_light(0, 5, 8, SpriteLight::new(5, 1));
        buf.add_light(5, MAP_MAX_HEIGHT, 8, SpriteLight::new(5, 1));
        buf.add_light(1, 1, 6, SpriteLight::new(5, 1));
        assert!(buf.is_empty());
        buf.clear();
        buf.add_light(5, 5, 8, SpriteLight::new(5, 1));
        assert_eq!(buf.len(), 1);
        buf.clear();
        assert!(buf.is_empty());
    }
}
