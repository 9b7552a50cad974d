//! CPU light map: ambient base plus radial falloff per light, max-blended.

use quadmap_geom::TILE_SIZE;
use rayon::prelude::*;

use crate::color::Rgba;
use crate::light::Light;
use crate::options::DrawingOptions;
use crate::view::RenderView;

/// Light texture covering the viewport. Texel `(0, 0)` sits at the screen
/// origin; each texel spans `texel_size` logical pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct LightMap {
    pub width: u32,
    pub height: u32,
    pub texel_size: u32,
    pub texels: Vec<[u8; 4]>,
}

impl LightMap {
    fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            texel_size: u32::MAX,
            texels: vec![color],
        }
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Texel covering a logical screen pixel, clamped to the edges.
    pub fn sample(&self, x: f32, y: f32) -> [u8; 4] {
        if self.is_placeholder() {
            return self.texels[0];
        }
        let ts = self.texel_size.max(1) as f32;
        let tx = ((x / ts).max(0.0) as u32).min(self.width - 1);
        let ty = ((y / ts).max(0.0) as u32).min(self.height - 1);
        self.texels[(ty * self.width + tx) as usize]
    }
}

#[derive(Clone, Copy, Debug)]
struct ScreenLight {
    x: f32,
    y: f32,
    radius: f32,
    rgb: [f32; 3],
}

pub struct LightMapGenerator {
    texel_size: u32,
    intensity: f32,
    map: LightMap,
    placeholder: LightMap,
    last_was_placeholder: bool,
}

impl LightMapGenerator {
    pub fn new(texel_size: u32) -> Self {
        Self {
            texel_size: texel_size.max(1),
            intensity: 1.0,
            map: LightMap {
                width: 0,
                height: 0,
                texel_size: texel_size.max(1),
                texels: Vec::new(),
            },
            placeholder: LightMap::solid([255, 255, 255, 255]),
            last_was_placeholder: true,
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 4.0);
    }

    /// Ambient colour: the global light scaled by the ambient level; a black
    /// global light falls back to a neutral half ambient.
    pub fn ambient_color(options: &DrawingOptions) -> [u8; 4] {
        let level = options.ambient_light.clamp(0.0, 1.0);
        let (r, g, b) = if options.global_light_color == 0 {
            (0.5 * level, 0.5 * level, 0.5 * level)
        } else {
            let c = Rgba::from_8bit(options.global_light_color);
            (
                f32::from(c.r) / 255.0 * level,
                f32::from(c.g) / 255.0 * level,
                f32::from(c.b) / 255.0 * level,
            )
        };
        [to_u8(r), to_u8(g), to_u8(b), 255]
    }

    fn placeholder(&mut self, ambient: [u8; 4]) -> &LightMap {
        if self.placeholder.texels[0] != ambient {
            self.placeholder = LightMap::solid(ambient);
        }
        self.last_was_placeholder = true;
        &self.placeholder
    }

    pub fn last(&self) -> &LightMap {
        if self.last_was_placeholder {
            &self.placeholder
        } else {
            &self.map
        }
    }

    pub fn generate(
        &mut self,
        view: &RenderView,
        lights: &[Light],
        options: &DrawingOptions,
    ) -> &LightMap {
        let ambient = Self::ambient_color(options);
        if lights.is_empty() {
            return self.placeholder(ambient);
        }
        let ts = self.texel_size;
        let width = (view.logical_width / ts as f32).ceil() as u32;
        let height = (view.logical_height / ts as f32).ceil() as u32;
        if width == 0 || height == 0 {
            log::warn!(target: "lightmap", "degenerate viewport {}x{}", view.logical_width, view.logical_height);
            return self.placeholder(ambient);
        }
        let n = width as usize * height as usize;
        self.map.texels.clear();
        if self.map.texels.try_reserve_exact(n).is_err() {
            log::warn!(target: "lightmap", "cannot allocate {width}x{height} light map");
            return self.placeholder(ambient);
        }
        self.map.texels.resize(n, ambient);
        self.map.width = width;
        self.map.height = height;
        self.map.texel_size = ts;

        let (sw, sh) = (view.logical_width, view.logical_height);
        let strength = self.intensity;
        let screen: Vec<ScreenLight> = lights
            .iter()
            .filter_map(|l| {
                let radius = (i32::from(l.intensity) * TILE_SIZE + TILE_SIZE / 2) as f32;
                let x = (i32::from(l.x) * TILE_SIZE + TILE_SIZE / 2 - view.scroll_x) as f32;
                let y = (i32::from(l.y) * TILE_SIZE + TILE_SIZE / 2 - view.scroll_y) as f32;
                if x + radius < 0.0 || x - radius > sw || y + radius < 0.0 || y - radius > sh {
                    return None;
                }
                let c = Rgba::from_8bit(l.color);
                Some(ScreenLight {
                    x,
                    y,
                    radius,
                    rgb: [
                        f32::from(c.r) / 255.0 * strength,
                        f32::from(c.g) / 255.0 * strength,
                        f32::from(c.b) / 255.0 * strength,
                    ],
                })
            })
            .collect();

        self.map
            .texels
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(row, line)| {
                let cy = (row as u32 * ts + ts / 2) as f32;
                for l in &screen {
                    let dy = cy - l.y;
                    if dy.abs() > l.radius {
                        continue;
                    }
                    let x0 = (((l.x - l.radius) / ts as f32).floor().max(0.0)) as usize;
                    let x1 = (((l.x + l.radius) / ts as f32).ceil() as usize).min(line.len());
                    for (col, texel) in line.iter_mut().enumerate().take(x1).skip(x0) {
                        let cx = (col as u32 * ts + ts / 2) as f32;
                        let dx = cx - l.x;
                        let d = (dx * dx + dy * dy).sqrt() / l.radius;
                        if d >= 1.0 {
                            continue;
                        }
                        let a = (1.0 - d) * (1.0 - d);
                        for ch in 0..3 {
                            texel[ch] = texel[ch].max(to_u8(l.rgb[ch] * a));
                        }
                    }
                }
            });
        log::trace!(target: "lightmap", "{} lights into {width}x{height}", screen.len());
        self.last_was_placeholder = false;
        &self.map
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Camera;

    fn view() -> RenderView {
        let camera = Camera {
            screen_width: 320,
            screen_height: 320,
            ..Camera::default()
        };
        RenderView::setup(&camera, &DrawingOptions::default())
    }

    #[test]
    fn no_lights_yields_cached_ambient_placeholder() {
        let mut lm = LightMapGenerator::new(8);
        let options = DrawingOptions::default();
        let map = lm.generate(&view(), &[], &options);
        assert!(map.is_placeholder());
        assert_eq!(map.texels[0], LightMapGenerator::ambient_color(&options));
    }

    #[test]
    fn light_brightens_its_center_only() {
        let mut lm = LightMapGenerator::new(8);
        let options = DrawingOptions {
            ambient_light: 0.2,
            ..DrawingOptions::default()
        };
        let ambient = LightMapGenerator::ambient_color(&options);
        let light = Light {
            x: 5,
            y: 5,
            color: 215,
            intensity: 2,
        };
        let map = lm.generate(&view(), &[light], &options);
        assert!(!map.is_placeholder());
        assert_eq!((map.width, map.height), (40, 40));
        let center = map.sample(176.0, 176.0);
        assert!(center[0] > ambient[0]);
        assert_eq!(map.sample(319.0, 0.0), ambient);
    }

    #[test]
    fn black_global_light_uses_half_ambient() {
        let options = DrawingOptions {
            global_light_color: 0,
            ambient_light: 1.0,
            ..DrawingOptions::default()
        };
        assert_eq!(LightMapGenerator::ambient_color(&options), [128, 128, 128, 255]);
    }
}
