#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Expands an 8-bit palette index on the 6x6x6 colour cube.
    #[inline]
    pub fn from_8bit(c: u8) -> Self {
        let c = u32::from(c);
        let r = (c / 36 % 6 * 51) as u8;
        let g = (c / 6 % 6 * 51) as u8;
        let b = (c % 6 * 51) as u8;
        Self::rgb(r, g, b)
    }

    #[inline]
    pub fn halved_rgb(self) -> Self {
        Self::new(self.r / 2, self.g / 2, self.b / 2, self.a)
    }

    #[inline]
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Multiplies alpha by `alpha / 255`.
    #[inline]
    pub fn scale_alpha(self, alpha: u8) -> Self {
        let a = (u16::from(self.a) * u16::from(alpha) / 255) as u8;
        Self { a, ..self }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
