use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear RGB color. Components are unclamped f32, nominally in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Construct from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Pad with an alpha component, for GPU uniform layouts.
    pub fn to_array4(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

impl From<Color> for [f32; 3] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

impl From<[f32; 3]> for Color {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_extremes() {
        assert_eq!(Color::from_hex(0x000000), Color::rgb(0.0, 0.0, 0.0));
        assert_eq!(Color::from_hex(0xffffff), Color::rgb(1.0, 1.0, 1.0));
    }

    #[test]
    fn hex_channel_order() {
        let c = Color::from_hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < f32::EPSILON);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn array_conversions() {
        let c = Color::rgb(0.1, 0.2, 0.3);
        let arr: [f32; 3] = c.into();
        assert_eq!(Color::from(arr), c);
        assert_eq!(c.to_array4(1.0), [0.1, 0.2, 0.3, 1.0]);
    }
}
