use glam::Vec3;
use sceneview_common::Color;
use serde::{Deserialize, Serialize};

/// Linear fog: full scene color at `near`, full fog color at `far`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogSettings {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

/// The tinted ground plane under the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorSettings {
    pub color: Color,
    /// World-space height of the plane.
    pub height: f32,
    /// Rotation around X, radians. -PI/2 lays the plane flat.
    pub tilt: f32,
    /// Half-extent of the quad.
    pub size: f32,
}

/// Cone light aimed at the scene origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLightSettings {
    pub color: Color,
    pub intensity: f32,
    /// Cone half-angle, radians.
    pub angle: f32,
    /// Fraction of the cone that fades to zero at the edge, [0, 1].
    pub penumbra: f32,
    /// Exponent of the distance falloff.
    pub decay: f32,
    /// Range cutoff; no light beyond this distance.
    pub distance: f32,
    pub shadow_radius: f32,
    pub position: Vec3,
}

/// Two-tone ambient fill: sky color from above, ground color from below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HemisphereSettings {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
}

/// Everything the debug panel exposes, as plain writable fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    pub background: Color,
    pub fog: FogSettings,
    pub floor: FloorSettings,
    pub spot: SpotLightSettings,
    pub hemisphere: HemisphereSettings,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            background: Color::from_hex(0x262837),
            fog: FogSettings {
                color: Color::from_hex(0x262837),
                near: 1.0,
                far: 15.0,
            },
            floor: FloorSettings {
                color: Color::from_hex(0x556b5d),
                height: 0.0,
                tilt: -std::f32::consts::FRAC_PI_2,
                size: 10.0,
            },
            spot: SpotLightSettings {
                color: Color::from_hex(0xffffff),
                intensity: 4.0,
                angle: std::f32::consts::FRAC_PI_6,
                penumbra: 0.3,
                decay: 1.0,
                distance: 12.0,
                shadow_radius: 4.0,
                position: Vec3::new(3.0, 4.0, 2.0),
            },
            hemisphere: HemisphereSettings {
                sky_color: Color::from_hex(0xb1e1ff),
                ground_color: Color::from_hex(0xb97a20),
                intensity: 0.3,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_coherent() {
        let s = SceneSettings::default();
        assert!(s.fog.near < s.fog.far);
        assert!(s.spot.angle > 0.0 && s.spot.angle < std::f32::consts::FRAC_PI_2);
        assert!((0.0..=1.0).contains(&s.spot.penumbra));
        assert!(s.floor.size > 0.0);
        // Fog matches the background so the floor fades out seamlessly.
        assert_eq!(s.fog.color, s.background);
    }

    #[test]
    fn settings_serialize_roundtrip() {
        let s = SceneSettings::default();
        let json = serde_json::to_string(&s).unwrap();
        let back: SceneSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
