//! Light descriptors

use glam::Vec3;

/// Sun/moon style light with a direction and no falloff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirectionalLight {
    /// Warm low fill pushed to the tree, pumpkin, moon and ground programs
    pub const NIGHT_FILL: Self = Self {
        direction: Vec3::new(-1.0, -0.5, -1.0),
        ambient: Vec3::splat(0.1),
        diffuse: Vec3::new(0.9, 0.7, 0.5),
        specular: Vec3::splat(0.05),
    };

    /// Program-state light; bright specular that only HDR output can hold
    pub const MOONLIGHT: Self = Self {
        direction: Vec3::new(-10.0, -5.0, -2.0),
        ambient: Vec3::splat(0.2),
        diffuse: Vec3::splat(0.6),
        specular: Vec3::splat(2.5),
    };
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::MOONLIGHT
    }
}

/// Where an object program takes its directional light from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    /// The light stored in the program state
    ProgramState,
    /// A literal light, independent of the program state
    Fixed(DirectionalLight),
}

impl LightSource {
    /// Resolves to a concrete light given the program-state light
    pub fn resolve(&self, program_light: &DirectionalLight) -> DirectionalLight {
        match self {
            LightSource::ProgramState => *program_light,
            LightSource::Fixed(light) => *light,
        }
    }
}
