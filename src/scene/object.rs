//! Scene object descriptors and their transforms

use glam::{Mat4, Vec3};

use super::state::Placements;

/// The five object categories, each with its own mesh and program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Tree,
    Pumpkin,
    Bat,
    Moon,
    Ground,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Tree,
        ObjectKind::Pumpkin,
        ObjectKind::Bat,
        ObjectKind::Moon,
        ObjectKind::Ground,
    ];

    /// Program and log name
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Tree => "tree",
            ObjectKind::Pumpkin => "pumpkin",
            ObjectKind::Bat => "bat",
            ObjectKind::Moon => "moon",
            ObjectKind::Ground => "ground",
        }
    }
}

/// Where an instance sits, possibly as a function of time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Translation {
    /// The category's persisted position
    Placed,
    /// A literal position
    Fixed(Vec3),
    /// Circles the Y axis using the persisted position:
    /// `(p.x * cos t, p.y, p.x * sin t)`
    PlacedOrbit,
    /// Circles the Y axis: `(radius_x * cos t, height, radius_z * sin t)`
    Orbit {
        radius_x: f32,
        height: f32,
        radius_z: f32,
    },
}

/// Orientation of an instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation {
    None,
    /// Constant angle about an axis
    Fixed { axis: Vec3, degrees: f32 },
    /// Continuous spin, angle = rate * t
    Spin { axis: Vec3, degrees_per_second: f32 },
}

/// Uniform scale factor of an instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// The category's persisted scale
    Placed,
    Fixed(f32),
}

/// One drawn instance
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub translation: Translation,
    pub rotation: Rotation,
    pub scale: Scale,
}

impl SceneObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            translation: Translation::Placed,
            rotation: Rotation::None,
            scale: Scale::Placed,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.translation = Translation::Fixed(position);
        self
    }

    pub fn moving(mut self, translation: Translation) -> Self {
        self.translation = translation;
        self
    }

    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale = Scale::Fixed(factor);
        self
    }

    /// World position at time `t` (seconds)
    pub fn position(&self, placements: &Placements, t: f32) -> Vec3 {
        let placed = placements.get(self.kind).position;
        match self.translation {
            Translation::Placed => placed,
            Translation::Fixed(position) => position,
            Translation::PlacedOrbit => Vec3::new(placed.x * t.cos(), placed.y, placed.x * t.sin()),
            Translation::Orbit {
                radius_x,
                height,
                radius_z,
            } => Vec3::new(radius_x * t.cos(), height, radius_z * t.sin()),
        }
    }

    /// Model matrix at time `t`: translate, then rotate, then scale
    pub fn model_matrix(&self, placements: &Placements, t: f32) -> Mat4 {
        let translation = Mat4::from_translation(self.position(placements, t));

        let rotation = match self.rotation {
            Rotation::None => Mat4::IDENTITY,
            Rotation::Fixed { axis, degrees } => {
                Mat4::from_axis_angle(axis.normalize(), degrees.to_radians())
            }
            Rotation::Spin {
                axis,
                degrees_per_second,
            } => Mat4::from_axis_angle(axis.normalize(), (degrees_per_second * t).to_radians()),
        };

        let factor = match self.scale {
            Scale::Placed => placements.get(self.kind).scale,
            Scale::Fixed(factor) => factor,
        };

        translation * rotation * Mat4::from_scale(Vec3::splat(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placed_object_uses_persisted_values() {
        let placements = Placements::default();
        let tree = SceneObject::new(ObjectKind::Tree);

        let expected = Mat4::from_translation(Vec3::new(20.0, -13.0, 8.0))
            * Mat4::from_scale(Vec3::splat(5.5));
        assert!(tree.model_matrix(&placements, 3.0).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_placed_orbit_uses_x_for_both_radii() {
        let placements = Placements::default();
        let bat = SceneObject::new(ObjectKind::Bat).moving(Translation::PlacedOrbit);

        assert!(bat
            .position(&placements, 0.0)
            .abs_diff_eq(Vec3::new(26.0, 27.0, 0.0), 1e-5));

        let quarter = std::f32::consts::FRAC_PI_2;
        assert!(bat
            .position(&placements, quarter)
            .abs_diff_eq(Vec3::new(0.0, 27.0, 26.0), 1e-4));
    }

    #[test]
    fn test_orbit_with_literal_radii() {
        let placements = Placements::default();
        let bat = SceneObject::new(ObjectKind::Bat).moving(Translation::Orbit {
            radius_x: -20.0,
            height: 14.0,
            radius_z: 2.0,
        });

        let t = std::f32::consts::PI;
        assert!(bat
            .position(&placements, t)
            .abs_diff_eq(Vec3::new(20.0, 14.0, 0.0), 1e-4));
    }

    #[test]
    fn test_spin_angle_grows_with_time() {
        let placements = Placements::default();
        let moon = SceneObject::new(ObjectKind::Moon).rotated(Rotation::Spin {
            axis: Vec3::Y,
            degrees_per_second: 20.0,
        });

        let expected = Mat4::from_translation(Vec3::new(-6.0, 29.0, 0.0))
            * Mat4::from_rotation_y(40f32.to_radians())
            * Mat4::from_scale(Vec3::splat(2.0));
        assert!(moon.model_matrix(&placements, 2.0).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_fixed_rotation_and_scale() {
        let placements = Placements::default();
        let pumpkin = SceneObject::new(ObjectKind::Pumpkin)
            .at(Vec3::new(-34.0, -8.0, 10.0))
            .rotated(Rotation::Fixed {
                axis: Vec3::Y,
                degrees: 35.0,
            });

        let expected = Mat4::from_translation(Vec3::new(-34.0, -8.0, 10.0))
            * Mat4::from_rotation_y(35f32.to_radians())
            * Mat4::from_scale(Vec3::splat(0.04));
        assert!(pumpkin.model_matrix(&placements, 9.0).abs_diff_eq(expected, 1e-5));

        let small = pumpkin.clone().scaled(0.5);
        assert_eq!(small.scale, Scale::Fixed(0.5));
    }
}
