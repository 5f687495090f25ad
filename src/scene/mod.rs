//! Scene description and program state
//!
//! Everything here is plain data: no window, no GPU. The renderer consumes a
//! [`Scene`] and a [`ProgramState`] to build each frame.

pub mod camera;
pub mod clock;
pub mod light;
pub mod object;
pub mod state;

use glam::Vec3;

pub use camera::{FlyCamera, Movement};
pub use clock::FrameClock;
pub use light::{DirectionalLight, LightSource};
pub use object::{ObjectKind, Rotation, Scale, SceneObject, Translation};
pub use state::{Placement, Placements, ProgramState, StateError};

/// Fixed texture units shared by every object program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse,
    Specular,
    Normal,
    Emissive,
    Height,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 5] = [
        TextureSlot::Diffuse,
        TextureSlot::Specular,
        TextureSlot::Normal,
        TextureSlot::Emissive,
        TextureSlot::Height,
    ];

    /// Binding index inside the material bind group
    pub fn binding(self) -> u32 {
        match self {
            TextureSlot::Diffuse => 0,
            TextureSlot::Specular => 1,
            TextureSlot::Normal => 2,
            TextureSlot::Emissive => 3,
            TextureSlot::Height => 4,
        }
    }

    /// Color slots are stored sRGB, data slots linear
    pub fn is_color(self) -> bool {
        matches!(self, TextureSlot::Diffuse | TextureSlot::Emissive)
    }
}

/// Which textures an object category binds
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSet {
    /// Files relative to the mesh directory, bound to the given slots
    Files(Vec<(TextureSlot, &'static str)>),
    /// Textures named by the mesh's MTL materials, per sub-mesh
    FromMaterials,
}

/// Per-category material constants and assets
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectStyle {
    pub kind: ObjectKind,
    /// Mesh path relative to the asset root
    pub mesh: &'static str,
    pub textures: TextureSet,
    pub light: LightSource,
    pub shininess: f32,
    pub specular_strength: f32,
    pub alpha: f32,
}

impl ObjectStyle {
    fn new(kind: ObjectKind, mesh: &'static str, textures: TextureSet) -> Self {
        Self {
            kind,
            mesh,
            textures,
            light: LightSource::Fixed(DirectionalLight::NIGHT_FILL),
            shininess: 32.0,
            specular_strength: 0.0,
            alpha: 1.0,
        }
    }
}

/// Skybox face images relative to the asset root, in +X, -X, +Y, -Y, +Z, -Z order
pub const SKYBOX_FACES: [&str; 6] = [
    "textures/skybox/right.jpg",
    "textures/skybox/left.jpg",
    "textures/skybox/top.jpg",
    "textures/skybox/bottom.jpg",
    "textures/skybox/front.jpg",
    "textures/skybox/back.jpg",
];

/// The drawable scene: category styles plus the ordered instance list
#[derive(Debug, Clone)]
pub struct Scene {
    styles: Vec<ObjectStyle>,
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(styles: Vec<ObjectStyle>, objects: Vec<SceneObject>) -> Self {
        Self { styles, objects }
    }

    /// The night scene: three orbiting bats, a spinning moon, two trees,
    /// the ground and two pumpkins, drawn in that order
    pub fn night() -> Self {
        let styles = vec![
            ObjectStyle {
                light: LightSource::ProgramState,
                ..ObjectStyle::new(ObjectKind::Bat, "objects/bat/Bat.obj", TextureSet::FromMaterials)
            },
            ObjectStyle {
                shininess: 256.0,
                specular_strength: 1.0,
                alpha: 0.5,
                ..ObjectStyle::new(
                    ObjectKind::Moon,
                    "objects/moon/Moon.obj",
                    TextureSet::FromMaterials,
                )
            },
            ObjectStyle::new(
                ObjectKind::Tree,
                "objects/tree/uploads_files_855516_Tree.obj",
                TextureSet::Files(vec![
                    (TextureSlot::Diffuse, "Tree_Bark_lambert_BaseColor.png"),
                    (TextureSlot::Height, "Tree_Bark_lambert_Height.png"),
                    (TextureSlot::Normal, "Tree_Bark_lambert_Normal.png"),
                ]),
            ),
            ObjectStyle::new(
                ObjectKind::Ground,
                "objects/ground/terrain.obj",
                TextureSet::Files(vec![
                    (TextureSlot::Diffuse, "iceland1_t.png"),
                    (TextureSlot::Specular, "specular.png"),
                ]),
            ),
            ObjectStyle {
                alpha: 0.9,
                ..ObjectStyle::new(
                    ObjectKind::Pumpkin,
                    "objects/bundeva/Pumpkin.obj",
                    TextureSet::Files(vec![
                        (TextureSlot::Diffuse, "Pumpkin_diff_sketfab.jpg"),
                        (TextureSlot::Emissive, "Pumpkin_lum_Sketchfab.jpg"),
                        (TextureSlot::Normal, "Pumpkin_nrml.jpg"),
                    ]),
                )
            },
        ];

        let bat_tilt = Rotation::Fixed {
            axis: Vec3::X,
            degrees: 70.0,
        };

        let objects = vec![
            SceneObject::new(ObjectKind::Bat)
                .moving(Translation::PlacedOrbit)
                .rotated(bat_tilt),
            SceneObject::new(ObjectKind::Bat)
                .moving(Translation::Orbit {
                    radius_x: -20.0,
                    height: 14.0,
                    radius_z: 2.0,
                })
                .rotated(bat_tilt),
            SceneObject::new(ObjectKind::Bat)
                .moving(Translation::Orbit {
                    radius_x: -35.0,
                    height: 20.0,
                    radius_z: 0.0,
                })
                .rotated(bat_tilt),
            SceneObject::new(ObjectKind::Moon).rotated(Rotation::Spin {
                axis: Vec3::Y,
                degrees_per_second: 20.0,
            }),
            SceneObject::new(ObjectKind::Tree),
            SceneObject::new(ObjectKind::Tree)
                .at(Vec3::new(-29.0, -12.0, 6.0))
                .scaled(4.5),
            SceneObject::new(ObjectKind::Ground),
            SceneObject::new(ObjectKind::Pumpkin),
            SceneObject::new(ObjectKind::Pumpkin)
                .at(Vec3::new(-34.0, -8.0, 10.0))
                .rotated(Rotation::Fixed {
                    axis: Vec3::Y,
                    degrees: 35.0,
                }),
        ];

        Self::new(styles, objects)
    }

    pub fn styles(&self) -> &[ObjectStyle] {
        &self.styles
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn style(&self, kind: ObjectKind) -> Option<&ObjectStyle> {
        self.styles.iter().find(|s| s.kind == kind)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::night()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_night_scene_has_a_style_per_instance_kind() {
        let scene = Scene::night();
        assert_eq!(scene.objects().len(), 9);
        for object in scene.objects() {
            assert!(scene.style(object.kind).is_some(), "{:?}", object.kind);
        }
        for kind in ObjectKind::ALL {
            assert!(scene.style(kind).is_some());
        }
    }

    #[test]
    fn test_only_bats_use_program_state_light() {
        let scene = Scene::night();
        for style in scene.styles() {
            let expects_program_light = style.kind == ObjectKind::Bat;
            assert_eq!(
                style.light == LightSource::ProgramState,
                expects_program_light,
                "{:?}",
                style.kind
            );
        }
    }

    #[test]
    fn test_draw_order_matches_categories() {
        let scene = Scene::night();
        let kinds: Vec<ObjectKind> = scene.objects().iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectKind::Bat,
                ObjectKind::Bat,
                ObjectKind::Bat,
                ObjectKind::Moon,
                ObjectKind::Tree,
                ObjectKind::Tree,
                ObjectKind::Ground,
                ObjectKind::Pumpkin,
                ObjectKind::Pumpkin,
            ]
        );
    }

    #[test]
    fn test_texture_slot_bindings_are_unique() {
        let mut bindings: Vec<u32> = TextureSlot::ALL.iter().map(|s| s.binding()).collect();
        bindings.sort_unstable();
        bindings.dedup();
        assert_eq!(bindings.len(), TextureSlot::ALL.len());
    }
}
