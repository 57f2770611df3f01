use std::path::Path;

use rand::Rng;
use slotmap::SecondaryMap;

use sdf_volume::{
    framework::{
        application::Context,
        camera::{Camera, OrbitCameraRig},
        math::Transform,
    },
    sdf::{FrameDriver, PrimitiveDescription, PrimitiveKind, SceneDescription, SdfVolume, VolumeConfig},
    info,
};

use super::{
    scene::Scene,
    modules::ContinuousRotation,
};

/// Loads the scene from `scene_path` when given, otherwise builds the default one.
pub fn init_scene(context: &Context, scene_path: Option<&Path>) -> anyhow::Result<Scene> {
    let description = match scene_path {
        Some(path) => SceneDescription::load(path)?,
        None       => default_scene(),
    };

    let mut volume = SdfVolume::new(context.gpu.clone(), VolumeConfig::default())?;
    let ids = description.spawn_into(&mut volume)?;
    info!("Scene initialized with {} primitives, {} registered", ids.len(), volume.len());

    // everything except planes spins
    let mut rng = rand::thread_rng();
    let mut rotations = SecondaryMap::new();
    for (id, primitive) in ids.iter().zip(description.primitives.iter()) {
        if primitive.kind != PrimitiveKind::Plane && rng.gen_bool(0.75) {
            rotations.insert(*id, ContinuousRotation::random());
        }
    }

    let size = context.window.inner_size();
    Ok(Scene {
        camera_rig: OrbitCameraRig::new(
            Camera {
                aspect_ratio: size.width as f32 / size.height.max(1) as f32,
                fov: 60.0,
                far: 1000.0,
                ..Default::default()
            },
            glam::Vec3::ZERO,
            -20.0,
            -25.0,
            7.0,
        ),
        volume,
        frame_driver: FrameDriver::new(),
        rotations,
        selected: ids.first().copied(),
    })
}

fn default_scene() -> SceneDescription {
    let primitive = |kind, params: glam::Vec3, color: glam::Vec4, position: glam::Vec3| PrimitiveDescription {
        kind,
        params,
        color,
        transform: Transform::from_position(position),
        enabled: true,
    };
    SceneDescription {
        config: VolumeConfig::default(),
        primitives: vec![
            primitive(PrimitiveKind::Sphere, glam::vec3(0.8, 0.0, 0.0),   glam::vec4(0.9, 0.2, 0.2, 1.0), glam::vec3(-1.8, 0.3, 0.0)),
            primitive(PrimitiveKind::Box,    glam::vec3(0.6, 0.6, 0.6),   glam::vec4(0.2, 0.8, 0.3, 1.0), glam::vec3(0.0, 0.3, 0.0)),
            primitive(PrimitiveKind::Torus,  glam::vec3(0.7, 0.25, 0.0),  glam::vec4(0.2, 0.4, 0.9, 1.0), glam::vec3(1.8, 0.3, 0.0)),
            primitive(PrimitiveKind::Plane,  glam::vec3(0.0, 1.0, 0.0),   glam::vec4(0.7, 0.7, 0.7, 1.0), glam::vec3(0.0, -0.6, 0.0)),
        ],
    }
}
