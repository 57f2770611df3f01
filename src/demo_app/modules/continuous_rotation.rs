//! Updater module rotating primitives which have a rotation attached in the scene, one step per tick.

use sdf_volume::framework::{
    math::Transform,
    updater::{UpdateContext, UpdateResultAction, UpdaterModule},
};

use crate::demo_app::scene::Scene;

#[derive(Debug, Clone, Copy)]
pub struct ContinuousRotation {
    quad: glam::Quat,
}

impl ContinuousRotation {
    pub fn from_speed_axis(speed: f32, axis: glam::Vec3) -> Self {
        Self { quad: glam::Quat::from_axis_angle(axis.normalize_or_zero(), speed) }
    }

    pub fn random() -> Self {
        let speed = 0.02 + rand::random::<f32>() * 0.08;
        let axis = glam::Vec3::new(
            rand::random::<f32>(),
            rand::random::<f32>(),
            rand::random::<f32>(),
        );
        Self::from_speed_axis(speed, axis)
    }

    /// will rotate the transform by the speed and direction
    fn increment(&self, transform: &Transform) -> Transform {
        Transform {
            rotation: (transform.rotation * self.quad).normalize(),
            ..*transform
        }
    }
}

#[derive(Debug, Default)]
pub struct ContinuousRotationUpdater;

impl UpdaterModule<Scene> for ContinuousRotationUpdater {
    #[profiling::function]
    fn update(&mut self, context: &mut UpdateContext<Scene>) -> UpdateResultAction {
        let scene = &mut *context.scene;
        let mut rotated = false;
        for (id, rotation) in scene.rotations.iter() {
            // Moving only marks the transform as changed, the upload happens once per frame
            if let Some(primitive) = scene.volume.primitive_mut(id) {
                let transform = rotation.increment(primitive.transform());
                primitive.set_transform(transform);
                rotated = true;
            }
        }
        if rotated {
            UpdateResultAction::Redraw
        } else {
            UpdateResultAction::None
        }
    }
}
