use slotmap::SecondaryMap;

use sdf_volume::{
    framework::{
        camera::{CameraRig, OrbitCameraRig, SceneWithCamera},
        gpu,
    },
    sdf::{FrameDriver, PrimitiveId, SdfVolume},
};

use super::modules::ContinuousRotation;

pub struct Scene {
    pub camera_rig:   OrbitCameraRig,
    pub volume:       SdfVolume<gpu::Context>,
    pub frame_driver: FrameDriver,
    /// Primitives spinning around their own axis
    pub rotations:    SecondaryMap<PrimitiveId, ContinuousRotation>,
    /// Primitive targeted by keyboard controls
    pub selected:     Option<PrimitiveId>,
}

impl SceneWithCamera for Scene {
    fn camera_rig(&self) -> &dyn CameraRig {
        &self.camera_rig
    }

    fn camera_rig_mut(&mut self) -> &mut dyn CameraRig {
        &mut self.camera_rig
    }
}
