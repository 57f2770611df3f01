use winit_input_helper::WinitInputHelper;

use super::math::Transform;

pub trait CameraRig {
    fn camera(&self) -> &Camera;
    fn set_camera(&mut self, camera: Camera);
    fn on_input(&mut self, input: &WinitInputHelper);
    fn update(&mut self, delta_time_seconds: f32) -> Transform;
}

pub trait SceneWithCamera {
    fn camera_rig(&self) -> &dyn CameraRig;
    fn camera_rig_mut(&mut self) -> &mut dyn CameraRig;
}

mod camera_updater;
pub use camera_updater::*;

mod camera;
pub use camera::*;

mod orbit_camera_rig;
pub use orbit_camera_rig::*;
