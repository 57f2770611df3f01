use std::marker::PhantomData;

use dolly::{
    driver::RigDriver,
    prelude::{Handedness, Position, RightHanded, Smooth, YawPitch},
    rig::RigUpdateParams,
};
use winit_input_helper::WinitInputHelper;

use super::{Camera, CameraRig};
use crate::framework::math::Transform;

/// Camera rotating around a target point, dragging with left mouse button rotates and scrolling zooms.
pub struct OrbitCameraRig {
    rig:    dolly::rig::CameraRig,
    camera: Camera,
}

impl OrbitCameraRig {
    pub fn new(camera: Camera, target: glam::Vec3, yaw_degrees: f32, pitch_degrees: f32, distance: f32) -> Self {
        let rig = dolly::rig::CameraRig::builder()
            .with(YawPitch::new().yaw_degrees(yaw_degrees).pitch_degrees(pitch_degrees))
            .with(Smooth::new_rotation(0.8))
            .with(Position::new(target))
            .with(SmoothZoom::new(distance, 0.8))
            .build();
        let mut orbit = Self { rig, camera };
        orbit.update(0.0);
        orbit
    }
}

impl CameraRig for OrbitCameraRig {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Takes projection properties only, placement is driven by the rig.
    fn set_camera(&mut self, camera: Camera) {
        self.camera.fov = camera.fov;
        self.camera.aspect_ratio = camera.aspect_ratio;
        self.camera.near = camera.near;
        self.camera.far = camera.far;
    }

    fn on_input(&mut self, input: &WinitInputHelper) {
        let (dx, dy) = input.mouse_diff();
        if (dx != 0.0 || dy != 0.0) && input.mouse_held(0) {
            self.rig
                .driver_mut::<YawPitch>()
                .rotate_yaw_pitch(-dx * 0.7, -dy * 0.7);
        }
        let scroll = input.scroll_diff();
        if scroll != 0.0 {
            self.rig
                .driver_mut::<SmoothZoom<RightHanded>>()
                .zoom(-scroll);
        }
    }

    fn update(&mut self, delta_time_seconds: f32) -> Transform {
        let result = self.rig.update(delta_time_seconds);
        self.camera.position = result.position.into();
        self.camera.rotation = result.rotation.into();
        self.camera.transform()
    }
}

/// Rig driver placing the camera at a distance behind its parent, the distance changes smoothly.
#[derive(Debug)]
pub struct SmoothZoom<H: Handedness> {
    rig: dolly::rig::CameraRig<H>,
}

impl<H: Handedness> SmoothZoom<H> {
    pub fn new(distance: f32, smoothness: f32) -> Self {
        Self {
            rig: dolly::rig::CameraRig::builder()
                .with(Position::new(glam::vec3(0.0, 0.0, distance)))
                .with(Smooth::new_position(smoothness))
                .build(),
        }
    }

    pub fn zoom(&mut self, zoom: f32) {
        let position = self.rig.driver_mut::<Position>();
        let scale = 1.0 + zoom * 0.3;
        position.position.z = (position.position.z * scale).max(0.1);
    }
}

impl<H: Handedness> RigDriver<H> for SmoothZoom<H> {
    fn update(&mut self, params: RigUpdateParams<H>) -> dolly::transform::Transform<H> {
        let local = self.rig.update(params.delta_time_seconds);

        let parent_position: glam::Vec3 = params.parent.position.into();
        let parent_rotation: glam::Quat = params.parent.rotation.into();
        let offset: glam::Vec3 = local.position.into();

        dolly::transform::Transform {
            rotation: params.parent.rotation,
            position: (parent_position + parent_rotation * offset).into(),
            phantom:  PhantomData,
        }
    }
}
