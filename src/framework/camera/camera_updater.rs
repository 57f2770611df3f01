use crate::framework::updater::{
    InputUpdateResult, ResizeContext, UpdateContext, UpdateResultAction, UpdaterModule,
};

use super::{Camera, SceneWithCamera};

#[derive(Debug, Default)]
pub struct CameraUpdater;

impl<S: SceneWithCamera> UpdaterModule<S> for CameraUpdater {
    #[profiling::function]
    fn input(&mut self, context: &mut UpdateContext<S>) -> InputUpdateResult {
        context.scene.camera_rig_mut().on_input(context.input);
        InputUpdateResult::default() // do not prevent event propagation
    }

    #[profiling::function]
    fn update(&mut self, context: &mut UpdateContext<S>) -> UpdateResultAction {
        let rig = context.scene.camera_rig_mut();
        let before = rig.camera().transform();
        let after = rig.update(context.tick.delta.as_secs_f32());
        if before != after {
            return UpdateResultAction::Redraw;
        }
        UpdateResultAction::None
    }

    fn resize(&mut self, context: &mut ResizeContext<S>) -> UpdateResultAction {
        if context.size.height == 0 {
            return UpdateResultAction::None;
        }
        let rig = context.scene.camera_rig_mut();
        rig.set_camera(Camera {
            aspect_ratio: context.size.width as f32 / context.size.height as f32,
            ..*rig.camera()
        });
        UpdateResultAction::Redraw
    }
}
