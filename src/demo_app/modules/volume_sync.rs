use sdf_volume::{
    framework::updater::{BeforeRenderContext, BeforeRenderResult, UpdateResultAction, UpdaterModule},
    SdfError, error,
};

use crate::demo_app::scene::Scene;

/// Runs the frame driver once per frame, after all changes of the frame and before the volume is rendered.
#[derive(Debug, Default)]
pub struct VolumeSync;

impl UpdaterModule<Scene> for VolumeSync {
    #[profiling::function]
    fn before_render(&mut self, context: &mut BeforeRenderContext<Scene>) -> BeforeRenderResult {
        let scene = &mut *context.scene;
        match scene.frame_driver.run(&mut scene.volume) {
            Ok(_) => BeforeRenderResult::default(),
            Err(sync_error @ SdfError::ResourceExhausted { .. }) => {
                error!("Volume cannot be synchronized, exiting: {}", sync_error);
                BeforeRenderResult::skip(UpdateResultAction::Exit)
            },
            Err(sync_error) => {
                error!("Frame {} skipped: {}", scene.frame_driver.frame(), sync_error);
                BeforeRenderResult::skip(UpdateResultAction::Redraw)
            },
        }
    }
}
