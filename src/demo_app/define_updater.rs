use sdf_volume::framework::{
    application::Context,
    updater::Updater,
    camera::CameraUpdater,
};

use super::{
    scene::Scene,
    modules::{
        ContinuousRotationUpdater,
        VolumeControls,
        VolumeSync,
    },
};

/// Module order matters: population changes from controls and rotations happen during input and update,
/// `VolumeSync` pushes them to the GPU right before each frame.
pub fn define_updater(_: &Context) -> Updater<Scene> {
    Updater::new()
        .with_module(VolumeControls::default())
        .with_module(CameraUpdater)
        .with_module(ContinuousRotationUpdater)
        .with_module(VolumeSync)
}
