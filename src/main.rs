mod demo_app;

use std::path::PathBuf;

use sdf_volume::framework::application::{self, ApplicationDescriptor, RunParams};

use demo_app::{define_renderer, define_updater, init_scene};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    #[cfg(feature = "json_trace")]
    let _profiling_session = sdf_volume::framework::profiler::begin_session("sdf-volume")?;

    // optional scene description file
    let scene_path = std::env::args().nth(1).map(PathBuf::from);

    pollster::block_on(application::run(
        ApplicationDescriptor {
            init_renderer: define_renderer,
            init_updater:  define_updater,
            init_scene:    |context: &application::Context| init_scene(context, scene_path.as_deref()),
        },
        RunParams {
            window_name: "SDF Volume",
            ..Default::default()
        },
    ))
}
