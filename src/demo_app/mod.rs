pub mod scene;
pub mod modules;

mod define_renderer;
pub use define_renderer::define_renderer;

mod define_updater;
pub use define_updater::define_updater;

mod init_scene;
pub use init_scene::init_scene;
