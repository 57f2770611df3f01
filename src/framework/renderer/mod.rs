
mod renderer;
pub use renderer::*;

mod render_context;
pub use render_context::*;

mod render_pass;
pub use render_pass::*;

mod render_module;
pub use render_module::*;

mod camera;
pub use camera::*;
