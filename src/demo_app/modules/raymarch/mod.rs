mod render_module;
pub use render_module::RaymarchRenderModule;
