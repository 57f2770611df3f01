use sdf_volume::framework::{
    application::Context,
    renderer::{Renderer, RenderPass},
};

use super::{
    scene::Scene,
    modules::raymarch::RaymarchRenderModule,
};

pub fn define_renderer(context: &Context) -> anyhow::Result<Renderer<Scene>> {
    let mut renderer = Renderer::new(context.gpu.clone(), context.window)?;

    let raymarch_module = renderer.register_module(RaymarchRenderModule::new);

    // passes are executed in order of their registration
    renderer.register_render_pass(RenderPass::base(), &[raymarch_module]);

    Ok(renderer)
}
