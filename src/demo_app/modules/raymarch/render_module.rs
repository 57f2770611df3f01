use sdf_volume::{
    framework::{
        gpu,
        renderer::{RenderContext, RenderModule, RenderPassContext},
    },
    sdf::{SdfVolume, SHADER_BINDINGS},
    debug,
};

use crate::demo_app::scene::Scene;

/// Ray-marches the SDF volume in a single full screen triangle.
#[derive(Debug)]
pub struct RaymarchRenderModule {
    pipeline:          wgpu::RenderPipeline,
    volume_layout:     wgpu::BindGroupLayout,
    volume_bind_group: Option<wgpu::BindGroup>,
    /// Mirror generation the bind group was created for
    generation:        Option<u64>,
}

impl RaymarchRenderModule {

    #[profiling::function]
    pub fn new(context: &RenderContext) -> Self {
        let device = &context.gpu.device;

        // ⬇ volume buffer declarations are shared with the mirror, the ray marcher is appended to them
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Raymarch Shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{}\n{}", SHADER_BINDINGS, include_str!("raymarch.wgsl")).into()),
        });

        let volume_layout = SdfVolume::<gpu::Context>::bind_group_layout(&context.gpu, wgpu::ShaderStages::FRAGMENT);

        // ⬇ group 0: volume buffers, group 1: camera
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raymarch Render Pipeline Layout"),
            bind_group_layouts: &[&volume_layout, &context.camera.bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Raymarch Render Pipeline"),
            layout: Some(&pipeline_layout),
            // ⬇ Vertices are generated from vertex index, no vertex buffer
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.surface_config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            volume_layout,
            volume_bind_group: None,
            generation: None,
        }
    }
}

impl RenderModule<Scene> for RaymarchRenderModule {

    /// Buffers are replaced on every reallocation, the bind group follows the mirror generation.
    #[profiling::function]
    fn prepare(&mut self, scene: &Scene, _: &RenderContext) {
        let generation = scene.volume.mirror().generation();
        if self.generation != Some(generation) {
            self.volume_bind_group = scene.volume.create_bind_group(&self.volume_layout);
            self.generation = Some(generation);
            debug!("Volume bind group recreated for generation {}", generation);
        }
    }

    #[profiling::function]
    fn render<'pass, 'a: 'pass>(
        &'a self,
        context: &'a RenderContext,
        render_pass_context: &mut RenderPassContext<'pass>,
    ) {
        let Some(volume_bind_group) = &self.volume_bind_group else {
            return;
        };
        let render_pass = &mut render_pass_context.render_pass;
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, volume_bind_group, &[]);
        render_pass.set_bind_group(1, &context.camera.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
