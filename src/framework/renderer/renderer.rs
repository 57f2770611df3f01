use std::sync::Arc;

use anyhow::Context as _;
use slotmap::{SlotMap, new_key_type};
use winit::window::Window;

use crate::{
    framework::{gpu, camera::SceneWithCamera},
    warn,
};

use super::{
    RenderPass,
    RenderModule,
    camera::Camera,
    RenderContext,
};

new_key_type! { pub struct RenderModuleID; }
new_key_type! { pub struct RenderPassID; }

#[derive(Debug)]
struct RegisteredRenderPass {
    attachment: RenderPass,
    modules:    Vec<RenderModuleID>,
}

/// Result of an attempt to render one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Presented,
    /// Surface was not available this frame, the frame was dropped.
    Dropped,
}

#[derive(Debug)]
pub struct Renderer<S: SceneWithCamera> {
    context: RenderContext,
    modules: SlotMap<RenderModuleID, Box<dyn RenderModule<S>>>,
    passes:  SlotMap<RenderPassID, RegisteredRenderPass>,
}

// Renderer construction methods
impl<S: SceneWithCamera> Renderer<S> {
    pub fn new(gpu: Arc<gpu::Context>, window: &Window) -> anyhow::Result<Self> {
        let capabilities = gpu.surface.get_capabilities(&gpu.adapter);
        let format = capabilities.formats.iter()
            .copied()
            .find(|format| format.describe().srgb)
            .or_else(|| capabilities.formats.first().copied())
            .context("Surface does not support any texture format")?;

        // setup surface for rendering
        let surface_config = wgpu::SurfaceConfiguration {
            usage:        wgpu::TextureUsages::RENDER_ATTACHMENT, // texture will be used to draw on screen
            format,
            #[cfg(not(feature = "no_vsync"))]
            present_mode: wgpu::PresentMode::Fifo,                // VSynch essentially - capping renders on display frame rate
            #[cfg(feature = "no_vsync")]
            present_mode: wgpu::PresentMode::AutoNoVsync,
            width:        window.inner_size().width.max(1),
            height:       window.inner_size().height.max(1),
            alpha_mode:   capabilities.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        gpu.surface.configure(&gpu.device, &surface_config);

        Ok(Self {
            context: RenderContext {
                gpu: gpu.clone(),
                surface_config,
                scale_factor: window.scale_factor(),
                camera:       Camera::new(0, &gpu.device),
            },
            modules: SlotMap::with_key(),
            passes:  SlotMap::with_key(),
        })
    }

    /// Adds a new render module to the renderer
    pub fn register_module<M, F>(&mut self, get_module: F) -> RenderModuleID
        where
            M: RenderModule<S> + 'static,
            F: FnOnce(&RenderContext) -> M,
    {
        let module = get_module(&self.context);
        self.modules.insert(Box::new(module))
    }

    /// Passes are executed in order of their registration, modules in the order given here.
    /// - Returns `None` when any of the modules is not registered.
    pub fn register_render_pass(&mut self, pass: RenderPass, modules: &[RenderModuleID]) -> Option<RenderPassID> {
        if let Some(missing) = modules.iter().find(|module| !self.modules.contains_key(**module)) {
            warn!("Cannot register render pass {:?}, render module {:?} is not registered", pass, missing);
            return None;
        }
        Some(self.passes.insert(RegisteredRenderPass {
            attachment: pass,
            modules:    modules.to_vec(),
        }))
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }
}

// renderer runtime methods
impl<S: SceneWithCamera> Renderer<S> {

    #[profiling::function]
    pub fn resize(&mut self, size: &winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        if size.width > 0 && size.height > 0 {
            self.context.surface_config.width = size.width;
            self.context.surface_config.height = size.height;
            self.context.scale_factor = scale_factor;
            self.configure_surface();
        }
    }

    fn configure_surface(&self) {
        self.context.gpu.surface.configure(&self.context.gpu.device, &self.context.surface_config);
    }

    #[profiling::function]
    pub fn prepare(&mut self, scene: &S) {
        // Update shared GPU resource outside of individual render module scopes
        self.context.camera.update(&self.context.gpu.queue, scene.camera_rig().camera());

        for module in self.modules.values_mut() {
            module.prepare(scene, &self.context);
        }
    }

    /// Renders all passes into the next surface texture.
    /// - A lost or outdated surface is reconfigured and the frame is dropped.
    /// - Running out of memory is returned as an error.
    #[profiling::function]
    pub fn render(&mut self) -> anyhow::Result<RenderOutcome> {
        // ask surface to provide us a texture we will draw into
        let output = match self.context.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.configure_surface();
                return Ok(RenderOutcome::Dropped);
            },
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timeout while acquiring surface texture");
                return Ok(RenderOutcome::Dropped);
            },
            Err(error) => {
                return Err(error).context("Failed to acquire next surface texture");
            },
        };

        // View on surface texture understandable by RenderPassColorAttachment
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Create an encoder for building a GPU commands for this frame
        let mut encoder = self.context.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder")
        });

        {
            profiling::scope!("Render Passes");
            for pass in self.passes.values() {
                let mut render_pass_context = pass.attachment.start(&mut encoder, &view);
                for module in pass.modules.iter().filter_map(|id| self.modules.get(*id)) {
                    module.render(&self.context, &mut render_pass_context);
                }
            }
        }

        self.context.gpu.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(RenderOutcome::Presented)
    }
}
