
/// Attachment setup of one render pass.
#[derive(Debug)]
pub enum RenderPass {
    /// Main render pass drawing color values to the screen
    Base {
        clear_color: wgpu::Color,
    },
}

#[derive(Debug)]
pub struct RenderPassContext<'pass> {
    pub attachment:  &'pass RenderPass,
    pub render_pass: wgpu::RenderPass<'pass>,
}

// Construction
impl RenderPass {
    pub fn base() -> Self {
        Self::Base {
            #[cfg(feature = "white_bg")]
            clear_color: wgpu::Color::WHITE,
            #[cfg(not(feature = "white_bg"))]
            clear_color: wgpu::Color { r: 0.1, g: 0.2, b: 0.3, a: 1.0 },
        }
    }
}

impl RenderPass {
    pub fn start<'pass>(
        &'pass self,
        encoder: &'pass mut wgpu::CommandEncoder,
        view: &'pass wgpu::TextureView,
    ) -> RenderPassContext<'pass> {
        match self {
            Self::Base { clear_color } => RenderPassContext {
                attachment: self,
                render_pass: encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Base Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(*clear_color),
                            store: true,
                        },
                    })],
                    depth_stencil_attachment: None,
                }),
            },
        }
    }
}
