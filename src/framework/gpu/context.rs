use anyhow::Context as _;
use winit::window::Window;

use crate::{error, Result, SdfError};

use super::GpuBackend;

#[derive(Debug)]
pub struct Context {
    pub surface: wgpu::Surface,
    pub adapter: wgpu::Adapter,
    pub device:  wgpu::Device,
    pub queue:   wgpu::Queue,
}

impl Context {

    #[profiling::function]
    pub async fn new(window: &Window) -> anyhow::Result<Self> {
        let instance = {
            profiling::scope!("Creating instance");
            wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            })
        };

        let surface = {
            profiling::scope!("Creating surface");
            // SAFETY: the window outlives the surface, both live for the whole application run.
            unsafe { instance.create_surface(window) }
                .context("Failed to create surface")?
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference:       wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface:     Some(&surface),
            })
            .await
            .context("Failed to find an appropriate adapter")?;

        let (device, queue) = Self::new_device_queue(&adapter).await?;

        Ok(Self {
            adapter,
            surface,
            device,
            queue,
        })
    }

    #[profiling::function]
    pub async fn new_device_queue(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
        adapter.request_device(
            &wgpu::DeviceDescriptor {
                label:    Some("SDF volume device"),
                features: wgpu::Features::empty(),
                limits:   wgpu::Limits::default(),
            },
            None
        )
        .await
        .context("Failed to create device")
    }

}

// Device errors are reported asynchronously by wgpu, error scopes turn them into results of the call which caused them.
impl GpuBackend for Context {
    type Buffer = wgpu::Buffer;

    #[profiling::function]
    fn create_buffer(&self, label: &'static str, size: u64, usage: wgpu::BufferUsages) -> Result<wgpu::Buffer> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        if let Some(device_error) = pollster::block_on(self.device.pop_error_scope()) {
            error!("Allocation of `{}` ({} bytes) failed: {}", label, size, device_error);
            buffer.destroy();
            return Err(SdfError::ResourceExhausted { label, bytes: size, reason: device_error.to_string() });
        }
        Ok(buffer)
    }

    #[profiling::function]
    fn write_buffer(&self, label: &'static str, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) -> Result<()> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.queue.write_buffer(buffer, offset, data);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(device_error) => Err(SdfError::UploadFailed { label, reason: device_error.to_string() }),
            None => Ok(()),
        }
    }

    fn release_buffer(&self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }
}
