use wgpu::util::DeviceExt;

use crate::framework::camera;

/// Camera values as seen by shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_projection:         glam::Mat4,
    /// Unprojects clip space positions into world space, used to generate view rays.
    pub inverse_view_projection: glam::Mat4,
    pub position:                glam::Vec4,
}

impl CameraUniform {
    pub fn from_camera(camera: &camera::Camera) -> Self {
        let view_projection = camera.view_projection_matrix();
        Self {
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            position: camera.position.extend(1.0),
        }
    }
}

/// GPU resource of the camera shared by all render modules.
#[derive(Debug)]
pub struct Camera {
    pub uniform:           CameraUniform,
    pub uniform_buffer:    wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group:        wgpu::BindGroup,
}

impl Camera {
    #[profiling::function]
    pub fn new(binding: u32, device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::from_camera(&camera::Camera::default());

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label:    Some("Camera Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage:    wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            uniform,
            uniform_buffer,
            bind_group_layout,
            bind_group,
        }
    }

    /// Writes the camera only when it differs from the last written one.
    #[profiling::function]
    pub fn update(&mut self, queue: &wgpu::Queue, camera: &camera::Camera) {
        let uniform = CameraUniform::from_camera(camera);
        if uniform == self.uniform {
            return;
        }
        self.uniform = uniform;
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }
}
