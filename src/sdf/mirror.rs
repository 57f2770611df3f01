use std::{mem::offset_of, sync::Arc};

use crate::{
    debug, error, info, warn,
    framework::gpu::{self, GpuBackend},
    Result,
};

use super::{Primitive, ShaderFeatures, VolumeConfig};

pub const OBJECT_BUFFER_LABEL:    &str = "ObjectBuffer";
pub const TRANSFORM_BUFFER_LABEL: &str = "ObjectTransformsBuffer";
pub const UNIFORM_BUFFER_LABEL:   &str = "SdfVolumeUniform";

/// WGSL declarations of the buffers bound by [`GpuMirror::create_bind_group`], to be prepended to shader sources.
pub const SHADER_BINDINGS: &str = include_str!("bindings.wgsl");


// =================================================================================================
// GPU records
// =================================================================================================

/// Shape and color of one slot in `ObjectBuffer` (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuObjectData {
    pub params: [f32; 3],
    pub color:  [f32; 4],
    pub kind:   u32,
}

impl GpuObjectData {
    pub fn from_primitive(primitive: &Primitive) -> Self {
        Self {
            params: primitive.params().to_array(),
            color:  primitive.color().to_array(),
            kind:   primitive.kind().to_index(),
        }
    }
}

/// Transform of one slot in `ObjectTransformsBuffer` (64 bytes).
/// Holds the world-to-local matrix because shapes are evaluated in their local space.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuObjectTransform {
    pub world_to_local: glam::Mat4,
}

impl GpuObjectTransform {
    pub fn from_primitive(primitive: &Primitive) -> Self {
        Self {
            world_to_local: primitive.transform().as_inverse_mat(),
        }
    }
}

/// Uniform values shared by all slots (16 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVolumeUniform {
    pub object_count: u32,
    pub smoothing:    f32,
    pub features:     u32,
    _padding:         u32,
}

impl GpuVolumeUniform {
    pub fn new(object_count: u32, config: &VolumeConfig) -> Self {
        Self {
            object_count,
            smoothing: config.smoothing(),
            features:  config.features().bits(),
            _padding:  0,
        }
    }

    pub fn features(&self) -> ShaderFeatures {
        ShaderFeatures::from_bits_truncate(self.features)
    }
}


// =================================================================================================
// Sync statistics
// =================================================================================================

/// How many times each kind of GPU transfer happened since the mirror was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub reallocations:     u64,
    pub object_uploads:    u64,
    pub transform_uploads: u64,
    pub smoothing_uploads: u64,
    pub feature_uploads:   u64,
}


/// Buffers whose last upload failed, they are rewritten by the next frame regardless of primitive flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaleBuffers {
    pub objects:    bool,
    pub transforms: bool,
    pub uniform:    bool,
}

impl StaleBuffers {
    pub fn any(&self) -> bool {
        self.objects || self.transforms || self.uniform
    }
}


// =================================================================================================
// GPU Mirror
// =================================================================================================

/// Keeps the object and transform buffers and the volume uniform consistent with the registered primitives.
///
/// Slot `i` of both buffers always describes the primitive at slot `i` of the registry. Buffers are only ever
/// rewritten as a whole, a change of the slot count goes through [`GpuMirror::reallocate_and_rebuild`].
#[derive(Debug)]
pub struct GpuMirror<B: GpuBackend> {
    gpu:        Arc<B>,
    objects:    gpu::Buffer<GpuObjectData, B>,
    transforms: gpu::Buffer<GpuObjectTransform, B>,
    uniforms:   gpu::Buffer<GpuVolumeUniform, B>,
    /// CPU copy of the uniform as it was last written
    uniform:    GpuVolumeUniform,
    /// Incremented on every reallocation, bind groups created for an older generation are invalid.
    generation: u64,
    stale:      StaleBuffers,
    stats:      SyncStats,
}

// Constructors
impl<B: GpuBackend> GpuMirror<B> {
    /// Allocates the uniform buffer only, slot buffers are created by the first reallocation.
    #[profiling::function]
    pub fn new(gpu: Arc<B>, config: &VolumeConfig) -> Result<Self> {
        let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        let mut mirror = Self {
            gpu,
            objects:    gpu::Buffer::new(OBJECT_BUFFER_LABEL, storage),
            transforms: gpu::Buffer::new(TRANSFORM_BUFFER_LABEL, storage),
            uniforms:   gpu::Buffer::new(UNIFORM_BUFFER_LABEL, wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST),
            uniform:    GpuVolumeUniform::new(0, config),
            generation: 0,
            stale:      StaleBuffers::default(),
            stats:      SyncStats::default(),
        };
        mirror.uniforms.reallocate(&mirror.gpu, 1)?;
        mirror.uniforms.upload(&mirror.gpu, &[mirror.uniform])?;
        Ok(mirror)
    }
}

// Getters
impl<B: GpuBackend> GpuMirror<B> {
    /// Number of slots in the buffers.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn gpu(&self) -> &Arc<B> {
        &self.gpu
    }

    pub fn stale(&self) -> StaleBuffers {
        self.stale
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn uniform(&self) -> &GpuVolumeUniform {
        &self.uniform
    }

    pub fn objects(&self) -> &gpu::Buffer<GpuObjectData, B> {
        &self.objects
    }

    pub fn transforms(&self) -> &gpu::Buffer<GpuObjectTransform, B> {
        &self.transforms
    }

    pub fn uniforms(&self) -> &gpu::Buffer<GpuVolumeUniform, B> {
        &self.uniforms
    }
}

// Synchronization
impl<B: GpuBackend> GpuMirror<B> {
    /// Replaces both slot buffers with ones sized exactly for `slots`, re-publishes the uniform and uploads all
    /// slot data.
    /// - When an allocation fails, both slot buffers are released and the uniform reports zero objects, so the
    ///   mirror is consistently empty. The generation is bumped either way, old bind groups reference freed buffers.
    /// - All uploads are attempted, the first error is returned.
    #[profiling::function]
    pub fn reallocate_and_rebuild(&mut self, slots: &[&Primitive], config: &VolumeConfig) -> Result<()> {
        let previous = self.objects.len();

        self.generation += 1;
        self.stats.reallocations += 1;
        self.uniform = GpuVolumeUniform::new(slots.len() as u32, config);
        if let Err(allocation_error) = self.reallocate_slots(slots.len()) {
            error!("SDF volume buffers cannot hold {} slots: {}", slots.len(), allocation_error);
            self.objects.release(&self.gpu);
            self.transforms.release(&self.gpu);
            self.stale.objects = false;
            self.stale.transforms = false;
            self.uniform.object_count = 0;
            if let Err(publish_error) = self.publish_uniform() {
                warn!("Empty volume uniform not published: {}", publish_error);
            }
            return Err(allocation_error);
        }
        info!("SDF volume buffers reallocated {} -> {} slots (generation {})", previous, slots.len(), self.generation);

        let uniform = self.publish_uniform();
        let objects = self.update_object_data(slots);
        let transforms = self.update_transforms(slots);
        uniform.and(objects).and(transforms)
    }

    fn reallocate_slots(&mut self, slots: usize) -> Result<()> {
        self.objects.reallocate(&self.gpu, slots)?;
        self.transforms.reallocate(&self.gpu, slots)
    }

    /// Rebuilds the whole object buffer from `slots` and uploads it in one transfer.
    /// The buffer stays marked stale until an upload succeeds.
    #[profiling::function]
    pub fn update_object_data(&mut self, slots: &[&Primitive]) -> Result<()> {
        let records = slots.iter()
            .map(|primitive| GpuObjectData::from_primitive(primitive))
            .collect::<Vec<_>>();
        let uploaded = self.objects.upload(&self.gpu, &records);
        self.stale.objects = uploaded.is_err();
        uploaded?;
        self.stats.object_uploads += 1;
        debug!("Uploaded object data of {} slots", records.len());
        Ok(())
    }

    /// Rebuilds the whole transform buffer from `slots` and uploads it in one transfer.
    /// The buffer stays marked stale until an upload succeeds.
    #[profiling::function]
    pub fn update_transforms(&mut self, slots: &[&Primitive]) -> Result<()> {
        let records = slots.iter()
            .map(|primitive| GpuObjectTransform::from_primitive(primitive))
            .collect::<Vec<_>>();
        let uploaded = self.transforms.upload(&self.gpu, &records);
        self.stale.transforms = uploaded.is_err();
        uploaded?;
        self.stats.transform_uploads += 1;
        debug!("Uploaded transforms of {} slots", records.len());
        Ok(())
    }

    /// Writes the whole CPU copy of the uniform.
    pub fn publish_uniform(&mut self) -> Result<()> {
        let uploaded = self.uniforms.upload(&self.gpu, &[self.uniform]);
        self.stale.uniform = uploaded.is_err();
        uploaded
    }

    /// Writes the uniform fields which differ from `config`, slot buffers are not touched.
    #[profiling::function]
    pub fn publish_config(&mut self, config: &VolumeConfig) -> Result<()> {
        if self.uniform.smoothing != config.smoothing() {
            self.publish_smoothing(config.smoothing())?;
        }
        if self.uniform.features() != config.features() {
            self.publish_features(config.features())?;
        }
        Ok(())
    }

    /// On failure the CPU copy already holds the new value and the uniform is marked stale.
    pub fn publish_smoothing(&mut self, smoothing: f32) -> Result<()> {
        self.uniform.smoothing = smoothing;
        let uploaded = self.uniforms.upload_bytes(
            &self.gpu,
            offset_of!(GpuVolumeUniform, smoothing) as u64,
            bytemuck::bytes_of(&smoothing),
        );
        self.stale.uniform |= uploaded.is_err();
        uploaded?;
        self.stats.smoothing_uploads += 1;
        debug!("Published smoothing {}", smoothing);
        Ok(())
    }

    pub fn publish_features(&mut self, features: ShaderFeatures) -> Result<()> {
        let bits = features.bits();
        self.uniform.features = bits;
        let uploaded = self.uniforms.upload_bytes(
            &self.gpu,
            offset_of!(GpuVolumeUniform, features) as u64,
            bytemuck::bytes_of(&bits),
        );
        self.stale.uniform |= uploaded.is_err();
        uploaded?;
        self.stats.feature_uploads += 1;
        debug!("Published shader features {:?}", features);
        Ok(())
    }

    /// Frees all GPU buffers, safe to call any number of times.
    pub fn release(&mut self) {
        self.objects.release(&self.gpu);
        self.transforms.release(&self.gpu);
        self.uniforms.release(&self.gpu);
    }
}

impl<B: GpuBackend> Drop for GpuMirror<B> {
    fn drop(&mut self) {
        self.release();
    }
}

// Bind Groups
impl GpuMirror<gpu::Context> {
    #[profiling::function]
    pub fn create_bind_group_layout(gpu: &gpu::Context, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
        gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SDF volume bind group layout"),
            entries: &[
                // ObjectBuffer
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // ObjectTransformsBuffer
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Count, smoothing and feature switches
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
    }

    /// Binds the current generation of buffers, `None` while any of them is not allocated.
    #[profiling::function]
    pub fn create_bind_group(&self, layout: &wgpu::BindGroupLayout) -> Option<wgpu::BindGroup> {
        let objects    = self.objects.handle()?;
        let transforms = self.transforms.handle()?;
        let uniforms   = self.uniforms.handle()?;
        Some(self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SDF volume bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: objects.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: transforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        framework::{gpu::recording::RecordingBackend, math::Transform},
        sdf::AmbientOcclusionMode,
        SdfError,
    };

    use super::*;

    #[test]
    fn record_layouts_match_shader_strides() {
        assert_eq!(std::mem::size_of::<GpuObjectData>(), 32);
        assert_eq!(std::mem::size_of::<GpuObjectTransform>(), 64);
        assert_eq!(std::mem::size_of::<GpuVolumeUniform>(), 16);
        assert_eq!(offset_of!(GpuObjectData, color), 12);
        assert_eq!(offset_of!(GpuObjectData, kind), 28);
    }

    #[test]
    fn object_record_packs_params_color_and_kind() {
        let primitive = Primitive::torus(1.0, 0.25).with_color(glam::Vec4::new(0.1, 0.2, 0.3, 1.0));

        let record = GpuObjectData::from_primitive(&primitive);

        assert_eq!(record.params, [1.0, 0.25, 0.0]);
        assert_eq!(record.color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(record.kind, 1);
    }

    #[test]
    fn transform_record_holds_world_to_local() {
        let primitive = Primitive::sphere(1.0).with_transform(Transform::from_position(glam::Vec3::new(0.0, 2.0, 0.0)));

        let record = GpuObjectTransform::from_primitive(&primitive);

        let local = record.world_to_local.transform_point3(glam::Vec3::new(0.0, 2.0, 0.0));
        assert!(local.abs_diff_eq(glam::Vec3::ZERO, 1e-6));
    }

    #[test]
    fn new_mirror_publishes_initial_uniform() {
        let gpu = Arc::new(RecordingBackend::default());
        let config = VolumeConfig::default().with_smoothing(0.3).with_shadows(false);

        let mirror = GpuMirror::new(gpu.clone(), &config).unwrap();

        assert_eq!(gpu.records::<GpuVolumeUniform>(UNIFORM_BUFFER_LABEL), vec![GpuVolumeUniform::new(0, &config)]);
        assert!(!mirror.objects().is_allocated());
        assert_eq!(mirror.generation(), 0);
    }

    #[test]
    fn publishing_unchanged_config_writes_nothing() {
        let gpu = Arc::new(RecordingBackend::default());
        let config = VolumeConfig::default();
        let mut mirror = GpuMirror::new(gpu.clone(), &config).unwrap();
        gpu.clear_writes();

        mirror.publish_config(&config).unwrap();

        assert!(gpu.writes().is_empty());
        assert_eq!(mirror.stats(), SyncStats::default());
    }

    #[test]
    fn publishing_features_writes_only_the_feature_field() {
        let gpu = Arc::new(RecordingBackend::default());
        let config = VolumeConfig::default();
        let mut mirror = GpuMirror::new(gpu.clone(), &config).unwrap();
        gpu.clear_writes();

        let changed = config.with_ambient_occlusion(AmbientOcclusionMode::Off);
        mirror.publish_config(&changed).unwrap();

        let writes = gpu.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].offset, offset_of!(GpuVolumeUniform, features) as u64);
        assert_eq!(writes[0].len, 4);
        assert_eq!(gpu.records::<GpuVolumeUniform>(UNIFORM_BUFFER_LABEL)[0].features(), changed.features());
        assert_eq!(mirror.stats().smoothing_uploads, 0);
        assert_eq!(mirror.stats().feature_uploads, 1);
    }

    #[test]
    fn failed_allocation_leaves_mirror_consistently_empty() {
        let gpu = Arc::new(RecordingBackend::default());
        let config = VolumeConfig::default();
        let mut mirror = GpuMirror::new(gpu.clone(), &config).unwrap();
        let spheres = [Primitive::sphere(1.0), Primitive::sphere(2.0)];
        mirror.reallocate_and_rebuild(&[&spheres[0]], &config).unwrap();
        let generation = mirror.generation();
        gpu.limit_allocations_to(64);

        let result = mirror.reallocate_and_rebuild(&[&spheres[0], &spheres[1]], &config);

        assert!(matches!(result, Err(SdfError::ResourceExhausted { .. })));
        assert!(mirror.generation() > generation);
        assert!(!mirror.objects().is_allocated());
        assert!(!mirror.transforms().is_allocated());
        assert_eq!(mirror.len(), 0);
        assert_eq!(mirror.uniform().object_count, 0);
        assert_eq!(gpu.records::<GpuVolumeUniform>(UNIFORM_BUFFER_LABEL)[0].object_count, 0);
        assert_eq!(gpu.live_buffers(), 1);
    }

    #[test]
    fn failed_uniform_write_marks_uniform_stale_until_republished() {
        let gpu = Arc::new(RecordingBackend::default());
        let config = VolumeConfig::default();
        let mut mirror = GpuMirror::new(gpu.clone(), &config).unwrap();
        gpu.reject_writes_to(UNIFORM_BUFFER_LABEL);

        assert!(mirror.publish_config(&config.with_smoothing(0.5)).is_err());
        assert!(mirror.stale().uniform);
        assert_eq!(mirror.uniform().smoothing, 0.5);

        gpu.accept_all_writes();
        mirror.publish_uniform().unwrap();

        assert!(!mirror.stale().any());
        assert_eq!(gpu.records::<GpuVolumeUniform>(UNIFORM_BUFFER_LABEL)[0].smoothing, 0.5);
    }

    #[test]
    fn drop_releases_every_buffer() {
        let gpu = Arc::new(RecordingBackend::default());
        {
            let mut mirror = GpuMirror::new(gpu.clone(), &VolumeConfig::default()).unwrap();
            let sphere = Primitive::sphere(1.0);
            mirror.reallocate_and_rebuild(&[&sphere], &VolumeConfig::default()).unwrap();
            assert_eq!(gpu.live_buffers(), 3);
            mirror.release();
        }
        assert_eq!(gpu.live_buffers(), 0);
    }
}
