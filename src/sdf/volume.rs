use std::sync::Arc;

use slotmap::SlotMap;

use crate::{
    debug, error, warn,
    framework::gpu::{self, GpuBackend},
    Result, SdfError,
};

use super::{
    AmbientOcclusionMode,
    GpuMirror,
    Primitive,
    PrimitiveId,
    PrimitivePool,
    Registry,
    VolumeConfig,
};

/// Flags collected from all registered primitives in one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyScan {
    pub any_data_dirty:      bool,
    pub any_transform_dirty: bool,
}

/// The set of SDF primitives together with its GPU mirror.
///
/// Owns every primitive (registered or not), the registry defining the slot order and the mirror keeping GPU
/// buffers in sync. All mutation happens on the thread driving the frame.
#[derive(Debug)]
pub struct SdfVolume<B: GpuBackend> {
    primitives: PrimitivePool,
    registry:   Registry,
    mirror:     GpuMirror<B>,
    config:     VolumeConfig,
}

// Constructors
impl<B: GpuBackend> SdfVolume<B> {
    /// Creates an empty volume with zero-length slot buffers already allocated.
    #[profiling::function]
    pub fn new(gpu: Arc<B>, config: VolumeConfig) -> Result<Self> {
        let config = config.normalized();
        let mut volume = Self {
            primitives: SlotMap::with_key(),
            registry:   Registry::new(),
            mirror:     GpuMirror::new(gpu, &config)?,
            config,
        };
        volume.reallocate_and_rebuild()?;
        Ok(volume)
    }
}

// Getters
impl<B: GpuBackend> SdfVolume<B> {
    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id)
    }

    /// Mutable access for the owner of the primitive, setters record what has to be synchronized.
    pub fn primitive_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        self.primitives.get_mut(id)
    }

    pub fn primitives(&self) -> &PrimitivePool {
        &self.primitives
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn mirror(&self) -> &GpuMirror<B> {
        &self.mirror
    }

    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    pub fn is_registered(&self, id: PrimitiveId) -> bool {
        self.registry.contains(id)
    }

    pub fn slot_of(&self, id: PrimitiveId) -> Option<usize> {
        self.registry.slot_of(id)
    }

    /// Number of registered primitives.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

// Population
impl<B: GpuBackend> SdfVolume<B> {
    /// Adds a primitive without registering it, it stays invisible until [`SdfVolume::register`].
    pub fn insert(&mut self, primitive: Primitive) -> PrimitiveId {
        self.primitives.insert(primitive)
    }

    /// Adds and registers a primitive. Nothing is kept when the registration fails.
    pub fn spawn(&mut self, primitive: Primitive) -> Result<PrimitiveId> {
        let id = self.insert(primitive);
        if let Err(register_error) = self.register(id) {
            self.primitives.remove(id);
            return Err(register_error);
        }
        Ok(id)
    }

    /// Appends the primitive to the slot order and rebuilds the GPU buffers.
    /// - Returns `Ok(false)` without touching the GPU when it is already registered.
    /// - When the buffers cannot be rebuilt the registration is rolled back.
    #[profiling::function]
    pub fn register(&mut self, id: PrimitiveId) -> Result<bool> {
        if !self.primitives.contains_key(id) {
            warn!("Cannot register primitive {:?}, it does not exist", id);
            return Err(SdfError::UnknownPrimitive(id));
        }
        let previous = self.registry.clone();
        if !self.registry.register(id) {
            return Ok(false);
        }
        debug!("Registered primitive {:?} into slot {}", id, self.registry.len() - 1);
        self.rebuild_or_restore(previous)?;
        Ok(true)
    }

    /// Removes the primitive from the slot order and rebuilds the GPU buffers.
    /// - Returns `Ok(false)` without touching the GPU when it was not registered.
    /// - When the buffers cannot be rebuilt the primitive stays registered in its slot.
    #[profiling::function]
    pub fn deregister(&mut self, id: PrimitiveId) -> Result<bool> {
        let previous = self.registry.clone();
        if !self.registry.deregister(id) {
            return Ok(false);
        }
        debug!("Deregistered primitive {:?}", id);
        self.rebuild_or_restore(previous)?;
        Ok(true)
    }

    /// Registers or deregisters the primitive, returns whether the registration changed.
    pub fn set_enabled(&mut self, id: PrimitiveId, enabled: bool) -> Result<bool> {
        if enabled {
            self.register(id)
        } else {
            if !self.primitives.contains_key(id) {
                return Err(SdfError::UnknownPrimitive(id));
            }
            self.deregister(id)
        }
    }

    /// Deregisters and removes the primitive, returns it if it existed.
    pub fn destroy(&mut self, id: PrimitiveId) -> Result<Option<Primitive>> {
        self.deregister(id)?;
        Ok(self.primitives.remove(id))
    }

    /// Releases and recreates slot buffers sized to the registry, then uploads everything.
    #[profiling::function]
    pub fn reallocate_and_rebuild(&mut self) -> Result<()> {
        let slots = slot_primitives(&self.registry, &self.primitives);
        self.mirror.reallocate_and_rebuild(&slots, &self.config)
    }

    /// Rebuilds for the current registry, on allocation failure goes back to `previous` and rebuilds for it.
    /// The original error is returned in both cases.
    fn rebuild_or_restore(&mut self, previous: Registry) -> Result<()> {
        let rebuild_error = match self.reallocate_and_rebuild() {
            Err(rebuild_error @ SdfError::ResourceExhausted { .. }) => rebuild_error,
            other => return other,
        };
        warn!("Restoring previous {} registered primitives: {}", previous.len(), rebuild_error);
        self.registry = previous;
        if let Err(restore_error) = self.reallocate_and_rebuild() {
            error!("SDF volume buffers cannot be restored: {}", restore_error);
        }
        Err(rebuild_error)
    }
}

// Configuration
impl<B: GpuBackend> SdfVolume<B> {
    pub fn set_smoothing(&mut self, smoothing: f32) -> Result<()> {
        let config = self.config.with_smoothing(smoothing);
        self.set_config(config)
    }

    pub fn set_ambient_occlusion(&mut self, mode: AmbientOcclusionMode) -> Result<()> {
        let config = self.config.with_ambient_occlusion(mode);
        self.set_config(config)
    }

    pub fn set_shadows(&mut self, shadows: bool) -> Result<()> {
        let config = self.config.with_shadows(shadows);
        self.set_config(config)
    }

    /// Stores the configuration and re-publishes only the uniform fields that changed.
    pub fn set_config(&mut self, config: VolumeConfig) -> Result<()> {
        let config = config.normalized();
        if config == self.config {
            return Ok(());
        }
        self.config = config;
        self.mirror.publish_config(&self.config)
    }
}

// Frame synchronization, driven by `FrameDriver`
impl<B: GpuBackend> SdfVolume<B> {
    /// Reads and clears change flags of every registered primitive exactly once.
    #[profiling::function]
    pub(crate) fn take_dirty_flags(&mut self) -> DirtyScan {
        let mut scan = DirtyScan::default();
        for id in self.registry.iter() {
            let Some(primitive) = self.primitives.get_mut(id) else {
                continue;
            };
            scan.any_data_dirty |= primitive.is_dirty();
            scan.any_transform_dirty |= primitive.has_transform_changed();
            primitive.set_dirty(false);
            primitive.clear_transform_changed();
        }
        scan
    }

    pub(crate) fn update_object_data(&mut self) -> Result<()> {
        let slots = slot_primitives(&self.registry, &self.primitives);
        self.mirror.update_object_data(&slots)
    }

    pub(crate) fn republish_uniform(&mut self) -> Result<()> {
        self.mirror.publish_uniform()
    }

    pub(crate) fn update_transforms(&mut self) -> Result<()> {
        let slots = slot_primitives(&self.registry, &self.primitives);
        self.mirror.update_transforms(&slots)
    }
}

// Shading stage binding contract
impl SdfVolume<gpu::Context> {
    /// Layout of the bind group described by [`super::SHADER_BINDINGS`].
    pub fn bind_group_layout(gpu: &gpu::Context, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
        GpuMirror::<gpu::Context>::create_bind_group_layout(gpu, visibility)
    }

    /// Binds the buffers of the current [`GpuMirror::generation`], has to be called again after every reallocation.
    pub fn create_bind_group(&self, layout: &wgpu::BindGroupLayout) -> Option<wgpu::BindGroup> {
        self.mirror.create_bind_group(layout)
    }
}

/// Registered primitives in slot order.
/// Registered handles are always present in the pool, `destroy` deregisters before removing.
fn slot_primitives<'a>(registry: &Registry, primitives: &'a PrimitivePool) -> Vec<&'a Primitive> {
    let slots = registry.iter()
        .filter_map(|id| primitives.get(id))
        .collect::<Vec<_>>();
    debug_assert_eq!(slots.len(), registry.len(), "registry references a removed primitive");
    slots
}
