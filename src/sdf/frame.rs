use crate::{debug, framework::gpu::GpuBackend, Result};

use super::SdfVolume;

/// What a single frame synchronization transferred to the GPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSync {
    pub object_data_uploaded: bool,
    pub transforms_uploaded:  bool,
}

impl FrameSync {
    pub fn any(&self) -> bool {
        self.object_data_uploaded || self.transforms_uploaded
    }
}

/// Per-frame synchronization of primitive changes into the GPU mirror.
///
/// Runs after all population changes of the frame and before the frame is rendered. First scans every
/// registered primitive reading and clearing its flags, only then rebuilds the buffers whose trigger fired or
/// whose previous upload failed.
#[derive(Debug, Default)]
pub struct FrameDriver {
    frame:  u64,
    synced: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of frames which uploaded anything.
    pub fn synced_frames(&self) -> u64 {
        self.synced
    }

    /// Every triggered upload is attempted, the first error is returned to the caller which decides whether to
    /// skip rendering of the frame. A buffer whose upload failed stays stale in the mirror and is retried by the
    /// next frame even though the flags were already cleared.
    #[profiling::function]
    pub fn run<B: GpuBackend>(&mut self, volume: &mut SdfVolume<B>) -> Result<FrameSync> {
        self.frame += 1;

        let scan = volume.take_dirty_flags();
        let stale = volume.mirror().stale();

        let mut sync = FrameSync::default();
        let mut first_error = None;
        if stale.uniform {
            if let Err(upload_error) = volume.republish_uniform() {
                first_error.get_or_insert(upload_error);
            }
        }
        if scan.any_data_dirty || stale.objects {
            match volume.update_object_data() {
                Ok(()) => sync.object_data_uploaded = true,
                Err(upload_error) => { first_error.get_or_insert(upload_error); },
            }
        }
        if scan.any_transform_dirty || stale.transforms {
            match volume.update_transforms() {
                Ok(()) => sync.transforms_uploaded = true,
                Err(upload_error) => { first_error.get_or_insert(upload_error); },
            }
        }

        if sync.any() {
            self.synced += 1;
            debug!("Frame {} synchronized {:?}", self.frame, sync);
        }
        match first_error {
            Some(upload_error) => Err(upload_error),
            None => Ok(sync),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        framework::{gpu::recording::RecordingBackend, math::Transform},
        sdf::{
            GpuObjectData, GpuObjectTransform, GpuVolumeUniform, Primitive, PrimitiveId, VolumeConfig,
            OBJECT_BUFFER_LABEL, TRANSFORM_BUFFER_LABEL, UNIFORM_BUFFER_LABEL,
        },
        SdfError,
    };

    use super::*;

    struct Fixture {
        gpu:    Arc<RecordingBackend>,
        volume: SdfVolume<RecordingBackend>,
        ids:    Vec<PrimitiveId>,
    }

    fn fixture() -> Fixture {
        let gpu = Arc::new(RecordingBackend::default());
        let mut volume = SdfVolume::new(gpu.clone(), VolumeConfig::default()).unwrap();
        let ids = vec![
            volume.spawn(Primitive::sphere(1.0)).unwrap(),
            volume.spawn(Primitive::cuboid(glam::Vec3::ONE)).unwrap(),
            volume.spawn(Primitive::plane(glam::Vec3::Y)).unwrap(),
        ];
        gpu.clear_writes();
        Fixture { gpu, volume, ids }
    }

    #[test]
    fn quiet_frame_uploads_nothing() {
        let Fixture { gpu, mut volume, .. } = fixture();
        let mut driver = FrameDriver::new();

        let sync = driver.run(&mut volume).unwrap();

        assert_eq!(sync, FrameSync::default());
        assert!(gpu.writes().is_empty());
        assert_eq!(driver.frame(), 1);
        assert_eq!(driver.synced_frames(), 0);
    }

    #[test]
    fn color_change_uploads_object_data_only() {
        let Fixture { gpu, mut volume, ids } = fixture();
        let red = glam::Vec4::new(1.0, 0.0, 0.0, 1.0);
        volume.primitive_mut(ids[1]).unwrap().set_color(red);

        let sync = FrameDriver::new().run(&mut volume).unwrap();

        assert_eq!(sync, FrameSync { object_data_uploaded: true, transforms_uploaded: false });
        assert_eq!(gpu.writes_to(OBJECT_BUFFER_LABEL), 1);
        assert_eq!(gpu.writes_to(TRANSFORM_BUFFER_LABEL), 0);
        assert_eq!(gpu.records::<GpuObjectData>(OBJECT_BUFFER_LABEL)[1].color, red.to_array());
    }

    #[test]
    fn move_uploads_transforms_only() {
        let Fixture { gpu, mut volume, ids } = fixture();
        let moved = Transform::from_position(glam::Vec3::new(0.0, 3.0, 0.0));
        volume.primitive_mut(ids[0]).unwrap().set_transform(moved);

        let sync = FrameDriver::new().run(&mut volume).unwrap();

        assert_eq!(sync, FrameSync { object_data_uploaded: false, transforms_uploaded: true });
        assert_eq!(gpu.writes_to(OBJECT_BUFFER_LABEL), 0);
        assert_eq!(gpu.writes_to(TRANSFORM_BUFFER_LABEL), 1);
        assert_eq!(
            gpu.records::<GpuObjectTransform>(TRANSFORM_BUFFER_LABEL)[0].world_to_local,
            moved.as_inverse_mat()
        );
    }

    #[test]
    fn flags_are_cleared_after_the_frame() {
        let Fixture { mut volume, ids, .. } = fixture();
        volume.primitive_mut(ids[0]).unwrap().set_params(glam::Vec3::splat(2.0));
        volume.primitive_mut(ids[2]).unwrap().set_transform(Transform::from_uniform_scale(2.0));
        volume.primitive_mut(ids[2]).unwrap().set_dirty(true);
        let mut driver = FrameDriver::new();

        let sync = driver.run(&mut volume).unwrap();
        assert_eq!(sync, FrameSync { object_data_uploaded: true, transforms_uploaded: true });

        for id in &ids {
            let primitive = volume.primitive(*id).unwrap();
            assert!(!primitive.is_dirty());
            assert!(!primitive.has_transform_changed());
        }
        assert_eq!(driver.run(&mut volume).unwrap(), FrameSync::default());
        assert_eq!(driver.synced_frames(), 1);
    }

    #[test]
    fn every_flag_is_cleared_even_when_an_earlier_one_fired() {
        let Fixture { mut volume, ids, .. } = fixture();
        for id in &ids {
            volume.primitive_mut(*id).unwrap().set_dirty(true);
        }

        FrameDriver::new().run(&mut volume).unwrap();

        assert!(ids.iter().all(|id| !volume.primitive(*id).unwrap().is_dirty()));
    }

    #[test]
    fn unregistered_primitives_are_not_scanned() {
        let Fixture { gpu, mut volume, .. } = fixture();
        let hidden = volume.insert(Primitive::sphere(1.0));
        volume.primitive_mut(hidden).unwrap().set_dirty(true);

        let sync = FrameDriver::new().run(&mut volume).unwrap();

        assert!(!sync.any());
        assert!(gpu.writes().is_empty());
        assert!(volume.primitive(hidden).unwrap().is_dirty());
    }

    #[test]
    fn registration_within_a_frame_is_visible_to_the_same_frame() {
        let Fixture { gpu, mut volume, .. } = fixture();
        let torus = volume.insert(Primitive::torus(1.0, 0.2));
        volume.primitive_mut(torus).unwrap().set_dirty(true);
        volume.register(torus).unwrap();

        let sync = FrameDriver::new().run(&mut volume).unwrap();

        assert!(sync.object_data_uploaded);
        let objects = gpu.records::<GpuObjectData>(OBJECT_BUFFER_LABEL);
        assert_eq!(objects.len(), 4);
        assert_eq!(objects[3], GpuObjectData::from_primitive(volume.primitive(torus).unwrap()));
    }

    #[test]
    fn upload_failure_is_returned_after_attempting_every_upload() {
        let Fixture { gpu, mut volume, ids } = fixture();
        volume.primitive_mut(ids[0]).unwrap().set_color(glam::Vec4::ONE);
        volume.primitive_mut(ids[0]).unwrap().set_transform(Transform::from_uniform_scale(2.0));
        gpu.reject_writes_to(OBJECT_BUFFER_LABEL);

        let result = FrameDriver::new().run(&mut volume);

        assert!(matches!(result, Err(SdfError::UploadFailed { label: OBJECT_BUFFER_LABEL, .. })));
        assert_eq!(gpu.writes_to(TRANSFORM_BUFFER_LABEL), 1);
        assert!(volume.mirror().stale().objects);
        assert!(!volume.mirror().stale().transforms);
    }

    #[test]
    fn failed_upload_is_retried_by_the_next_frame() {
        let Fixture { gpu, mut volume, ids } = fixture();
        let white = glam::Vec4::ONE;
        let moved = Transform::from_position(glam::Vec3::new(2.0, 0.0, 0.0));
        volume.primitive_mut(ids[0]).unwrap().set_color(white);
        volume.primitive_mut(ids[0]).unwrap().set_transform(moved);
        gpu.reject_writes_to(OBJECT_BUFFER_LABEL);
        let mut driver = FrameDriver::new();

        assert!(driver.run(&mut volume).is_err());
        gpu.accept_all_writes();
        let sync = driver.run(&mut volume).unwrap();

        assert_eq!(sync, FrameSync { object_data_uploaded: true, transforms_uploaded: false });
        assert!(!volume.mirror().stale().any());
        let primitive = volume.primitive(ids[0]).unwrap();
        assert_eq!(gpu.records::<GpuObjectData>(OBJECT_BUFFER_LABEL)[0], GpuObjectData::from_primitive(primitive));
        assert_eq!(gpu.records::<GpuObjectData>(OBJECT_BUFFER_LABEL)[0].color, white.to_array());
        assert_eq!(
            gpu.records::<GpuObjectTransform>(TRANSFORM_BUFFER_LABEL)[0].world_to_local,
            moved.as_inverse_mat()
        );
        assert_eq!(driver.run(&mut volume).unwrap(), FrameSync::default());
    }

    #[test]
    fn failed_config_publish_is_retried_by_the_next_frame() {
        let Fixture { gpu, mut volume, .. } = fixture();
        gpu.reject_writes_to(UNIFORM_BUFFER_LABEL);
        assert!(volume.set_smoothing(0.6).is_err());
        gpu.accept_all_writes();

        let sync = FrameDriver::new().run(&mut volume).unwrap();

        assert!(!sync.any());
        assert!(!volume.mirror().stale().uniform);
        assert_eq!(gpu.records::<GpuVolumeUniform>(UNIFORM_BUFFER_LABEL)[0], GpuVolumeUniform::new(3, volume.config()));
    }
}
