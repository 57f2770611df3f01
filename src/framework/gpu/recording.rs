//! In-memory [`GpuBackend`] used by tests. Keeps buffer contents on the CPU and records every write.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};

use crate::{Result, SdfError};

use super::GpuBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingHandle {
    pub id:    u64,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub label:  &'static str,
    pub offset: u64,
    pub len:    usize,
}

#[derive(Debug)]
struct RecordedBuffer {
    label:    &'static str,
    contents: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id:          Cell<u64>,
    buffers:          RefCell<BTreeMap<u64, RecordedBuffer>>,
    writes:           RefCell<Vec<RecordedWrite>>,
    released:         Cell<usize>,
    allocation_limit: Cell<Option<u64>>,
    rejected_label:   Cell<Option<&'static str>>,
}

impl GpuBackend for RecordingBackend {
    type Buffer = RecordingHandle;

    fn create_buffer(&self, label: &'static str, size: u64, _usage: wgpu::BufferUsages) -> Result<RecordingHandle> {
        if let Some(limit) = self.allocation_limit.get() {
            if size > limit {
                return Err(SdfError::ResourceExhausted {
                    label,
                    bytes:  size,
                    reason: "allocation limit reached".to_owned(),
                });
            }
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.buffers.borrow_mut().insert(id, RecordedBuffer { label, contents: vec![0; size as usize] });
        Ok(RecordingHandle { id, label })
    }

    fn write_buffer(&self, label: &'static str, buffer: &RecordingHandle, offset: u64, data: &[u8]) -> Result<()> {
        if self.rejected_label.get() == Some(label) {
            return Err(SdfError::UploadFailed { label, reason: "write rejected".to_owned() });
        }
        let mut buffers = self.buffers.borrow_mut();
        let Some(recorded) = buffers.get_mut(&buffer.id) else {
            return Err(SdfError::UploadFailed { label, reason: "write into a released buffer".to_owned() });
        };
        let range = offset as usize..offset as usize + data.len();
        if range.end > recorded.contents.len() {
            return Err(SdfError::UploadFailed { label, reason: "write out of bounds".to_owned() });
        }
        recorded.contents[range].copy_from_slice(data);
        self.writes.borrow_mut().push(RecordedWrite { label, offset, len: data.len() });
        Ok(())
    }

    fn release_buffer(&self, buffer: RecordingHandle) {
        let removed = self.buffers.borrow_mut().remove(&buffer.id);
        assert!(removed.is_some(), "buffer {:?} released twice", buffer);
        self.released.set(self.released.get() + 1);
    }
}

impl RecordingBackend {
    /// Every following allocation larger than `bytes` fails as if the device ran out of memory.
    pub fn limit_allocations_to(&self, bytes: u64) {
        self.allocation_limit.set(Some(bytes));
    }

    /// Every following write into buffers with given label fails.
    pub fn reject_writes_to(&self, label: &'static str) {
        self.rejected_label.set(Some(label));
    }

    /// Lifts the rejection set by [`RecordingBackend::reject_writes_to`].
    pub fn accept_all_writes(&self) {
        self.rejected_label.set(None);
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.borrow().len()
    }

    pub fn released_buffers(&self) -> usize {
        self.released.get()
    }

    /// Size in bytes of the live buffer with given label.
    pub fn buffer_size(&self, label: &str) -> Option<usize> {
        self.buffers.borrow()
            .values()
            .find(|buffer| buffer.label == label)
            .map(|buffer| buffer.contents.len())
    }

    /// Content of the live buffer with given label decoded as records.
    pub fn records<I: bytemuck::Pod>(&self, label: &str) -> Vec<I> {
        self.buffers.borrow()
            .values()
            .find(|buffer| buffer.label == label)
            .map(|buffer| {
                buffer.contents
                    .chunks_exact(std::mem::size_of::<I>())
                    .map(bytemuck::pod_read_unaligned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of writes into buffers with given label since the last [`RecordingBackend::clear_writes`].
    pub fn writes_to(&self, label: &str) -> usize {
        self.writes.borrow().iter().filter(|write| write.label == label).count()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.borrow().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }
}
