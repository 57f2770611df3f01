use std::{marker::PhantomData, fmt::Debug};

use crate::{debug, Result, SdfError};

use super::GpuBackend;

/// Typed GPU buffer holding a fixed number of `I` records.
///
/// The buffer never grows on its own. Changing the record count is an explicit [`Buffer::reallocate`], which
/// always releases the old allocation before creating the new one.
#[derive(Debug)]
pub struct Buffer<I, B>
where
    I: Debug + Copy + bytemuck::Pod,
    B: GpuBackend,
{
    /// Label of buffer on GPU.
    pub label: &'static str,
    /// Buffer on GPU, `None` when never allocated or already released.
    handle: Option<B::Buffer>,
    /// The number of records the buffer describes.
    len: usize,
    /// The number of records the allocation can hold, never less than one while allocated.
    capacity: usize,
    usage: wgpu::BufferUsages,
    _phantom: PhantomData<I>,
}

// Statics (Helpers, Constructors)
impl<I, B> Buffer<I, B>
where
    I: Debug + Copy + bytemuck::Pod,
    B: GpuBackend,
{
    /// Creates a buffer description without allocating anything on the GPU.
    pub fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            handle: None,
            len: 0,
            capacity: 0,
            usage,
            _phantom: PhantomData,
        }
    }

    /// Helper function to compute how many bytes will occupy given number of items in this buffer
    pub fn bytes_for_item_count(count: usize) -> u64 {
        (count * std::mem::size_of::<I>()) as u64
    }
}

// Instance methods
impl<I, B> Buffer<I, B>
where
    I: Debug + Copy + bytemuck::Pod,
    B: GpuBackend,
{
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn usage(&self) -> wgpu::BufferUsages {
        self.usage
    }

    pub fn is_allocated(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&B::Buffer> {
        self.handle.as_ref()
    }

    /// Returns allocated number of bytes (on GPU) for this buffer
    pub fn byte_size(&self) -> u64 {
        Self::bytes_for_item_count(self.capacity)
    }

    /// Replaces the allocation with a new one sized for exactly `len` records.
    /// - The old allocation is released first, even when the size does not change.
    /// - Zero records are valid: the allocation then holds a single unused record because zero sized bindings are
    ///   rejected by the GPU, `len()` stays zero.
    /// - On failure the buffer is left unallocated.
    #[profiling::function]
    pub fn reallocate(&mut self, gpu: &B, len: usize) -> Result<()> {
        self.release(gpu);

        let capacity = len.max(1);
        let handle = gpu.create_buffer(self.label, Self::bytes_for_item_count(capacity), self.usage)?;

        self.handle   = Some(handle);
        self.len      = len;
        self.capacity = capacity;
        Ok(())
    }

    /// Frees the GPU allocation. Calling this on an unallocated buffer does nothing.
    pub fn release(&mut self, gpu: &B) {
        if let Some(handle) = self.handle.take() {
            debug!("Releasing buffer `{}` ({} records)", self.label, self.capacity);
            gpu.release_buffer(handle);
        }
        self.len = 0;
        self.capacity = 0;
    }

    /// Uploads the whole content of the buffer in one transfer.
    /// - `data` must contain exactly `len()` records, a different count would shift records out of their slots.
    #[profiling::function]
    pub fn upload(&self, gpu: &B, data: &[I]) -> Result<()> {
        let handle = self.allocated_handle()?;
        if data.len() != self.len {
            return Err(SdfError::UploadFailed {
                label:  self.label,
                reason: format!("expected {} records, got {}", self.len, data.len()),
            });
        }
        if data.is_empty() {
            return Ok(());
        }
        gpu.write_buffer(self.label, handle, 0, bytemuck::cast_slice(data))
    }

    /// Overwrites a byte range inside the allocation, used to update single fields of uniform records.
    pub fn upload_bytes(&self, gpu: &B, offset: u64, bytes: &[u8]) -> Result<()> {
        let handle = self.allocated_handle()?;
        if offset + bytes.len() as u64 > self.byte_size() {
            return Err(SdfError::UploadFailed {
                label:  self.label,
                reason: format!("range {}..{} is out of {} bytes", offset, offset + bytes.len() as u64, self.byte_size()),
            });
        }
        gpu.write_buffer(self.label, handle, offset, bytes)
    }

    fn allocated_handle(&self) -> Result<&B::Buffer> {
        self.handle.as_ref().ok_or_else(|| SdfError::UploadFailed {
            label:  self.label,
            reason: "buffer is not allocated".to_owned(),
        })
    }
}
