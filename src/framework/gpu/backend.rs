use std::fmt::Debug;

use crate::Result;

/// The part of a GPU device needed to keep typed buffers in sync with CPU state.
///
/// Implemented by the wgpu [`Context`](super::Context). Everything that owns GPU buffers goes through this
/// seam, so the synchronization logic does not care which device it talks to.
pub trait GpuBackend {
    /// Device handle of one allocated buffer.
    type Buffer: Debug;
    
    /// Allocates a buffer of `size` bytes.
    /// - Fails with [`SdfError::ResourceExhausted`](crate::SdfError::ResourceExhausted) when the device is out of memory.
    fn create_buffer(&self, label: &'static str, size: u64, usage: wgpu::BufferUsages) -> Result<Self::Buffer>;
    
    /// Copies `data` into `buffer` starting at byte `offset`.
    fn write_buffer(&self, label: &'static str, buffer: &Self::Buffer, offset: u64, data: &[u8]) -> Result<()>;
    
    /// Frees the buffer memory. Consumes the handle, so a buffer cannot be released twice.
    fn release_buffer(&self, buffer: Self::Buffer);
}
