use thiserror::Error;

use crate::sdf::PrimitiveId;

/// Errors surfaced by the volume core.
///
/// Duplicate registration, removal of an absent primitive and releasing an already released buffer are
/// not errors and never show up here.
#[derive(Debug, Error)]
pub enum SdfError {
    /// The GPU could not provide memory for a buffer. Retrying without freeing other resources cannot succeed.
    #[error("GPU resource exhausted while allocating `{label}` ({bytes} bytes): {reason}")]
    ResourceExhausted {
        label:  &'static str,
        bytes:  u64,
        reason: String,
    },
    
    /// Writing data into a buffer was rejected.
    #[error("upload into `{label}` failed: {reason}")]
    UploadFailed {
        label:  &'static str,
        reason: String,
    },
    
    /// A handle which is not present in the primitive pool.
    #[error("primitive {0:?} does not exist")]
    UnknownPrimitive(PrimitiveId),
}

pub type Result<T> = std::result::Result<T, SdfError>;
