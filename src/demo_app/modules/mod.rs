pub mod raymarch;

mod continuous_rotation;
pub use continuous_rotation::*;

mod volume_controls;
pub use volume_controls::VolumeControls;

mod volume_sync;
pub use volume_sync::VolumeSync;
