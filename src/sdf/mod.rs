
mod primitive;
pub use primitive::*;

mod registry;
pub use registry::*;

mod config;
pub use config::*;

mod mirror;
pub use mirror::*;

mod volume;
pub use volume::*;

mod frame;
pub use frame::*;

mod description;
pub use description::*;
