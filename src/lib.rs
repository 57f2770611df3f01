pub mod framework;
pub mod sdf;

mod error;
pub use error::*;
