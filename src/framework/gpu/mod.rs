mod backend;
mod buffers;
mod context;

#[cfg(test)]
pub mod recording;

pub use backend::*;
pub use buffers::*;
pub use context::*;
