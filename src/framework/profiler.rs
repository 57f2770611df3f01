//! Profiling session. Without the `json_trace` feature all `profiling` scopes compile to nothing.

#[cfg(feature = "json_trace")]
pub use tracing_chrome::FlushGuard;

#[cfg(feature = "json_trace")]
const PROFILE_DIR: &str = "profile";

/// Routes `profiling` scopes into `profile/<name>.json` (chrome trace format).
/// The trace is flushed when the returned guard is dropped.
#[cfg(feature = "json_trace")]
pub fn begin_session(name: &str) -> anyhow::Result<FlushGuard> {
    use anyhow::Context as _;
    use tracing_subscriber::prelude::*;
    
    std::fs::create_dir_all(PROFILE_DIR)
        .with_context(|| format!("Failed to prepare `{PROFILE_DIR}` directory"))?;
    
    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
        .file(format!("{PROFILE_DIR}/{name}.json"))
        .build();
    
    tracing_subscriber::registry()
        .with(chrome_layer)
        .try_init()?;
    
    Ok(guard)
}
