//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Reads the filter from `RUST_LOG`. Calling it twice is harmless.
pub fn init() {
    let _ = env_logger::try_init();
}
