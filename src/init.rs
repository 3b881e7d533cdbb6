//! Global directory management
//!
//! Keeps the embedding model cache in a single per-user location so repeated
//! invocations (and concurrent processes) share one downloaded model.

use std::path::PathBuf;
use std::sync::OnceLock;

#[cfg(test)]
const GLOBAL_DIR_NAME: &str = ".textclust-test";

#[cfg(not(test))]
const GLOBAL_DIR_NAME: &str = ".textclust";

// Global directory cache
static GLOBAL_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the global textclust directory
/// Returns ~/.textclust on Unix-like systems
pub fn global_dir() -> PathBuf {
    GLOBAL_DIR
        .get_or_init(|| {
            dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(GLOBAL_DIR_NAME)
        })
        .clone()
}

/// Get the models cache directory
/// Returns ~/.textclust/models/
pub fn models_dir() -> PathBuf {
    global_dir().join("models")
}

/// Initialize the global directory structure
pub fn init_global_dirs() -> Result<(), std::io::Error> {
    let models = models_dir();
    if !models.exists() {
        std::fs::create_dir_all(&models)?;
    }
    Ok(())
}
