//! Scenably Common Library
//!
//! Shared types and utilities for the Scenably session manager.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

/// Scenably version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default data path
pub fn default_data_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".scenably")
}

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    default_data_path().join("config.toml")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        #[cfg(windows)]
        {
            std::env::var_os("USERPROFILE").map(std::path::PathBuf::from)
        }
        #[cfg(not(windows))]
        {
            std::env::var_os("HOME").map(std::path::PathBuf::from)
        }
    }
}
