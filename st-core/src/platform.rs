//! Platform-specific directory lookup.

use std::path::PathBuf;
use crate::error::{StError, StResult};

/// Resolves per-platform locations for configuration and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform;

impl Platform {
    /// Get the platform-specific configuration directory.
    ///
    /// - Windows: `%APPDATA%/Sailthru`
    /// - macOS: `~/Library/Application Support/Sailthru`
    /// - Linux: `~/.config/Sailthru`
    pub fn config_dir() -> StResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| StError::Config("could not determine config directory".into()))?;
        Ok(base.join(crate::constants::APP_NAME))
    }

    /// Get the platform-specific application data directory.
    pub fn data_dir() -> StResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| StError::Config("could not determine data directory".into()))?;
        Ok(base.join(crate::constants::APP_NAME))
    }
}
