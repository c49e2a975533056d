/*!
 * Staging area, system directory and filesystem name
 */

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::StagingConfig;
use crate::error::{BridgeError, Result};

/// Filesystem locations handed out to the legacy client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    staging_dir: Option<PathBuf>,
    system_dir: PathBuf,
    default_fs: String,
}

impl StagingArea {
    pub fn new(config: &StagingConfig) -> Self {
        Self {
            staging_dir: config.staging_dir.clone(),
            system_dir: config.system_dir.clone(),
            default_fs: config.default_fs.clone(),
        }
    }

    /// URI of the default filesystem
    pub fn filesystem_name(&self) -> &str {
        &self.default_fs
    }

    /// Directory where job resources are staged before submission
    ///
    /// # Errors
    ///
    /// `BridgeError::Configuration` when no staging directory is configured.
    pub fn staging_area_dir(&self) -> Result<&Path> {
        self.staging_dir.as_deref().ok_or_else(|| {
            BridgeError::Configuration("staging.staging_dir is not configured".to_string())
        })
    }

    /// The system directory, untouched
    pub fn system_dir(&self) -> &Path {
        &self.system_dir
    }

    /// Delete the system directory and everything below it, then return it
    ///
    /// A directory that does not exist yet counts as clean.
    pub async fn ensure_clean_system_dir(&self) -> Result<PathBuf> {
        match tokio::fs::remove_dir_all(&self.system_dir).await {
            Ok(()) => {
                warn!(
                    "Removed system directory {} and its contents",
                    self.system_dir.display()
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("System directory {} does not exist", self.system_dir.display());
            }
            Err(e) => return Err(BridgeError::Io(e)),
        }

        Ok(self.system_dir.clone())
    }
}
