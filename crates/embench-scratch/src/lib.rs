//! # Embench Scratch
//!
//! Scratch environment provisioning for embedded-instance runs.
//!
//! This crate provides functionality for:
//! - Provisioning a fresh, uniquely-named scratch home directory per run
//! - Reclaiming scratch directories, with a drop-time safety net
//! - A process-wide registry of live scratch paths for signal handlers
//! - Extension artifact discovery and materialization
//! - The `instance.json` manifest written when an instance reaches READY

use embench_common::{HarnessError, HarnessResult};
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub mod artifacts;
pub mod manifest;

pub use artifacts::{
    materialize_extensions, ExtensionArtifact, INSTALLED_SUFFIX, PACKAGED_SUFFIX,
};
pub use manifest::{InstanceManifest, MANIFEST_FILE};

/// Subdirectory of the scratch home holding installed extension artifacts.
pub const EXTENSIONS_DIR: &str = "extensions";

const SCRATCH_PREFIX: &str = "embench-home-";

lazy_static! {
    /// Live scratch paths not yet reclaimed. The runner's signal handler
    /// purges this registry so an interrupted run does not leak temp
    /// directories.
    static ref LIVE_SCRATCH: Mutex<HashSet<PathBuf>> = Mutex::new(HashSet::new());
}

fn register_live(path: &Path) {
    LIVE_SCRATCH.lock().unwrap().insert(path.to_path_buf());
}

fn unregister_live(path: &Path) {
    LIVE_SCRATCH.lock().unwrap().remove(path);
}

/// Delete every registered live scratch directory. Intended for signal
/// handlers; failures are logged and skipped.
pub fn purge_registered() -> usize {
    let paths: Vec<PathBuf> = LIVE_SCRATCH.lock().unwrap().drain().collect();
    let mut purged = 0;
    for path in paths {
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                debug!("Purged scratch directory {}", path.display());
                purged += 1;
            }
            Err(e) => warn!("Failed to purge scratch directory {}: {}", path.display(), e),
        }
    }
    purged
}

/// Configuration for scratch provisioning.
#[derive(Debug, Clone, Default)]
pub struct ScratchConfig {
    /// Explicit scratch location. Opting into a fixed path allows reuse
    /// across runs; without `retain` any stale tree is wiped first.
    pub override_path: Option<PathBuf>,

    /// Keep the scratch directory after reclamation (post-mortem
    /// inspection).
    pub retain: bool,
}

/// An owned scratch home directory.
///
/// Exactly one `ScratchDir` owns a given path. Dropping an unreclaimed,
/// non-retained directory deletes it best-effort.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    retain: bool,
    reclaimed: bool,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extensions_dir(&self) -> PathBuf {
        self.path.join(EXTENSIONS_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    pub fn is_retained(&self) -> bool {
        self.retain
    }

    /// Recursively delete the scratch directory (no-op when retained).
    /// A deletion failure is returned for the caller to log; the drop
    /// safety net will retry.
    pub fn reclaim(&mut self) -> HarnessResult<()> {
        if self.reclaimed {
            return Ok(());
        }
        if self.retain {
            debug!("Retaining scratch directory {}", self.path.display());
            unregister_live(&self.path);
            self.reclaimed = true;
            return Ok(());
        }
        std::fs::remove_dir_all(&self.path).map_err(|e| {
            HarnessError::reclamation(self.path.display().to_string(), e.to_string())
        })?;
        unregister_live(&self.path);
        self.reclaimed = true;
        debug!("Reclaimed scratch directory {}", self.path.display());
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.reclaimed || self.retain {
            return;
        }
        unregister_live(&self.path);
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(
                "Failed to reclaim scratch directory {} on drop: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Provision a scratch home directory with an eagerly created
/// `extensions/` subfolder.
pub fn provision(config: &ScratchConfig) -> HarnessResult<ScratchDir> {
    let path = match &config.override_path {
        Some(path) => {
            if path.exists() && !config.retain {
                std::fs::remove_dir_all(path).map_err(|e| {
                    HarnessError::provisioning(format!(
                        "Failed to wipe stale scratch directory {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
            std::fs::create_dir_all(path).map_err(|e| {
                HarnessError::provisioning(format!(
                    "Failed to create scratch directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
            path.clone()
        }
        None => tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| {
                HarnessError::provisioning(format!("Failed to create scratch directory: {}", e))
            })?
            .into_path(),
    };

    let extensions = path.join(EXTENSIONS_DIR);
    std::fs::create_dir_all(&extensions).map_err(|e| {
        HarnessError::provisioning(format!(
            "Failed to create extensions directory {}: {}",
            extensions.display(),
            e
        ))
    })?;

    register_live(&path);
    debug!("Provisioned scratch directory {}", path.display());

    Ok(ScratchDir {
        path,
        retain: config.retain,
        reclaimed: false,
    })
}
