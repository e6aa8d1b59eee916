//! Instance manifest persisted into the scratch home.
//!
//! Written when an instance reaches READY so a retained scratch directory
//! can be inspected post-mortem: which port the instance was bound to,
//! when it started, and which extensions were materialized.

use embench_common::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Manifest file name inside the scratch home.
pub const MANIFEST_FILE: &str = "instance.json";

/// Manifest data structure (persisted as JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceManifest {
    pub scratch_path: String,
    pub port: u16,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub extensions: Vec<String>,
}

impl InstanceManifest {
    pub fn new(scratch_path: impl Into<String>, port: u16, extensions: Vec<String>) -> Self {
        Self {
            scratch_path: scratch_path.into(),
            port,
            started_at: chrono::Utc::now(),
            extensions,
        }
    }

    /// Save the manifest to disk (atomic write).
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> HarnessResult<()> {
        let path = path.as_ref();

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            HarnessError::provisioning(format!("Failed to serialize instance manifest: {}", e))
        })?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, json).await.map_err(|e| {
            HarnessError::provisioning(format!(
                "Failed to write instance manifest {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            HarnessError::provisioning(format!(
                "Failed to rename instance manifest to {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Load a manifest from disk.
    pub async fn load<P: AsRef<Path>>(path: P) -> HarnessResult<Self> {
        let content = tokio::fs::read_to_string(&path).await?;
        serde_json::from_str(&content).map_err(|e| {
            HarnessError::provisioning(format!("Failed to parse instance manifest: {}", e))
        })
    }
}
