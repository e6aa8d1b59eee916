//! Extension artifact discovery and materialization.
//!
//! Packaged extensions (`<name>.epk`) are discovered on an ordered search
//! path and copied into the scratch home's `extensions/` folder under the
//! installed name (`<name>.ext`). The embedded application picks them up
//! from there during boot. Naming is deterministic from the source file
//! stem; when two search-path directories carry the same extension, the
//! earlier directory wins.

use embench_common::{HarnessError, HarnessResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::ScratchDir;

/// Suffix of a packaged extension on the search path.
pub const PACKAGED_SUFFIX: &str = ".epk";

/// Suffix of an installed extension in the scratch home.
pub const INSTALLED_SUFFIX: &str = ".ext";

/// A packaged extension materialized into a scratch home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionArtifact {
    /// Extension name (the source file stem).
    pub name: String,
    /// Packaged artifact on the search path.
    pub source: PathBuf,
    /// Installed artifact in `<scratch>/extensions/`.
    pub installed: PathBuf,
}

fn packaged_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name
        .strip_suffix(PACKAGED_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(|stem| stem.to_string())
}

/// Scan the search path for packaged extensions and copy each into the
/// scratch extensions folder. Fails when any `required` extension was not
/// found on the search path.
pub async fn materialize_extensions(
    scratch: &ScratchDir,
    search_path: &[PathBuf],
    required: &[String],
) -> HarnessResult<Vec<ExtensionArtifact>> {
    let extensions_dir = scratch.extensions_dir();
    let mut seen: HashSet<String> = HashSet::new();
    let mut artifacts = Vec::new();

    for dir in search_path {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Skipping unreadable extension search directory {}: {}",
                    dir.display(),
                    e
                );
                continue;
            }
        };

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            HarnessError::provisioning(format!(
                "Failed to scan extension directory {}: {}",
                dir.display(),
                e
            ))
        })? {
            let source = entry.path();
            let Some(name) = packaged_name(&source) else {
                continue;
            };
            if !seen.insert(name.clone()) {
                debug!(
                    "Skipping shadowed extension '{}' at {}",
                    name,
                    source.display()
                );
                continue;
            }

            let installed = extensions_dir.join(format!("{}{}", name, INSTALLED_SUFFIX));
            tokio::fs::copy(&source, &installed).await.map_err(|e| {
                HarnessError::provisioning(format!(
                    "Failed to materialize extension '{}' from {}: {}",
                    name,
                    source.display(),
                    e
                ))
            })?;
            debug!("Materialized extension '{}' -> {}", name, installed.display());

            artifacts.push(ExtensionArtifact {
                name,
                source,
                installed,
            });
        }
    }

    for name in required {
        if !seen.contains(name) {
            return Err(HarnessError::provisioning(format!(
                "Required extension '{}' not found on the search path",
                name
            )));
        }
    }

    Ok(artifacts)
}
