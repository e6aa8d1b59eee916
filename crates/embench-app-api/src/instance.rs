//! Application host and instance traits.
//!
//! `ApplicationHost::boot` hands the application everything it may touch:
//! a home directory inside the scratch environment, an already-bound
//! listener, the web-container resolution domain, settings, and the auth
//! realm. The returned `ApplicationInstance` is the controller's only
//! handle onto the running application.

use async_trait::async_trait;
use embench_common::{HarnessResult, ItemName, SymbolName};
use embench_domain::{ResolutionDomain, SymbolValue};
use embench_scratch::ExtensionArtifact;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::settings::{AppSettings, AuthRealm};

/// Opaque handle onto a named item inside the application. The harness
/// never inspects items; workloads downcast on their side of the boundary.
pub type ItemHandle = Arc<dyn Any + Send + Sync>;

/// One installed extension together with the symbols it contributes.
#[derive(Clone)]
pub struct InstalledExtension {
    pub artifact: ExtensionArtifact,
    pub symbols: Vec<(SymbolName, SymbolValue)>,
}

/// The running application's view of its installed extensions. The
/// controller folds the per-extension symbol sets into the broadened
/// resolution domain at startup completion.
#[derive(Clone, Default)]
pub struct ExtensionResolver {
    pub extensions: Vec<InstalledExtension>,
}

impl ExtensionResolver {
    /// All contributed symbols in extension order. Later extensions win
    /// on name collisions, matching local-table registration order.
    pub fn all_symbols(&self) -> Vec<(SymbolName, SymbolValue)> {
        self.extensions
            .iter()
            .flat_map(|ext| ext.symbols.iter().cloned())
            .collect()
    }
}

/// Everything an application receives at boot.
pub struct BootContext {
    /// Home directory, always inside the scratch environment.
    pub home_dir: PathBuf,
    /// Pre-bound listener the application must serve on.
    pub listener: TcpListener,
    /// The web-container resolution domain.
    pub web_domain: Arc<ResolutionDomain>,
    pub settings: AppSettings,
    pub realm: AuthRealm,
}

/// Boots an embedded application into a prepared environment.
#[async_trait]
pub trait ApplicationHost: Send + Sync {
    async fn boot(&self, context: BootContext) -> HarnessResult<Arc<dyn ApplicationInstance>>;
}

/// A booted application instance.
#[async_trait]
pub trait ApplicationInstance: Send + Sync {
    /// Readiness signal flipping to `true` once initialization completes.
    /// `None` means the application exposes no such signal and the
    /// controller proceeds optimistically.
    fn ready_signal(&self) -> Option<watch::Receiver<bool>>;

    /// The extension resolver, available once the instance is ready.
    /// Returning `None` at that point is a fatal startup error.
    fn extension_resolver(&self) -> Option<ExtensionResolver>;

    /// Look up a named item. `Ok(None)` when no such item exists.
    async fn lookup_item(&self, name: &ItemName) -> HarnessResult<Option<ItemHandle>>;

    /// Create a named item and return its handle.
    async fn create_item(&self, name: &ItemName) -> HarnessResult<ItemHandle>;

    /// Delete a named item. Idempotent: deleting an absent item succeeds.
    async fn delete_item(&self, name: &ItemName) -> HarnessResult<()>;

    /// True while background work queued inside the application is still
    /// executing.
    fn has_pending_work(&self) -> bool;

    /// Stop serving and join all application tasks. Must be safe to call
    /// on a partially initialized instance.
    async fn clean_shutdown(&self) -> HarnessResult<()>;
}
