//! Workload capability traits and their domain bindings.
//!
//! Workloads and hooks are registered into a resolution domain as
//! type-erased binding structs; the adapter downcasts each binding
//! exactly once at load time and never again.

use async_trait::async_trait;
use embench_app_api::ApplicationInstance;
use embench_common::{HarnessResult, SymbolName};
use embench_domain::ResolutionDomain;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Poll interval for [`wait_until_quiet`].
pub const DEFAULT_QUIET_POLL: Duration = Duration::from_millis(100);

/// Everything a workload may touch during a sample.
#[derive(Clone)]
pub struct TrialContext {
    pub app: Arc<dyn ApplicationInstance>,
    /// Root URL of the instance's listener.
    pub url: String,
    /// The instance's scratch home.
    pub scratch_path: PathBuf,
}

/// A measured operation. Results are opaque to the harness; only the
/// workload's own code ever looks inside them.
#[async_trait]
pub trait MeasuredOperation: Send + Sync {
    async fn invoke(&self, context: &TrialContext) -> HarnessResult<Box<dyn Any + Send>>;
}

/// A lifecycle hook at trial or invocation granularity.
#[async_trait]
pub trait TrialHook: Send + Sync {
    async fn run(&self, context: &TrialContext) -> HarnessResult<()>;
}

/// Domain binding for a measured operation.
pub(crate) struct WorkloadBinding {
    pub(crate) operation: Arc<dyn MeasuredOperation>,
}

/// Domain binding for a lifecycle hook.
pub(crate) struct HookBinding {
    pub(crate) hook: Arc<dyn TrialHook>,
}

/// Register a measured operation under `name` in `domain`.
pub fn register_workload(
    domain: &ResolutionDomain,
    name: impl Into<SymbolName>,
    operation: Arc<dyn MeasuredOperation>,
) {
    domain.register(name, Arc::new(WorkloadBinding { operation }));
}

/// Register a lifecycle hook under `name` in `domain`.
pub fn register_hook(
    domain: &ResolutionDomain,
    name: impl Into<SymbolName>,
    hook: Arc<dyn TrialHook>,
) {
    domain.register(name, Arc::new(HookBinding { hook }));
}

/// Busy-wait until the application reports no pending background work.
pub async fn wait_until_quiet(app: &Arc<dyn ApplicationInstance>, poll: Duration) {
    while app.has_pending_work() {
        tokio::time::sleep(poll).await;
    }
}
