use chrono::{DateTime, Utc};
use embench_app_api::ApplicationInstance;
use embench_domain::ResolutionDomain;
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct HandleInner {
    scratch_path: PathBuf,
    host: String,
    port: u16,
    started_at: DateTime<Utc>,
    app: Arc<dyn ApplicationInstance>,
    broadened: Arc<ResolutionDomain>,
    trial: Arc<ResolutionDomain>,
}

/// Read-only, cloneable handle onto a READY instance.
///
/// The handle shares ownership of the application reference and the
/// per-instance domains; the controller drops its own copies at stop so
/// the graph is reclaimed once the last handle goes away.
#[derive(Clone)]
pub struct InstanceHandle {
    inner: Arc<HandleInner>,
}

impl InstanceHandle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        scratch_path: PathBuf,
        host: String,
        port: u16,
        app: Arc<dyn ApplicationInstance>,
        broadened: Arc<ResolutionDomain>,
        trial: Arc<ResolutionDomain>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                scratch_path,
                host,
                port,
                started_at: Utc::now(),
                app,
                broadened,
                trial,
            }),
        }
    }

    pub fn scratch_path(&self) -> &Path {
        &self.inner.scratch_path
    }

    pub fn port(&self) -> u16 {
        self.inner.port
    }

    /// Root URL of the instance's listener.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.inner.host, self.inner.port)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    pub fn app(&self) -> Arc<dyn ApplicationInstance> {
        Arc::clone(&self.inner.app)
    }

    /// The application-plus-extensions domain.
    pub fn broadened_domain(&self) -> &Arc<ResolutionDomain> {
        &self.inner.broadened
    }

    /// The domain workload symbols must be defined in.
    pub fn trial_domain(&self) -> &Arc<ResolutionDomain> {
        &self.inner.trial
    }
}

impl std::fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("scratch_path", &self.inner.scratch_path)
            .field("url", &self.url())
            .field("started_at", &self.inner.started_at)
            .field("trial_domain", &self.inner.trial.to_string())
            .finish()
    }
}
