//! The embedded-instance lifecycle controller.
//!
//! One controller drives at most one live instance at a time through the
//! state machine: provision scratch, build the domain graph, bind the
//! listener, boot the application, synchronize with its initialization
//! once, then hand out a read-only `InstanceHandle`. `stop()` reverses
//! the sequence and reclaims everything the start acquired.

use embench_app_api::{ApplicationHost, ApplicationInstance, BootContext};
use embench_common::{HarnessError, HarnessResult};
use embench_domain::{
    broadened_domain, trial_domain, DomainGraph, DomainGraphBuilder, NamePattern, ResolutionDomain,
};
use embench_scratch::{
    materialize_extensions, provision, ExtensionArtifact, InstanceManifest, ScratchConfig,
    ScratchDir,
};
use embench_state::InstanceStateMachine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::InstanceConfig;
use crate::handle::InstanceHandle;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Drives one embedded application instance through its lifecycle.
pub struct InstanceController {
    config: InstanceConfig,
    host: Arc<dyn ApplicationHost>,
    ambient: Arc<ResolutionDomain>,
    machine: InstanceStateMachine,
    scratch: Option<ScratchDir>,
    handle: Option<InstanceHandle>,
}

impl InstanceController {
    pub fn new(
        config: InstanceConfig,
        host: Arc<dyn ApplicationHost>,
        ambient: Arc<ResolutionDomain>,
    ) -> Self {
        let instance_id = format!("instance-{}", NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed));
        Self {
            config,
            host,
            ambient,
            machine: InstanceStateMachine::new(&instance_id),
            scratch: None,
            handle: None,
        }
    }

    pub fn state(&self) -> embench_state::InstanceState {
        self.machine.current_state()
    }

    pub fn handle(&self) -> Option<&InstanceHandle> {
        self.handle.as_ref()
    }

    /// Provision, boot, and synchronize one instance. Fails fast when an
    /// instance is already active on this controller.
    pub async fn start(&mut self) -> HarnessResult<InstanceHandle> {
        if self.handle.is_some() || !self.machine.can_start() {
            return Err(HarnessError::operation_not_allowed(
                "start",
                self.machine.current_state().to_string(),
            ));
        }

        self.machine.transition_to_provisioning()?;
        let (mut scratch, artifacts) = match self.provision_scratch().await {
            Ok(provisioned) => provisioned,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        match self.boot_and_synchronize(&scratch, &artifacts).await {
            Ok(handle) => {
                self.machine.transition_to_ready()?;
                info!(
                    "Instance ready at {} (scratch {})",
                    handle.url(),
                    handle.scratch_path().display()
                );
                self.scratch = Some(scratch);
                self.handle = Some(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                self.fail(&e);
                reclaim_best_effort(&mut scratch);
                Err(e)
            }
        }
    }

    async fn provision_scratch(&self) -> HarnessResult<(ScratchDir, Vec<ExtensionArtifact>)> {
        let scratch = provision(&ScratchConfig {
            override_path: self.config.scratch_path.clone(),
            retain: self.config.retain_scratch,
        })?;
        let artifacts = materialize_extensions(
            &scratch,
            &self.config.extension_search_path,
            &self.config.required_extensions,
        )
        .await?;
        Ok((scratch, artifacts))
    }

    async fn boot_and_synchronize(
        &mut self,
        scratch: &ScratchDir,
        artifacts: &[ExtensionArtifact],
    ) -> HarnessResult<InstanceHandle> {
        let graph = self.build_domain_graph();

        let listener = TcpListener::bind((
            self.config.listen_host.as_str(),
            self.config.port.unwrap_or(0),
        ))
        .await
        .map_err(|e| {
            HarnessError::startup(format!(
                "Failed to bind listener on {}: {}",
                self.config.listen_host, e
            ))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| HarnessError::startup(format!("Failed to read bound address: {}", e)))?
            .port();
        self.machine.transition_to_listening()?;

        let app = self
            .host
            .boot(BootContext {
                home_dir: scratch.path().to_path_buf(),
                listener,
                web_domain: Arc::clone(&graph.web_container),
                settings: self.config.settings.clone(),
                realm: self.config.realm.clone(),
            })
            .await?;
        self.machine.transition_to_initializing()?;

        self.await_ready(&app).await?;

        let resolver = match app.extension_resolver() {
            Some(resolver) => resolver,
            None => {
                let err =
                    HarnessError::startup("Application exposes no extension resolver".to_string());
                shutdown_best_effort(&app).await;
                return Err(err);
            }
        };

        let broadened = broadened_domain(&graph.web_container, resolver.all_symbols());
        let trial = trial_domain(&broadened, &self.ambient);

        let manifest = InstanceManifest::new(
            scratch.path().display().to_string(),
            port,
            artifacts.iter().map(|a| a.name.clone()).collect(),
        );
        if let Err(e) = manifest.save(scratch.manifest_path()).await {
            warn!("Failed to write instance manifest: {}", e);
        }

        Ok(InstanceHandle::new(
            scratch.path().to_path_buf(),
            self.config.listen_host.clone(),
            port,
            app,
            broadened,
            trial,
        ))
    }

    fn build_domain_graph(&self) -> DomainGraph {
        let allow_list = self
            .config
            .allow_list
            .iter()
            .map(|p| NamePattern::from(p.as_str()))
            .collect();
        DomainGraphBuilder::new()
            .with_ambient(Arc::clone(&self.ambient))
            .with_allow_list(allow_list)
            .build()
    }

    /// Wait for the application's readiness signal under the configured
    /// bound. An application without a signal proceeds optimistically.
    async fn await_ready(&self, app: &Arc<dyn ApplicationInstance>) -> HarnessResult<()> {
        let Some(mut ready) = app.ready_signal() else {
            info!("Application exposes no readiness signal; proceeding optimistically");
            return Ok(());
        };

        // Drop the watch::Ref before matching so the borrow of `ready`
        // does not outlive it.
        let waited = tokio::time::timeout(self.config.init_timeout, ready.wait_for(|r| *r))
            .await
            .map(|r| r.map(|_| ()));
        match waited {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => {
                let err = HarnessError::startup(
                    "Readiness signal dropped before initialization completed".to_string(),
                );
                shutdown_best_effort(app).await;
                Err(err)
            }
            Err(_) => {
                warn!(
                    "Application initialization exceeded {:?}; shutting down",
                    self.config.init_timeout
                );
                if let Err(e) = app.clean_shutdown().await {
                    // A hung instance cannot be left running in-process.
                    error!(
                        "Shutdown after initialization timeout failed, terminating process: {}",
                        e
                    );
                    std::process::exit(1);
                }
                Err(HarnessError::startup(format!(
                    "Application initialization exceeded {:?}",
                    self.config.init_timeout
                )))
            }
        }
    }

    /// Tear down the active instance. Idempotent: stopping an already
    /// stopped controller is a no-op.
    pub async fn stop(&mut self) -> HarnessResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.machine.transition_to_stopping()?;

        // Re-acquire the application reference from the handle; the
        // controller holds no other copy.
        let app = handle.app();
        drop(handle);

        if let Err(e) = app.clean_shutdown().await {
            error!("Clean shutdown failed, terminating process: {}", e);
            std::process::exit(1);
        }
        drop(app);

        if let Some(mut scratch) = self.scratch.take() {
            if let Err(e) = scratch.reclaim() {
                if self.config.require_clean_reclamation {
                    self.fail(&e);
                    return Err(e);
                }
                warn!("Scratch reclamation failed: {}", e);
            }
        }

        self.machine.transition_to_terminated()?;
        info!("Instance terminated");
        Ok(())
    }

    fn fail(&mut self, reason: &HarnessError) {
        if let Err(e) = self.machine.transition_to_failed(reason.to_string()) {
            warn!("Failed-state transition rejected: {}", e);
        }
    }
}

async fn shutdown_best_effort(app: &Arc<dyn ApplicationInstance>) {
    if let Err(e) = app.clean_shutdown().await {
        warn!("Best-effort shutdown failed: {}", e);
    }
}

fn reclaim_best_effort(scratch: &mut ScratchDir) {
    if let Err(e) = scratch.reclaim() {
        warn!("Scratch reclamation failed: {}", e);
    }
}
