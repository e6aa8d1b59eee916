//! A minimal embeddable application implementing the harness boundary.
//!
//! Behaves like a small plugin-extensible server: serves trivial HTTP on
//! the listener it is handed, runs an asynchronous init task, keeps a
//! named item store, simulates queued background work, and reports the
//! extensions it finds in its home directory. Options make the awkward
//! cases reproducible on demand (slow init, no readiness signal, no
//! extension resolver).

use async_trait::async_trait;
use embench_app_api::{
    ApplicationHost, ApplicationInstance, BootContext, ExtensionResolver, InstalledExtension,
    ItemHandle,
};
use embench_common::{HarnessError, HarnessResult, ItemName, SymbolName};
use embench_scratch::{ExtensionArtifact, EXTENSIONS_DIR, INSTALLED_SUFFIX};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Symbol under which the application publishes its home directory into
/// the web-container domain. Value type: `Arc<PathBuf>`.
pub const HOME_SYMBOL: &str = "app.core.home";

/// Knobs for provoking specific startup behaviors.
#[derive(Debug, Clone)]
pub struct TestAppOptions {
    /// Artificial delay before the instance reports ready.
    pub init_delay: Duration,
    /// Expose a readiness signal; disabled models applications the
    /// controller must treat optimistically.
    pub expose_ready_signal: bool,
    /// Expose the extension resolver once ready.
    pub expose_extension_resolver: bool,
    /// How long each queued unit of background work takes.
    pub work_duration: Duration,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            init_delay: Duration::ZERO,
            expose_ready_signal: true,
            expose_extension_resolver: true,
            work_duration: Duration::ZERO,
        }
    }
}

/// Boots `TestApp` instances.
pub struct TestAppHost {
    options: TestAppOptions,
}

impl TestAppHost {
    pub fn new(options: TestAppOptions) -> Self {
        Self { options }
    }
}

impl Default for TestAppHost {
    fn default() -> Self {
        Self::new(TestAppOptions::default())
    }
}

#[async_trait]
impl ApplicationHost for TestAppHost {
    async fn boot(&self, context: BootContext) -> HarnessResult<Arc<dyn ApplicationInstance>> {
        let BootContext {
            home_dir,
            listener,
            web_domain,
            settings,
            realm,
        } = context;

        if !settings.is_hermetic() {
            return Err(HarnessError::application(
                "test application refuses non-hermetic settings",
            ));
        }
        if realm.accounts.is_empty() {
            return Err(HarnessError::application("auth realm has no accounts"));
        }

        web_domain.register(HOME_SYMBOL, Arc::new(home_dir.clone()));

        let resolver = if self.options.expose_extension_resolver {
            Some(scan_extensions(&home_dir)?)
        } else {
            None
        };

        let (ready_tx, ready_rx) = watch::channel(false);
        let app = Arc::new(TestApp {
            home_dir,
            ready_rx: self.options.expose_ready_signal.then_some(ready_rx),
            resolver,
            items: Mutex::new(HashMap::new()),
            pending_work: Arc::new(AtomicUsize::new(0)),
            work_duration: self.options.work_duration,
            tasks: Mutex::new(Vec::new()),
        });

        let accept_task = tokio::spawn(accept_loop(listener));
        let init_delay = self.options.init_delay;
        let init_task = tokio::spawn(async move {
            tokio::time::sleep(init_delay).await;
            // Receiver may be gone when the controller gave up.
            let _ = ready_tx.send(true);
        });
        app.tasks.lock().unwrap().extend([accept_task, init_task]);

        Ok(app)
    }
}

/// One booted test application.
pub struct TestApp {
    home_dir: PathBuf,
    ready_rx: Option<watch::Receiver<bool>>,
    resolver: Option<ExtensionResolver>,
    items: Mutex<HashMap<ItemName, ItemHandle>>,
    pending_work: Arc<AtomicUsize>,
    work_duration: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TestApp {
    pub fn home_dir(&self) -> &PathBuf {
        &self.home_dir
    }
}

/// A named item as workloads see it after downcasting.
#[derive(Debug)]
pub struct TestItem {
    pub name: ItemName,
}

#[async_trait]
impl ApplicationInstance for TestApp {
    fn ready_signal(&self) -> Option<watch::Receiver<bool>> {
        self.ready_rx.clone()
    }

    fn extension_resolver(&self) -> Option<ExtensionResolver> {
        self.resolver.clone()
    }

    async fn lookup_item(&self, name: &ItemName) -> HarnessResult<Option<ItemHandle>> {
        Ok(self.items.lock().unwrap().get(name).cloned())
    }

    async fn create_item(&self, name: &ItemName) -> HarnessResult<ItemHandle> {
        let mut items = self.items.lock().unwrap();
        if items.contains_key(name) {
            return Err(HarnessError::application(format!(
                "item '{}' already exists",
                name
            )));
        }
        let handle: ItemHandle = Arc::new(TestItem { name: name.clone() });
        items.insert(name.clone(), Arc::clone(&handle));
        drop(items);

        // Creating an item queues one unit of background work, like a
        // server scheduling a first build of a new job.
        if !self.work_duration.is_zero() {
            self.pending_work.fetch_add(1, Ordering::SeqCst);
            let pending = Arc::clone(&self.pending_work);
            let work_duration = self.work_duration;
            let task = tokio::spawn(async move {
                tokio::time::sleep(work_duration).await;
                pending.fetch_sub(1, Ordering::SeqCst);
            });
            self.tasks.lock().unwrap().push(task);
        }

        debug!("Created item '{}'", name);
        Ok(handle)
    }

    async fn delete_item(&self, name: &ItemName) -> HarnessResult<()> {
        // Idempotent: deleting an absent item is not an error.
        self.items.lock().unwrap().remove(name);
        Ok(())
    }

    fn has_pending_work(&self) -> bool {
        self.pending_work.load(Ordering::SeqCst) > 0
    }

    async fn clean_shutdown(&self) -> HarnessResult<()> {
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Application task ended abnormally: {}", e);
                }
            }
        }
        self.items.lock().unwrap().clear();
        debug!("Test application shut down");
        Ok(())
    }
}

/// Serve a canned HTTP response per connection until aborted.
async fn accept_loop(listener: TcpListener) {
    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    // Drain whatever request bytes arrive first.
                    let _ = stream.read(&mut buf).await;
                    let _ = stream
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                        .await;
                });
            }
            Err(e) => {
                warn!("Accept failed: {}", e);
                return;
            }
        }
    }
}

/// Build the extension resolver from the installed artifacts in the home
/// directory. Each extension contributes one `<name>.descriptor` symbol
/// whose value is the artifact's content (`Arc<String>`).
fn scan_extensions(home_dir: &std::path::Path) -> HarnessResult<ExtensionResolver> {
    let extensions_dir = home_dir.join(EXTENSIONS_DIR);
    let mut extensions = Vec::new();

    let entries = std::fs::read_dir(&extensions_dir).map_err(|e| {
        HarnessError::application(format!(
            "cannot read extensions directory {}: {}",
            extensions_dir.display(),
            e
        ))
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::application(e.to_string()))?;
        let installed = entry.path();
        let Some(name) = installed
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(|f| f.strip_suffix(INSTALLED_SUFFIX))
        else {
            continue;
        };
        let content = std::fs::read_to_string(&installed)
            .map_err(|e| HarnessError::application(e.to_string()))?;

        extensions.push(InstalledExtension {
            artifact: ExtensionArtifact {
                name: name.to_string(),
                source: installed.clone(),
                installed: installed.clone(),
            },
            symbols: vec![(
                SymbolName::from(format!("{}.descriptor", name)),
                Arc::new(content) as _,
            )],
        });
    }

    Ok(ExtensionResolver { extensions })
}
