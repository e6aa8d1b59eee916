use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use std::any::Any;
use std::sync::Arc;
use tracing::{error, info, warn};

use embench_app_api::ApplicationInstance;
use embench_common::{HarnessResult, ItemName};
use embench_domain::ResolutionDomain;
use embench_instance::{InstanceConfig, InstanceController};
use embench_testapp::{TestAppHost, TestAppOptions};
use embench_trial::{
    register_hook, register_workload, wait_until_quiet, MeasuredOperation, TrialContext,
    TrialDescriptor, TrialHandle, TrialHook, DEFAULT_QUIET_POLL,
};

const WORKLOAD_SYMBOL: &str = "embench.measure.create_item";
const TEARDOWN_SYMBOL: &str = "embench.measure.delete_item";
const ITEM_NAME: &str = "p";

/// Embench trial runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Samples per trial
    #[arg(long, default_value_t = 10)]
    samples: u32,

    /// Full start/trial/stop cycles to run
    #[arg(long, default_value_t = 1)]
    cycles: u32,
}

/// Creates the well-known item; the per-sample result is its handle.
struct CreateItem;

#[async_trait]
impl MeasuredOperation for CreateItem {
    async fn invoke(&self, context: &TrialContext) -> HarnessResult<Box<dyn Any + Send>> {
        let handle = context.app.create_item(&ItemName::from(ITEM_NAME)).await?;
        Ok(Box::new(handle))
    }
}

/// Deletes the well-known item after every measured call so samples stay
/// independent.
struct DeleteItem;

#[async_trait]
impl TrialHook for DeleteItem {
    async fn run(&self, context: &TrialContext) -> HarnessResult<()> {
        context.app.delete_item(&ItemName::from(ITEM_NAME)).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.debug)?;

    info!("Starting embench runner");

    let config = match &args.config {
        Some(path) => {
            info!("Config file: {}", path);
            InstanceConfig::load_from_file(path)?
        }
        None => InstanceConfig::default(),
    };

    spawn_signal_handler();

    // The runner's own domain; trial domains re-bind these symbols per
    // instance.
    let ambient = ResolutionDomain::root("ambient");
    register_workload(&ambient, WORKLOAD_SYMBOL, Arc::new(CreateItem));
    register_hook(&ambient, TEARDOWN_SYMBOL, Arc::new(DeleteItem));

    let descriptor =
        TrialDescriptor::new(WORKLOAD_SYMBOL).with_invocation_teardown(TEARDOWN_SYMBOL);

    let host = Arc::new(TestAppHost::new(TestAppOptions::default()));
    let mut controller = InstanceController::new(config, host, ambient);

    for cycle in 1..=args.cycles {
        info!("Cycle {}/{}", cycle, args.cycles);
        match run_trial(&mut controller, &descriptor, args.samples).await {
            Ok(()) => info!("Cycle {} complete", cycle),
            Err(e) => {
                error!("Cycle {} failed: {}", cycle, e);
                if let Err(stop_err) = controller.stop().await {
                    warn!("Stop after failed cycle also failed: {}", stop_err);
                }
                return Err(anyhow::anyhow!("Cycle failed: {}", e));
            }
        }
    }

    Ok(())
}

async fn run_trial(
    controller: &mut InstanceController,
    descriptor: &TrialDescriptor,
    samples: u32,
) -> Result<()> {
    let handle = controller.start().await?;
    info!("Instance ready at {}", handle.url());

    let trial = TrialHandle::load(descriptor, &handle)?;
    trial.setup_trial().await?;

    let mut failed = 0u32;
    for sample in 1..=samples {
        let outcome = trial.run_sample().await;
        match &outcome.result {
            Ok(_) => info!("Sample {}/{}: {:?}", sample, samples, outcome.elapsed),
            Err(e) => {
                failed += 1;
                warn!("Sample {}/{} failed: {}", sample, samples, e);
            }
        }
    }
    if failed > 0 {
        warn!("{}/{} samples failed", failed, samples);
    }

    wait_until_quiet(&trial.context().app, DEFAULT_QUIET_POLL).await;
    trial.teardown_trial().await?;
    drop(trial);
    drop(handle);

    controller.stop().await?;
    Ok(())
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    Ok(())
}

/// On SIGINT/SIGTERM, purge any live scratch directories before exiting.
fn spawn_signal_handler() {
    tokio::spawn(async {
        wait_for_shutdown_signal().await;
        let purged = embench_scratch::purge_registered();
        if purged > 0 {
            warn!("Purged {} scratch directories on shutdown", purged);
        }
        std::process::exit(130);
    });
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!("Failed to create SIGTERM handler: {}", e);
                return std::future::pending::<()>().await;
            }
        };
        let mut sigint = match signal::unix::signal(signal::unix::SignalKind::interrupt()) {
            Ok(sigint) => sigint,
            Err(e) => {
                warn!("Failed to create SIGINT handler: {}", e);
                return std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}
