// E2E test framework for the embench harness

use async_trait::async_trait;
use std::any::Any;
use std::sync::{Arc, Mutex};

use embench_app_api::ApplicationInstance;
use embench_common::{HarnessError, HarnessResult, ItemName};
use embench_domain::ResolutionDomain;
use embench_instance::{InstanceConfig, InstanceController};
use embench_testapp::{TestAppHost, TestAppOptions};
use embench_trial::{register_hook, register_workload, MeasuredOperation, TrialContext, TrialHook};

/// Workload symbol every scenario registers into its ambient domain.
pub const CREATE_ITEM_SYMBOL: &str = "embench.measure.create_item";
/// Invocation-teardown symbol deleting the well-known item.
pub const DELETE_ITEM_SYMBOL: &str = "embench.measure.delete_item";
/// The well-known item name used by the item workloads.
pub const ITEM: &str = "p";

/// Shared event log for asserting hook/operation ordering.
pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

/// Creates the well-known item; the opaque sample result is its handle.
pub struct CreateNamedItem;

#[async_trait]
impl MeasuredOperation for CreateNamedItem {
    async fn invoke(&self, context: &TrialContext) -> HarnessResult<Box<dyn Any + Send>> {
        let handle = context.app.create_item(&ItemName::from(ITEM)).await?;
        Ok(Box::new(handle))
    }
}

/// Deletes the well-known item so consecutive samples stay independent.
pub struct DeleteNamedItem;

#[async_trait]
impl TrialHook for DeleteNamedItem {
    async fn run(&self, context: &TrialContext) -> HarnessResult<()> {
        context.app.delete_item(&ItemName::from(ITEM)).await
    }
}

/// Measured operation that appends to an event log and optionally fails.
pub struct LoggingOp {
    pub log: EventLog,
    pub fail: bool,
}

#[async_trait]
impl MeasuredOperation for LoggingOp {
    async fn invoke(&self, _context: &TrialContext) -> HarnessResult<Box<dyn Any + Send>> {
        self.log.lock().unwrap().push("op");
        if self.fail {
            return Err(HarnessError::application("measured call failed"));
        }
        Ok(Box::new(()))
    }
}

/// Hook that appends its label to an event log.
pub struct LoggingHook {
    pub log: EventLog,
    pub label: &'static str,
}

#[async_trait]
impl TrialHook for LoggingHook {
    async fn run(&self, _context: &TrialContext) -> HarnessResult<()> {
        self.log.lock().unwrap().push(self.label);
        Ok(())
    }
}

/// A fresh ambient domain carrying the item workloads.
pub fn ambient_with_item_workloads() -> Arc<ResolutionDomain> {
    let ambient = ResolutionDomain::root("ambient");
    register_workload(&ambient, CREATE_ITEM_SYMBOL, Arc::new(CreateNamedItem));
    register_hook(&ambient, DELETE_ITEM_SYMBOL, Arc::new(DeleteNamedItem));
    ambient
}

/// A controller over the test application with the given options, using
/// the item-workload ambient domain.
pub fn item_controller(options: TestAppOptions, config: InstanceConfig) -> InstanceController {
    InstanceController::new(
        config,
        Arc::new(TestAppHost::new(options)),
        ambient_with_item_workloads(),
    )
}

/// A controller with a caller-built ambient domain.
pub fn controller_with_ambient(
    options: TestAppOptions,
    config: InstanceConfig,
    ambient: Arc<ResolutionDomain>,
) -> InstanceController {
    InstanceController::new(config, Arc::new(TestAppHost::new(options)), ambient)
}
