//! Loading trials and driving measured samples.

use embench_common::{HarnessError, HarnessResult, InvocationPhase, SymbolName};
use embench_domain::ResolutionDomain;
use embench_instance::InstanceHandle;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::descriptor::TrialDescriptor;
use crate::workload::{HookBinding, MeasuredOperation, TrialContext, TrialHook, WorkloadBinding};

/// One measured sample: the workload's opaque result (or the failure
/// that replaced it) and the time spent in the measured call alone.
pub struct SampleOutcome {
    pub result: HarnessResult<Box<dyn Any + Send>>,
    pub elapsed: Duration,
}

impl SampleOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A workload bound to one running instance.
///
/// All symbols are resolved and downcast at load time; sample execution
/// goes through the capability trait objects only.
pub struct TrialHandle {
    context: TrialContext,
    workload: Arc<dyn MeasuredOperation>,
    trial_setup: Option<Arc<dyn TrialHook>>,
    trial_teardown: Option<Arc<dyn TrialHook>>,
    invocation_setup: Option<Arc<dyn TrialHook>>,
    invocation_teardown: Option<Arc<dyn TrialHook>>,
}

impl std::fmt::Debug for TrialHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialHandle").finish_non_exhaustive()
    }
}

impl TrialHandle {
    /// Resolve the descriptor's symbols through the instance's trial
    /// domain. The workload and every hook must be defined in the trial
    /// domain itself; a definition inherited from an ancestor means the
    /// trial is not running against the isolated instance and is rejected.
    pub fn load(descriptor: &TrialDescriptor, instance: &InstanceHandle) -> HarnessResult<Self> {
        let context = TrialContext {
            app: instance.app(),
            url: instance.url(),
            scratch_path: instance.scratch_path().to_path_buf(),
        };
        Self::bind(descriptor, instance.trial_domain(), context)
    }

    fn bind(
        descriptor: &TrialDescriptor,
        domain: &Arc<ResolutionDomain>,
        context: TrialContext,
    ) -> HarnessResult<Self> {
        let workload = resolve_operation(domain, &descriptor.workload)?;
        debug!("Bound workload '{}' in domain {}", descriptor.workload, domain);

        Ok(Self {
            context,
            workload,
            trial_setup: resolve_optional_hook(domain, descriptor.trial_setup.as_ref())?,
            trial_teardown: resolve_optional_hook(domain, descriptor.trial_teardown.as_ref())?,
            invocation_setup: resolve_optional_hook(domain, descriptor.invocation_setup.as_ref())?,
            invocation_teardown: resolve_optional_hook(
                domain,
                descriptor.invocation_teardown.as_ref(),
            )?,
        })
    }

    pub fn context(&self) -> &TrialContext {
        &self.context
    }

    /// Run the trial-level setup hook. A failure here aborts the trial.
    pub async fn setup_trial(&self) -> HarnessResult<()> {
        if let Some(setup) = &self.trial_setup {
            setup.run(&self.context).await.map_err(|e| {
                HarnessError::invocation(InvocationPhase::TrialSetup, e.to_string())
            })?;
        }
        Ok(())
    }

    /// Run the trial-level teardown hook.
    pub async fn teardown_trial(&self) -> HarnessResult<()> {
        if let Some(teardown) = &self.trial_teardown {
            teardown.run(&self.context).await.map_err(|e| {
                HarnessError::invocation(InvocationPhase::TrialTeardown, e.to_string())
            })?;
        }
        Ok(())
    }

    /// The bare measured call, without invocation hooks or timing.
    pub async fn invoke(&self) -> HarnessResult<Box<dyn Any + Send>> {
        self.workload
            .invoke(&self.context)
            .await
            .map_err(|e| HarnessError::invocation(InvocationPhase::Measured, e.to_string()))
    }

    /// Run one sample: invocation setup, the measured call, invocation
    /// teardown. The hooks alternate strictly with the measured call;
    /// teardown runs even when setup or the call failed, and a setup
    /// failure skips the measured call. Errors become failed samples and
    /// never propagate out.
    pub async fn run_sample(&self) -> SampleOutcome {
        let setup_result = match &self.invocation_setup {
            Some(setup) => setup.run(&self.context).await.map_err(|e| {
                HarnessError::invocation(InvocationPhase::InvocationSetup, e.to_string())
            }),
            None => Ok(()),
        };

        let (mut result, elapsed) = match setup_result {
            Err(e) => (Err(e), Duration::ZERO),
            Ok(()) => {
                let started = Instant::now();
                let result = self.invoke().await;
                (result, started.elapsed())
            }
        };

        // Teardown runs unconditionally; its failure only surfaces when
        // nothing failed before it.
        if let Some(teardown) = &self.invocation_teardown {
            if let Err(e) = teardown.run(&self.context).await {
                let e = HarnessError::invocation(
                    InvocationPhase::InvocationTeardown,
                    e.to_string(),
                );
                if result.is_ok() {
                    result = Err(e);
                } else {
                    warn!("Invocation teardown failed after an earlier error: {}", e);
                }
            }
        }

        SampleOutcome { result, elapsed }
    }
}

fn resolve_operation(
    domain: &Arc<ResolutionDomain>,
    name: &SymbolName,
) -> HarnessResult<Arc<dyn MeasuredOperation>> {
    let resolved = domain.resolve(name)?;
    if !resolved.defined_in.same_domain(domain) {
        return Err(HarnessError::wrong_domain(
            name.clone(),
            domain.to_string(),
            resolved.defined_in.to_string(),
        ));
    }
    let binding = resolved
        .value
        .downcast::<WorkloadBinding>()
        .map_err(|_| HarnessError::wrong_symbol_kind(name.clone(), "measured operation"))?;
    Ok(Arc::clone(&binding.operation))
}

fn resolve_optional_hook(
    domain: &Arc<ResolutionDomain>,
    name: Option<&SymbolName>,
) -> HarnessResult<Option<Arc<dyn TrialHook>>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let resolved = domain.resolve(name)?;
    if !resolved.defined_in.same_domain(domain) {
        return Err(HarnessError::wrong_domain(
            name.clone(),
            domain.to_string(),
            resolved.defined_in.to_string(),
        ));
    }
    let binding = resolved
        .value
        .downcast::<HookBinding>()
        .map_err(|_| HarnessError::wrong_symbol_kind(name.clone(), "trial hook"))?;
    Ok(Some(Arc::clone(&binding.hook)))
}
