use embench_common::SymbolName;

/// Names the workload and its optional lifecycle hooks, all resolved
/// through the trial domain at load time.
#[derive(Debug, Clone)]
pub struct TrialDescriptor {
    /// The measured operation.
    pub workload: SymbolName,
    /// Runs once before the first sample.
    pub trial_setup: Option<SymbolName>,
    /// Runs once after the last sample.
    pub trial_teardown: Option<SymbolName>,
    /// Runs immediately before every measured call.
    pub invocation_setup: Option<SymbolName>,
    /// Runs immediately after every measured call.
    pub invocation_teardown: Option<SymbolName>,
}

impl TrialDescriptor {
    pub fn new(workload: impl Into<SymbolName>) -> Self {
        Self {
            workload: workload.into(),
            trial_setup: None,
            trial_teardown: None,
            invocation_setup: None,
            invocation_teardown: None,
        }
    }

    pub fn with_trial_setup(mut self, name: impl Into<SymbolName>) -> Self {
        self.trial_setup = Some(name.into());
        self
    }

    pub fn with_trial_teardown(mut self, name: impl Into<SymbolName>) -> Self {
        self.trial_teardown = Some(name.into());
        self
    }

    pub fn with_invocation_setup(mut self, name: impl Into<SymbolName>) -> Self {
        self.invocation_setup = Some(name.into());
        self
    }

    pub fn with_invocation_teardown(mut self, name: impl Into<SymbolName>) -> Self {
        self.invocation_teardown = Some(name.into());
        self
    }
}
