//! # Embench Trial
//!
//! Binds user workloads to a running instance and drives measured
//! samples through them. Workloads live behind the trial resolution
//! domain; the adapter resolves them by name once, checks they are
//! defined in the trial domain itself, and from then on interacts only
//! through capability trait objects.

pub mod adapter;
pub mod descriptor;
pub mod workload;

pub use adapter::{SampleOutcome, TrialHandle};
pub use descriptor::TrialDescriptor;
pub use workload::{
    register_hook, register_workload, wait_until_quiet, MeasuredOperation, TrialContext,
    TrialHook, DEFAULT_QUIET_POLL,
};
