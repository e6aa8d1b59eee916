//! Error types for the embench harness.
//!
//! The taxonomy separates errors by the lifecycle stage they occur in:
//! provisioning failures abort before any network resource is touched,
//! startup failures trigger a best-effort stop before propagating, wrong
//! domain resolution is a harness construction bug and never retried,
//! invocation failures are reported to the measurement engine as failed
//! samples, and reclamation failures are warnings.

use crate::types::SymbolName;
use std::fmt;
use thiserror::Error;

/// Result type alias for harness operations.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Which phase of a trial an invocation error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPhase {
    TrialSetup,
    InvocationSetup,
    Measured,
    InvocationTeardown,
    TrialTeardown,
}

impl fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationPhase::TrialSetup => write!(f, "trial setup"),
            InvocationPhase::InvocationSetup => write!(f, "invocation setup"),
            InvocationPhase::Measured => write!(f, "measured operation"),
            InvocationPhase::InvocationTeardown => write!(f, "invocation teardown"),
            InvocationPhase::TrialTeardown => write!(f, "trial teardown"),
        }
    }
}

/// Main error type for harness operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Scratch directory or extension-artifact materialization failure.
    /// Fatal; raised before any network resource is touched.
    #[error("Provisioning failed: {reason}")]
    Provisioning { reason: String },

    /// Listener bind failure, boot failure, or initialization timeout.
    /// Fatal; the controller attempts a best-effort stop before
    /// propagating it.
    #[error("Startup failed: {reason}")]
    Startup { reason: String },

    /// A loaded workload resolved through an unexpected resolution
    /// domain. Indicates a harness construction bug; never retried.
    #[error("Wrong resolution domain for '{symbol}': expected {expected}, got {actual}")]
    WrongDomain {
        symbol: SymbolName,
        expected: String,
        actual: String,
    },

    /// The measured operation or one of its lifecycle callbacks failed.
    #[error("Invocation failed during {phase}: {reason}")]
    Invocation {
        phase: InvocationPhase,
        reason: String,
    },

    /// Scratch directory deletion failure during teardown. Logged and
    /// non-fatal unless clean reclamation is explicitly required.
    #[error("Reclamation incomplete for {path}: {reason}")]
    Reclamation { path: String, reason: String },

    /// A symbol could not be resolved anywhere in the delegation chain.
    #[error("Symbol not found: '{symbol}' (lookup started at domain {domain})")]
    SymbolNotFound { symbol: SymbolName, domain: String },

    /// A symbol resolved but held a value of the wrong kind.
    #[error("Symbol '{symbol}' is not a {expected}")]
    WrongSymbolKind {
        symbol: SymbolName,
        expected: String,
    },

    /// An operation was attempted in a state that does not permit it.
    #[error("Operation not allowed: {operation} (state: {state})")]
    OperationNotAllowed { operation: String, state: String },

    /// Error surfaced by the embedded application across the boundary.
    #[error("Application error: {0}")]
    Application(String),

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        source: Box<HarnessError>,
    },
}

impl HarnessError {
    pub fn provisioning(reason: impl Into<String>) -> Self {
        Self::Provisioning {
            reason: reason.into(),
        }
    }

    pub fn startup(reason: impl Into<String>) -> Self {
        Self::Startup {
            reason: reason.into(),
        }
    }

    pub fn wrong_domain(
        symbol: SymbolName,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::WrongDomain {
            symbol,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invocation(phase: InvocationPhase, reason: impl Into<String>) -> Self {
        Self::Invocation {
            phase,
            reason: reason.into(),
        }
    }

    pub fn reclamation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Reclamation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn symbol_not_found(symbol: SymbolName, domain: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            symbol,
            domain: domain.into(),
        }
    }

    pub fn wrong_symbol_kind(symbol: SymbolName, expected: impl Into<String>) -> Self {
        Self::WrongSymbolKind {
            symbol,
            expected: expected.into(),
        }
    }

    pub fn operation_not_allowed(
        operation: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self::OperationNotAllowed {
            operation: operation.into(),
            state: state.into(),
        }
    }

    pub fn application(reason: impl Into<String>) -> Self {
        Self::Application(reason.into())
    }

    /// Adds context to an error.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::WithContext {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// True when the error may be reported as a failed sample instead of
    /// aborting the trial.
    pub fn is_sample_failure(&self) -> bool {
        matches!(
            self,
            Self::Invocation { phase, .. } if *phase != InvocationPhase::TrialSetup
        )
    }
}

/// Convenience methods for Result types.
pub trait ResultExt<T> {
    /// Adds context to an error result.
    fn context(self, message: impl Into<String>) -> HarnessResult<T>;
}

impl<T> ResultExt<T> for HarnessResult<T> {
    fn context(self, message: impl Into<String>) -> HarnessResult<T> {
        self.map_err(|e| e.context(message))
    }
}
