//! Shared vocabulary for the embench harness: identifier newtypes and the
//! error taxonomy used by every other crate in the workspace.

pub mod errors;
pub mod types;

pub use errors::{HarnessError, HarnessResult, InvocationPhase, ResultExt};
pub use types::{ItemName, SymbolName};
