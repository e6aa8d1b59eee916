//! Isolated symbol-resolution domains.
//!
//! A resolution domain maps symbol names to type-erased values and
//! delegates names it does not own to a parent domain. Arranged into a
//! per-instance delegation graph, domains give the embedded application,
//! the harness, and user workloads non-overlapping views of the process:
//! each start cycle gets brand-new application-side domains while the
//! immutable platform root is shared.
//!
//! The graph is rebuilt from scratch for every instance and discarded
//! wholesale at teardown. Partial reuse across trials is the primary leak
//! source this crate exists to prevent.

pub mod builder;
pub mod domain;
pub mod pattern;

pub use builder::{
    broadened_domain, trial_domain, DomainGraph, DomainGraphBuilder, DEFAULT_ALLOW_LIST,
};
pub use domain::{DelegationOrder, Resolved, ResolutionDomain, Route, Rule, SymbolValue};
pub use pattern::NamePattern;
