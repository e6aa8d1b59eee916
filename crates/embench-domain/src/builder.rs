//! Construction of the per-instance delegation graph.
//!
//! The graph built for every controller run:
//!
//! ```text
//! platform (root)
//!   └── ambient            — the benchmarking process's own domain
//!         └── masked        — allow-listed harness namespaces local,
//!         │                   everything else delegated to ambient
//!         └── web-container — application bootstrap symbols, local-first
//!               └── broadened — application + installed extensions
//!                     └── trial — broadened view + ambient search path
//! ```
//!
//! The broadened and trial domains can only exist after the application
//! has started and exposed its extension-aware resolver, so they are
//! produced by free functions invoked by the controller at startup
//! completion rather than by the builder itself.

use embench_common::SymbolName;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{DelegationOrder, ResolutionDomain, Rule, SymbolValue};
use crate::pattern::NamePattern;

/// Harness-support namespaces resolved locally by the masked domain:
/// measurement-framework hooks, web-container plumbing, and the harness's
/// own support types.
pub const DEFAULT_ALLOW_LIST: &[&str] = &["embench.measure", "embench.web", "embench.support"];

/// The static portion of the delegation graph, built before the
/// application boots.
pub struct DomainGraph {
    pub platform: Arc<ResolutionDomain>,
    pub ambient: Arc<ResolutionDomain>,
    pub masked: Arc<ResolutionDomain>,
    pub web_container: Arc<ResolutionDomain>,
}

/// Builds the static delegation graph for one instance.
pub struct DomainGraphBuilder {
    ambient: Option<Arc<ResolutionDomain>>,
    allow_list: Vec<NamePattern>,
    harness_symbols: Vec<(SymbolName, SymbolValue)>,
}

impl DomainGraphBuilder {
    pub fn new() -> Self {
        Self {
            ambient: None,
            allow_list: DEFAULT_ALLOW_LIST
                .iter()
                .map(|p| NamePattern::from(*p))
                .collect(),
            harness_symbols: Vec::new(),
        }
    }

    /// Use an existing ambient domain (the domain the benchmarking tool
    /// itself runs under). When omitted, a fresh empty ambient domain is
    /// created under the platform root.
    pub fn with_ambient(mut self, ambient: Arc<ResolutionDomain>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Replace the allow-list of harness-support namespaces. Order is
    /// significant: the first matching pattern wins.
    pub fn with_allow_list(mut self, patterns: Vec<NamePattern>) -> Self {
        self.allow_list = patterns;
        self
    }

    /// Register a harness-support symbol into the masked domain's local
    /// table at build time.
    pub fn with_harness_symbol(
        mut self,
        name: impl Into<SymbolName>,
        value: SymbolValue,
    ) -> Self {
        self.harness_symbols.push((name.into(), value));
        self
    }

    /// Build the platform, masked, and web-container domains for one
    /// instance run.
    pub fn build(self) -> DomainGraph {
        // An externally supplied ambient domain already hangs off its own
        // root; that root is the delegation terminus, not a fresh node.
        let (platform, ambient) = match self.ambient {
            Some(ambient) => (ambient.root_ancestor(), ambient),
            None => {
                let platform = ResolutionDomain::root("platform");
                let ambient = ResolutionDomain::child(
                    "ambient",
                    Arc::clone(&platform),
                    DelegationOrder::ParentFirst,
                );
                (platform, ambient)
            }
        };

        // Allow-listed namespaces resolve only from the masked domain's
        // local table; everything else is delegated to the ambient
        // process domain, never straight to the platform root.
        let rules: Vec<Rule> = self.allow_list.into_iter().map(Rule::local).collect();
        let masked = ResolutionDomain::child_with_rules(
            "masked-harness",
            Arc::clone(&ambient),
            DelegationOrder::ParentFirst,
            rules,
        );
        masked.register_all(self.harness_symbols);

        // Local-first: application bootstrap symbols shadow anything the
        // ambient process happens to carry under the same names.
        let web_container = ResolutionDomain::child(
            "web-container",
            Arc::clone(&masked),
            DelegationOrder::LocalFirst,
        );

        debug!(
            "Built domain graph: platform={} ambient={} masked={} web={}",
            platform, ambient, masked, web_container
        );

        DomainGraph {
            platform,
            ambient,
            masked,
            web_container,
        }
    }
}

impl Default for DomainGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the application-plus-extensions domain from the symbol sets the
/// running application's extension resolver reported. Supersedes the
/// web-container domain for all post-startup lookups.
pub fn broadened_domain(
    web_container: &Arc<ResolutionDomain>,
    extension_symbols: impl IntoIterator<Item = (SymbolName, SymbolValue)>,
) -> Arc<ResolutionDomain> {
    let domain = ResolutionDomain::child(
        "app-extensions",
        Arc::clone(web_container),
        DelegationOrder::ParentFirst,
    );
    domain.register_all(extension_symbols);
    domain
}

/// Build the trial domain: a child of the broadened domain additionally
/// granted the ambient process's full search path, so workload code can
/// reach both harness support types and application types. Granted
/// symbols are re-bound, making the trial domain their defining domain.
pub fn trial_domain(
    broadened: &Arc<ResolutionDomain>,
    ambient: &Arc<ResolutionDomain>,
) -> Arc<ResolutionDomain> {
    let domain = ResolutionDomain::child(
        "trial",
        Arc::clone(broadened),
        DelegationOrder::LocalFirst,
    );
    domain.grant_search_path(ambient);
    domain
}
