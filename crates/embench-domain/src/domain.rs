//! Resolution domain nodes.
//!
//! Each domain owns an ordered rule list, a local symbol table, and at
//! most one parent. Lookup routing:
//!
//! 1. The first rule whose pattern matches the name decides: resolve
//!    locally only, or delegate to an explicit target domain.
//! 2. Names matching no rule follow the domain's delegation order:
//!    parent-first (platform-style) or local-first (web-container-style).
//!
//! Symbols are stored type-erased as `Arc<dyn Any + Send + Sync>`;
//! consumers downcast at a single point rather than scattering casts.
//! Every domain gets a process-unique id so identity checks and log lines
//! can distinguish two structurally identical domains from different
//! trials.

use embench_common::{HarnessError, HarnessResult, SymbolName};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

use crate::pattern::NamePattern;

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// Type-erased symbol value stored in a domain's local table.
pub type SymbolValue = Arc<dyn Any + Send + Sync>;

/// Where names matching no rule are resolved first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationOrder {
    /// Ask the parent chain before the local table (platform-style).
    ParentFirst,
    /// Consult the local table before delegating (container-style, so
    /// locally defined symbols shadow the ambient process).
    LocalFirst,
}

/// Routing decision attached to a pattern rule.
#[derive(Clone)]
pub enum Route {
    /// Resolve from this domain's local table only; a miss is final.
    Local,
    /// Delegate directly to the given domain.
    Delegate(Arc<ResolutionDomain>),
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Local => write!(f, "Local"),
            Route::Delegate(d) => write!(f, "Delegate({})", d),
        }
    }
}

/// An ordered routing rule; the first matching pattern wins.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: NamePattern,
    pub route: Route,
}

impl Rule {
    pub fn local(pattern: impl Into<NamePattern>) -> Self {
        Self {
            pattern: pattern.into(),
            route: Route::Local,
        }
    }

    pub fn delegate(pattern: impl Into<NamePattern>, target: Arc<ResolutionDomain>) -> Self {
        Self {
            pattern: pattern.into(),
            route: Route::Delegate(target),
        }
    }
}

/// Outcome of a successful lookup: the value plus the domain whose local
/// table defined it.
pub struct Resolved {
    pub value: SymbolValue,
    pub defined_in: Arc<ResolutionDomain>,
}

/// A node in the delegation graph. Acyclic by construction: parents and
/// delegate targets must exist before a child referencing them can be
/// built.
pub struct ResolutionDomain {
    id: u64,
    name: String,
    order: DelegationOrder,
    rules: Vec<Rule>,
    parent: Option<Arc<ResolutionDomain>>,
    symbols: RwLock<HashMap<SymbolName, SymbolValue>>,
}

impl fmt::Display for ResolutionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

impl fmt::Debug for ResolutionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionDomain")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("order", &self.order)
            .field("rules", &self.rules.len())
            .field("parent", &self.parent.as_ref().map(|p| p.to_string()))
            .finish()
    }
}

impl ResolutionDomain {
    /// Create a root domain with no parent; unresolved lookups terminate
    /// here.
    pub fn root(name: impl Into<String>) -> Arc<Self> {
        Self::build(name, DelegationOrder::LocalFirst, Vec::new(), None)
    }

    /// Create a child domain delegating to `parent` for names matching no
    /// rule.
    pub fn child(
        name: impl Into<String>,
        parent: Arc<ResolutionDomain>,
        order: DelegationOrder,
    ) -> Arc<Self> {
        Self::build(name, order, Vec::new(), Some(parent))
    }

    /// Create a child domain with an explicit, order-sensitive rule list.
    pub fn child_with_rules(
        name: impl Into<String>,
        parent: Arc<ResolutionDomain>,
        order: DelegationOrder,
        rules: Vec<Rule>,
    ) -> Arc<Self> {
        Self::build(name, order, rules, Some(parent))
    }

    fn build(
        name: impl Into<String>,
        order: DelegationOrder,
        rules: Vec<Rule>,
        parent: Option<Arc<ResolutionDomain>>,
    ) -> Arc<Self> {
        let domain = Arc::new(Self {
            id: NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            order,
            rules,
            parent,
            symbols: RwLock::new(HashMap::new()),
        });
        debug!("Created resolution domain {}", domain);
        domain
    }

    /// Process-unique identity of this domain.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ResolutionDomain>> {
        self.parent.as_ref()
    }

    /// Identity comparison: two handles refer to the same domain node.
    pub fn same_domain(&self, other: &ResolutionDomain) -> bool {
        self.id == other.id
    }

    /// Walk the parent chain to the delegation terminus. A root domain
    /// is its own ancestor.
    pub fn root_ancestor(self: &Arc<Self>) -> Arc<ResolutionDomain> {
        let mut current = Arc::clone(self);
        loop {
            let Some(parent) = current.parent().map(Arc::clone) else {
                return current;
            };
            current = parent;
        }
    }

    /// Register a symbol in this domain's local table. Re-registering a
    /// name replaces the previous value.
    pub fn register(&self, name: impl Into<SymbolName>, value: SymbolValue) {
        let name = name.into();
        trace!("Registering symbol '{}' in domain {}", name, self);
        self.symbols.write().unwrap().insert(name, value);
    }

    /// Register a batch of symbols.
    pub fn register_all(&self, symbols: impl IntoIterator<Item = (SymbolName, SymbolValue)>) {
        let mut table = self.symbols.write().unwrap();
        for (name, value) in symbols {
            table.insert(name, value);
        }
    }

    /// Copy every locally defined symbol of `other` into this domain's
    /// local table, re-binding the definitions here. Used to grant a
    /// domain a search path (the trial domain receives the ambient
    /// process's symbols this way).
    pub fn grant_search_path(&self, other: &ResolutionDomain) {
        let source = other.symbols.read().unwrap();
        let mut table = self.symbols.write().unwrap();
        for (name, value) in source.iter() {
            table.insert(name.clone(), Arc::clone(value));
        }
        debug!(
            "Domain {} granted {} symbols from {}",
            self,
            source.len(),
            other
        );
    }

    /// Number of locally defined symbols.
    pub fn local_len(&self) -> usize {
        self.symbols.read().unwrap().len()
    }

    fn lookup_local(self: &Arc<Self>, name: &SymbolName) -> Option<Resolved> {
        self.symbols
            .read()
            .unwrap()
            .get(name)
            .map(|value| Resolved {
                value: Arc::clone(value),
                defined_in: Arc::clone(self),
            })
    }

    /// Resolve a symbol name, walking rules first and then the delegation
    /// order. Returns the value along with the domain that defined it.
    pub fn resolve(self: &Arc<Self>, name: &SymbolName) -> HarnessResult<Resolved> {
        if let Some(rule) = self.rules.iter().find(|r| r.pattern.matches(name)) {
            trace!(
                "Domain {}: '{}' matched pattern {} -> {:?}",
                self,
                name,
                rule.pattern,
                rule.route
            );
            return match &rule.route {
                Route::Local => self.lookup_local(name).ok_or_else(|| {
                    HarnessError::symbol_not_found(name.clone(), self.to_string())
                }),
                Route::Delegate(target) => target.resolve(name),
            };
        }

        let (first, second): (Option<Resolved>, _) = match self.order {
            DelegationOrder::ParentFirst => (
                self.parent
                    .as_ref()
                    .and_then(|p| p.resolve(name).ok()),
                self.lookup_local(name),
            ),
            DelegationOrder::LocalFirst => (
                self.lookup_local(name),
                self.parent
                    .as_ref()
                    .and_then(|p| p.resolve(name).ok()),
            ),
        };

        first
            .or(second)
            .ok_or_else(|| HarnessError::symbol_not_found(name.clone(), self.to_string()))
    }
}
