//! # Namespace registry - one dispatcher per namespace key.
//!
//! [`Registry`] maps opaque [`Namespace`] keys to live [`Dispatcher`]
//! handles. It is an explicit object rather than ambient global state:
//! collaborators receive a registry (or a dispatcher obtained from one) and
//! thread it through their constructors.
//!
//! ## Rules
//! - `dispatcher(ns)` is get-or-create: the first call for a key creates the
//!   dispatcher lazily, every later call returns the same instance.
//!   Repeated construction never resets existing listeners or edges — this
//!   is a correctness requirement, not an optimization.
//! - Dispatchers live for the registry's lifetime; there is no teardown
//!   operation. Namespace state becomes collectable with the registry.
//!
//! ## Example
//! ```
//! use emitree::{ListenerFn, Registry, Target};
//!
//! let registry = Registry::new();
//! let target = Target::new();
//!
//! let handle = registry.dispatcher("game");
//! handle.on(target, "spawn", ListenerFn::arc(|_ev| Ok(())));
//!
//! // the same key always resolves to the same dispatcher state
//! let again = registry.dispatcher("game");
//! assert!(handle.same_dispatcher(&again));
//! assert_eq!(again.listener_count(target, "spawn"), 1);
//!
//! // other namespaces are fully isolated
//! assert_eq!(registry.dispatcher("ui").listener_count(target, "spawn"), 0);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::DispatcherConfig;
use crate::dispatch::Dispatcher;

/// Isolation key selecting an independent dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// The default namespace, used when no key is given.
    Default,
    /// A caller-named namespace.
    Named(Arc<str>),
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Namespace::Named(name.into())
    }
}

impl From<String> for Namespace {
    fn from(name: String) -> Self {
        Namespace::Named(name.into())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Default => f.write_str("(default)"),
            Namespace::Named(name) => f.write_str(name),
        }
    }
}

/// Explicit namespace → dispatcher map.
pub struct Registry {
    config: DispatcherConfig,
    dispatchers: Mutex<HashMap<Namespace, Dispatcher>>,
}

impl Registry {
    /// Creates a registry with default dispatcher configuration.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Creates a registry whose dispatchers start from `config`.
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            config,
            dispatchers: Mutex::new(HashMap::new()),
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Namespace, Dispatcher>> {
        self.dispatchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the singleton dispatcher for `namespace`, creating it on
    /// first reference.
    pub fn dispatcher(&self, namespace: impl Into<Namespace>) -> Dispatcher {
        let namespace = namespace.into();
        self.map()
            .entry(namespace.clone())
            .or_insert_with(|| Dispatcher::new(namespace, self.config))
            .clone()
    }

    /// Shorthand for [`Registry::dispatcher`] with [`Namespace::Default`].
    pub fn default_dispatcher(&self) -> Dispatcher {
        self.dispatcher(Namespace::Default)
    }

    /// Number of namespaces referenced so far.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    /// True if no namespace has been referenced yet.
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("namespaces", &self.len())
            .finish_non_exhaustive()
    }
}
