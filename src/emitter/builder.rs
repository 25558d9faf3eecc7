//! Builder for constructing an [`Emitter`] with optional wiring.

use crate::dispatch::Target;
use crate::emitter::Emitter;
use crate::registry::{Namespace, Registry};

/// Builder for an [`Emitter`] bound to one namespace and target.
pub struct EmitterBuilder<'a> {
    registry: &'a Registry,
    namespace: Namespace,
    target: Option<Target>,
    parents: Vec<Target>,
    children: Vec<Target>,
}

impl<'a> EmitterBuilder<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            namespace: Namespace::Default,
            target: None,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Selects the namespace to bind to (default: [`Namespace::Default`]).
    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Binds an existing target instead of allocating a fresh one.
    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Links a parent at build time. Repeatable; edges are added in call
    /// order and fire their meta-events like any other `add_parent`.
    pub fn parent(mut self, parent: Target) -> Self {
        self.parents.push(parent);
        self
    }

    /// Links a child at build time. Repeatable.
    pub fn child(mut self, child: Target) -> Self {
        self.children.push(child);
        self
    }

    /// Builds the emitter: resolves the namespace dispatcher, fixes the
    /// target and links the requested edges.
    pub fn build(self) -> Emitter {
        let dispatcher = self.registry.dispatcher(self.namespace);
        let target = self.target.unwrap_or_else(Target::new);
        for parent in self.parents {
            dispatcher.add_parent(target, parent);
        }
        for child in self.children {
            dispatcher.add_child(target, child);
        }
        Emitter::with_target(dispatcher, target)
    }
}

impl std::fmt::Debug for EmitterBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterBuilder")
            .field("namespace", &self.namespace)
            .field("target", &self.target)
            .field("parents", &self.parents)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
