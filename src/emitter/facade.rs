//! # Emitter: a target bound to its namespace dispatcher.
//!
//! [`Emitter`] is the convenience facade: it fixes a [`Target`] and forwards
//! every call to the shared [`Dispatcher`] for its namespace. Two emitters
//! built for the same namespace share all state; an emitter adds nothing the
//! dispatcher does not already do.
//!
//! ## Example
//! ```
//! use emitree::{Emitter, ListenerFn, Registry};
//!
//! let registry = Registry::new();
//!
//! let room = Emitter::builder(&registry).namespace("chat").build();
//! let user = Emitter::builder(&registry)
//!     .namespace("chat")
//!     .parent(room.target())
//!     .build();
//!
//! room.on("message", ListenerFn::arc(|ev| {
//!     // sees events raised on any descendant
//!     let _ = ev.target();
//!     Ok(())
//! }));
//!
//! // bubbles from the user up to the room
//! let delivered = user.emit("message", &user.event()).unwrap();
//! assert!(delivered);
//! ```

use crate::dispatch::{Dispatcher, Target};
use crate::emitter::EmitterBuilder;
use crate::error::DispatchError;
use crate::events::{Event, EventName, IntoEventNames};
use crate::listeners::ListenerRef;
use crate::registry::Registry;

/// Convenience facade binding one target to its namespace dispatcher.
#[derive(Clone, Debug)]
pub struct Emitter {
    dispatcher: Dispatcher,
    target: Target,
}

impl Emitter {
    /// Starts building an emitter against `registry`.
    pub fn builder(registry: &Registry) -> EmitterBuilder<'_> {
        EmitterBuilder::new(registry)
    }

    /// Binds a freshly allocated target to `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_target(dispatcher, Target::new())
    }

    /// Binds an existing target to `dispatcher`.
    pub fn with_target(dispatcher: Dispatcher, target: Target) -> Self {
        Self { dispatcher, target }
    }

    /// The bound target.
    pub fn target(&self) -> Target {
        self.target
    }

    /// The shared dispatcher this emitter forwards to.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Creates a user event descriptor originating at the bound target.
    pub fn event(&self) -> Event {
        Event::new(self.target)
    }

    // ---------------------------
    // Listeners
    // ---------------------------

    /// See [`Dispatcher::on`].
    pub fn on(&self, names: impl IntoEventNames, listener: impl Into<ListenerRef>) -> ListenerRef {
        self.dispatcher.on(self.target, names, listener)
    }

    /// Alias for [`Emitter::on`].
    pub fn add_listener(
        &self,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.on(names, listener)
    }

    /// See [`Dispatcher::once`].
    pub fn once(
        &self,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.dispatcher.once(self.target, names, listener)
    }

    /// See [`Dispatcher::prepend_listener`].
    pub fn prepend_listener(
        &self,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.dispatcher.prepend_listener(self.target, names, listener)
    }

    /// See [`Dispatcher::prepend_once_listener`].
    pub fn prepend_once_listener(
        &self,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.dispatcher
            .prepend_once_listener(self.target, names, listener)
    }

    /// See [`Dispatcher::remove_listener`].
    pub fn remove_listener(&self, names: impl IntoEventNames, listener: &ListenerRef) {
        self.dispatcher.remove_listener(self.target, names, listener);
    }

    /// Alias for [`Emitter::remove_listener`].
    pub fn off(&self, names: impl IntoEventNames, listener: &ListenerRef) {
        self.remove_listener(names, listener);
    }

    /// See [`Dispatcher::remove_all_listeners`].
    pub fn remove_all_listeners(&self) {
        self.dispatcher.remove_all_listeners(self.target);
    }

    /// See [`Dispatcher::remove_all_listeners_for`].
    pub fn remove_all_listeners_for(&self, names: impl IntoEventNames) {
        self.dispatcher.remove_all_listeners_for(self.target, names);
    }

    // ---------------------------
    // Emission
    // ---------------------------

    /// See [`Dispatcher::emit`].
    pub fn emit(
        &self,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatcher.emit(self.target, names, event)
    }

    /// See [`Dispatcher::emit_async`].
    pub async fn emit_async(
        &self,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatcher.emit_async(self.target, names, event).await
    }

    /// See [`Dispatcher::broadcast`].
    pub fn broadcast(
        &self,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatcher.broadcast(self.target, names, event)
    }

    /// See [`Dispatcher::broadcast_async`].
    pub async fn broadcast_async(
        &self,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatcher
            .broadcast_async(self.target, names, event)
            .await
    }

    /// See [`Dispatcher::emit_direct`].
    pub fn emit_direct(
        &self,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatcher.emit_direct(self.target, names, event)
    }

    // ---------------------------
    // Hierarchy
    // ---------------------------

    /// See [`Dispatcher::add_parent`].
    pub fn add_parent(&self, parent: Target) {
        self.dispatcher.add_parent(self.target, parent);
    }

    /// See [`Dispatcher::remove_parent`].
    pub fn remove_parent(&self, parent: Target) {
        self.dispatcher.remove_parent(self.target, parent);
    }

    /// See [`Dispatcher::add_child`].
    pub fn add_child(&self, child: Target) {
        self.dispatcher.add_child(self.target, child);
    }

    /// See [`Dispatcher::remove_child`].
    pub fn remove_child(&self, child: Target) {
        self.dispatcher.remove_child(self.target, child);
    }

    /// See [`Dispatcher::parents`].
    pub fn parents(&self) -> Vec<Target> {
        self.dispatcher.parents(self.target)
    }

    /// See [`Dispatcher::children`].
    pub fn children(&self) -> Vec<Target> {
        self.dispatcher.children(self.target)
    }

    // ---------------------------
    // Queries and settings
    // ---------------------------

    /// See [`Dispatcher::listeners`].
    pub fn listeners(&self, name: impl Into<EventName>) -> Vec<ListenerRef> {
        self.dispatcher.listeners(self.target, name)
    }

    /// See [`Dispatcher::all_listeners`].
    pub fn all_listeners(&self) -> Vec<ListenerRef> {
        self.dispatcher.all_listeners(self.target)
    }

    /// See [`Dispatcher::listener_count`].
    pub fn listener_count(&self, name: impl Into<EventName>) -> usize {
        self.dispatcher.listener_count(self.target, name)
    }

    /// See [`Dispatcher::total_listener_count`].
    pub fn total_listener_count(&self) -> usize {
        self.dispatcher.total_listener_count(self.target)
    }

    /// See [`Dispatcher::event_names`].
    pub fn event_names(&self) -> Vec<EventName> {
        self.dispatcher.event_names(self.target)
    }

    /// The effective max-listener threshold for the bound target.
    pub fn max_listeners(&self) -> usize {
        self.dispatcher.target_max_listeners(self.target)
    }

    /// Sets the per-target max-listener override for the bound target.
    pub fn set_max_listeners(&self, limit: usize) {
        self.dispatcher
            .set_target_max_listeners(self.target, Some(limit));
    }

    /// See [`Dispatcher::set_strict_errors`].
    pub fn set_strict_errors(&self, strict: bool) {
        self.dispatcher.set_strict_errors(self.target, strict);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::listeners::ListenerFn;

    #[test]
    fn test_emitters_for_same_namespace_share_state() {
        let registry = Registry::new();
        let a = Emitter::builder(&registry).namespace("shared").build();
        let b = Emitter::builder(&registry)
            .namespace("shared")
            .target(a.target())
            .build();

        a.on("ping", ListenerFn::arc(|_ev| Ok(())));
        assert_eq!(b.listener_count("ping"), 1);
    }

    #[test]
    fn test_builder_links_parents_and_children() {
        let registry = Registry::new();
        let root = Emitter::builder(&registry).build();
        let leaf = Emitter::builder(&registry).parent(root.target()).build();

        assert_eq!(leaf.parents(), vec![root.target()]);
        assert_eq!(root.children(), vec![leaf.target()]);

        leaf.remove_parent(root.target());
        assert!(leaf.parents().is_empty());
        assert!(root.children().is_empty());
    }

    #[test]
    fn test_emit_bubbles_to_parent_emitter() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let root = Emitter::builder(&registry).build();
        let leaf = Emitter::builder(&registry).parent(root.target()).build();

        let seen = Arc::clone(&log);
        let origin = leaf.target();
        root.on(
            "ping",
            ListenerFn::arc(move |ev| {
                seen.lock().unwrap().push(ev.target());
                Ok(())
            }),
        );

        assert!(leaf.emit("ping", &leaf.event()).unwrap());
        // the descriptor still names the origin, not the ancestor
        assert_eq!(*log.lock().unwrap(), vec![origin]);
    }

    #[test]
    fn test_remove_all_then_event_names_is_empty() {
        let registry = Registry::new();
        let root = Emitter::builder(&registry).build();
        let em = Emitter::builder(&registry).parent(root.target()).build();

        em.on("a", ListenerFn::arc(|_ev| Ok(())));
        em.on("b", ListenerFn::arc(|_ev| Ok(())));
        em.remove_all_listeners();

        // hierarchy edges are not pseudo-events and do not resurface here
        assert!(em.event_names().is_empty());
        assert_eq!(em.parents(), vec![root.target()]);
    }

    #[test]
    fn test_max_listener_accessors_route_to_target_override() {
        let registry = Registry::new();
        let em = Emitter::builder(&registry).build();

        assert_eq!(em.max_listeners(), 10);
        em.set_max_listeners(3);
        assert_eq!(em.max_listeners(), 3);
        // the namespace default is untouched
        assert_eq!(em.dispatcher().max_listeners(), 10);
    }

    #[tokio::test]
    async fn test_facade_async_emission() {
        let registry = Registry::new();
        let em = Emitter::builder(&registry).build();
        let log = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&log);
        em.on(
            "work",
            ListenerFn::arc(move |_ev| {
                seen.lock().unwrap().push("ran");
                Ok(())
            }),
        );

        assert!(em.emit_async("work", &em.event()).await.unwrap());
        assert_eq!(*log.lock().unwrap(), vec!["ran"]);
    }
}
