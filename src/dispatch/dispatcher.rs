//! # Dispatcher: the per-namespace engine handle.
//!
//! [`Dispatcher`] is a cheap `Clone` handle over one namespace's shared
//! state. Every handle obtained from the same [`Registry`](crate::Registry)
//! key operates on the same listener store and hierarchy.
//!
//! ## Architecture
//! ```text
//!  Registry ── namespace key ──► Dispatcher (singleton per key)
//!                                    │
//!                  ┌─────────────────┼──────────────────┐
//!                  ▼                 ▼                  ▼
//!            ListenerStore      hierarchy edges    settings
//!        (target, event) lists  parents/children  max-listeners,
//!                  │                 │             strict errors
//!                  └────────┬────────┘
//!                           ▼
//!                    dispatch engine
//!          emit ▲ parents / broadcast ▼ children
//! ```
//!
//! ## Rules
//! - One mutex guards the namespace state; listener code never runs under
//!   the lock (the engine works from snapshots), so listeners may freely
//!   register, remove, or re-emit during a traversal.
//! - Every mutation publishes its meta-event through the ordinary synchronous
//!   dispatch path against the affected target: `NewListener`,
//!   `RemoveListener`, `AddParent`/`RemoveParent`, `AddChild`/`RemoveChild`.
//!   Meta descriptors do not bubble.
//! - Removal meta-events fire even when nothing was actually removed
//!   (idempotent signaling); the removal itself is a silent no-op.
//! - Registration is infallible: a failing meta-event listener is logged and
//!   dropped rather than surfaced to the mutating caller. Only the
//!   `emit*`/`broadcast*` family returns errors.
//!
//! ## Leak advisory
//! After each registration the per-(target, event) count is checked against
//! the effective threshold — the target override if set, else the namespace
//! value. The first event name to exceed it in a namespace logs one
//! `tracing` warning; further registrations on that name stay silent. Purely
//! advisory, registration always succeeds.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::DispatcherConfig;
use crate::dispatch::Target;
use crate::dispatch::store::{Direction, Entry, ListenerStore};
use crate::error::DispatchError;
use crate::events::{Event, EventDetail, EventName, IntoEventNames, MetaEvent};
use crate::listeners::ListenerRef;
use crate::registry::Namespace;

pub(crate) struct State {
    pub(crate) store: ListenerStore,
    pub(crate) max_listeners: usize,
    pub(crate) warned: HashSet<EventName>,
}

struct Shared {
    namespace: Namespace,
    state: Mutex<State>,
}

/// Handle to one namespace's dispatcher.
///
/// Cheap to clone (internally holds an `Arc`-backed state); all clones for a
/// namespace share listeners, hierarchy and settings.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub(crate) fn new(namespace: Namespace, config: DispatcherConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                namespace,
                state: Mutex::new(State {
                    store: ListenerStore::default(),
                    max_listeners: config.max_listeners,
                    warned: HashSet::new(),
                }),
            }),
        }
    }

    /// The namespace this dispatcher serves.
    pub fn namespace(&self) -> &Namespace {
        &self.shared.namespace
    }

    /// True if both handles serve the same namespace state.
    pub fn same_dispatcher(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    // Listener code never runs under this lock, so a poisoned guard still
    // holds consistent state.
    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ---------------------------
    // Registration
    // ---------------------------

    /// Registers `listener` at the tail of each named list.
    ///
    /// Fires a `NewListener` meta-event per name, then runs the leak check.
    /// Returns the handle back for later identity-based removal.
    pub fn on(
        &self,
        target: Target,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.register(target, names.into_event_names(), listener.into(), false, false)
    }

    /// Alias for [`Dispatcher::on`].
    pub fn add_listener(
        &self,
        target: Target,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.on(target, names, listener)
    }

    /// Registers `listener` at the head of each named list.
    pub fn prepend_listener(
        &self,
        target: Target,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.register(target, names.into_event_names(), listener.into(), false, true)
    }

    /// Registers a one-shot listener at the tail of each named list.
    ///
    /// The registration is retired on its first firing (per name), emitting
    /// the usual `RemoveListener` meta-event before the listener runs.
    pub fn once(
        &self,
        target: Target,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.register(target, names.into_event_names(), listener.into(), true, false)
    }

    /// Registers a one-shot listener at the head of each named list.
    pub fn prepend_once_listener(
        &self,
        target: Target,
        names: impl IntoEventNames,
        listener: impl Into<ListenerRef>,
    ) -> ListenerRef {
        self.register(target, names.into_event_names(), listener.into(), true, true)
    }

    fn register(
        &self,
        target: Target,
        names: Vec<EventName>,
        listener: ListenerRef,
        once: bool,
        prepend: bool,
    ) -> ListenerRef {
        for name in &names {
            {
                let mut state = self.state();
                let entry = Entry {
                    listener: listener.clone(),
                    once,
                };
                if prepend {
                    state.store.prepend(target, name, entry);
                } else {
                    state.store.append(target, name, entry);
                }
            }
            self.emit_meta(
                target,
                MetaEvent::NewListener,
                EventDetail::NewListener {
                    listener: listener.clone(),
                },
            );
            self.leak_check(target, name);
        }
        listener
    }

    // ---------------------------
    // Removal
    // ---------------------------

    /// Removes every occurrence of `listener` (by identity) from each named
    /// list. Absent listeners are a silent no-op; the `RemoveListener`
    /// meta-event fires per name regardless.
    pub fn remove_listener(
        &self,
        target: Target,
        names: impl IntoEventNames,
        listener: &ListenerRef,
    ) {
        for name in names.into_event_names() {
            {
                self.state().store.remove(target, &name, listener);
            }
            self.emit_meta(
                target,
                MetaEvent::RemoveListener,
                EventDetail::RemoveListener {
                    listener: listener.clone(),
                },
            );
        }
    }

    /// Alias for [`Dispatcher::remove_listener`].
    pub fn off(&self, target: Target, names: impl IntoEventNames, listener: &ListenerRef) {
        self.remove_listener(target, names, listener);
    }

    /// Clears every event list for `target`, firing one `RemoveListener`
    /// meta-event per listener actually cleared. Hierarchy edges are
    /// untouched.
    pub fn remove_all_listeners(&self, target: Target) {
        let drained = { self.state().store.clear_all(target) };
        for (_, entries) in drained {
            self.signal_removed(target, entries);
        }
    }

    /// Clears the named event lists for `target`, firing one
    /// `RemoveListener` meta-event per listener actually cleared.
    pub fn remove_all_listeners_for(&self, target: Target, names: impl IntoEventNames) {
        for name in names.into_event_names() {
            let drained = { self.state().store.clear(target, &name) };
            self.signal_removed(target, drained);
        }
    }

    fn signal_removed(&self, target: Target, entries: Vec<Entry>) {
        for entry in entries {
            self.emit_meta(
                target,
                MetaEvent::RemoveListener,
                EventDetail::RemoveListener {
                    listener: entry.listener,
                },
            );
        }
    }

    // ---------------------------
    // Hierarchy
    // ---------------------------

    /// Links `parent` above `target`.
    ///
    /// Adds the matched edge pair (parent list of `target`, child list of
    /// `parent`) and emits an `AddParent` meta-event on `target`.
    pub fn add_parent(&self, target: Target, parent: Target) {
        {
            self.state().store.push_parent(target, parent);
        }
        self.emit_meta(
            target,
            MetaEvent::AddParent,
            EventDetail::AddParent {
                parent,
                child: target,
            },
        );
    }

    /// Links `child` below `target`; symmetric to [`Dispatcher::add_parent`].
    pub fn add_child(&self, target: Target, child: Target) {
        {
            self.state().store.push_child(target, child);
        }
        self.emit_meta(
            target,
            MetaEvent::AddChild,
            EventDetail::AddChild {
                parent: target,
                child,
            },
        );
    }

    /// Unlinks `parent` from `target` (both edge sides, every occurrence).
    /// The `RemoveParent` meta-event fires even if the edge was absent.
    pub fn remove_parent(&self, target: Target, parent: Target) {
        {
            self.state().store.pull_parent(target, parent);
        }
        self.emit_meta(
            target,
            MetaEvent::RemoveParent,
            EventDetail::RemoveParent {
                parent,
                child: target,
            },
        );
    }

    /// Unlinks `child` from `target`; symmetric to
    /// [`Dispatcher::remove_parent`].
    pub fn remove_child(&self, target: Target, child: Target) {
        {
            self.state().store.pull_child(target, child);
        }
        self.emit_meta(
            target,
            MetaEvent::RemoveChild,
            EventDetail::RemoveChild {
                parent: target,
                child,
            },
        );
    }

    /// Snapshot of `target`'s parents, in link order.
    pub fn parents(&self, target: Target) -> Vec<Target> {
        self.state().store.adjacent(target, Direction::Up)
    }

    /// Snapshot of `target`'s children, in link order.
    pub fn children(&self, target: Target) -> Vec<Target> {
        self.state().store.adjacent(target, Direction::Down)
    }

    // ---------------------------
    // Queries
    // ---------------------------

    /// Snapshot of the listeners for `(target, name)`, de-duplicated by
    /// identity. The list is cloned; the listeners are shared handles.
    pub fn listeners(&self, target: Target, name: impl Into<EventName>) -> Vec<ListenerRef> {
        self.state().store.listeners(target, &name.into())
    }

    /// Aggregate listener snapshot across every event registered on
    /// `target`, de-duplicated by identity. Hierarchy edges never appear
    /// here.
    pub fn all_listeners(&self, target: Target) -> Vec<ListenerRef> {
        self.state().store.all_listeners(target)
    }

    /// Listener count for `(target, name)`.
    pub fn listener_count(&self, target: Target, name: impl Into<EventName>) -> usize {
        self.state().store.listener_count(target, &name.into())
    }

    /// Listener count summed across every event registered on `target`.
    /// Hierarchy edges are not listeners and are never counted.
    pub fn total_listener_count(&self, target: Target) -> usize {
        self.state().store.total_listener_count(target)
    }

    /// Event names with at least one live listener on `target`, in
    /// first-registration order. Does not traverse the hierarchy.
    pub fn event_names(&self, target: Target) -> Vec<EventName> {
        self.state().store.event_names(target)
    }

    // ---------------------------
    // Settings
    // ---------------------------

    /// The namespace-level max-listener threshold.
    pub fn max_listeners(&self) -> usize {
        self.state().max_listeners
    }

    /// Sets the namespace-level max-listener threshold.
    pub fn set_max_listeners(&self, limit: usize) {
        self.state().max_listeners = limit;
    }

    /// The effective threshold for `target`: its override if set, else the
    /// namespace value.
    pub fn target_max_listeners(&self, target: Target) -> usize {
        let state = self.state();
        state.store.max_listeners(target).unwrap_or(state.max_listeners)
    }

    /// Sets or clears the per-target threshold override.
    pub fn set_target_max_listeners(&self, target: Target, limit: Option<usize>) {
        self.state().store.set_max_listeners(target, limit);
    }

    /// True if `target` opted into strict unhandled-`error` checking.
    pub fn strict_errors(&self, target: Target) -> bool {
        self.state().store.strict_errors(target)
    }

    /// Opts `target` in or out of strict unhandled-`error` checking.
    ///
    /// When enabled, emitting the `error` event through a traversal in which
    /// nothing handled it fails with
    /// [`DispatchError::UnhandledError`](crate::DispatchError::UnhandledError).
    pub fn set_strict_errors(&self, target: Target, strict: bool) {
        self.state().store.set_strict_errors(target, strict);
    }

    // ---------------------------
    // Emission entry points
    // ---------------------------

    /// Emits the named events on `target`, bubbling toward parents.
    ///
    /// Returns whether any listener ran anywhere in the traversal.
    pub fn emit(
        &self,
        target: Target,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatch(target, &names.into_event_names(), event, Direction::Up)
    }

    /// Emits the named events on `target`, bubbling toward children.
    pub fn broadcast(
        &self,
        target: Target,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatch(target, &names.into_event_names(), event, Direction::Down)
    }

    /// Emits the named events on `target` only; no hierarchy recursion.
    pub fn emit_direct(
        &self,
        target: Target,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatch(target, &names.into_event_names(), event, Direction::None)
    }

    /// Async [`Dispatcher::emit`]: every listener (sync or async) completes
    /// before the next listener or hierarchy step runs.
    pub async fn emit_async(
        &self,
        target: Target,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatch_async(target, &names.into_event_names(), event, Direction::Up)
            .await
    }

    /// Async [`Dispatcher::broadcast`].
    pub async fn broadcast_async(
        &self,
        target: Target,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatch_async(target, &names.into_event_names(), event, Direction::Down)
            .await
    }

    /// Async [`Dispatcher::emit_direct`].
    pub async fn emit_direct_async(
        &self,
        target: Target,
        names: impl IntoEventNames,
        event: &Event,
    ) -> Result<bool, DispatchError> {
        self.dispatch_async(target, &names.into_event_names(), event, Direction::None)
            .await
    }

    // ---------------------------
    // Engine support
    // ---------------------------

    pub(crate) fn snapshot_entries(&self, target: Target, name: &EventName) -> Vec<Entry> {
        self.state().store.snapshot(target, name)
    }

    pub(crate) fn adjacent(&self, target: Target, direction: Direction) -> Vec<Target> {
        self.state().store.adjacent(target, direction)
    }

    /// Retires a one-shot entry before invoking it; false means another
    /// in-flight traversal got there first and the invocation must be
    /// skipped.
    pub(crate) fn retire_once(
        &self,
        target: Target,
        name: &EventName,
        listener: &ListenerRef,
    ) -> bool {
        let removed = { self.state().store.take_once(target, name, listener) };
        if removed {
            self.emit_meta(
                target,
                MetaEvent::RemoveListener,
                EventDetail::RemoveListener {
                    listener: listener.clone(),
                },
            );
        }
        removed
    }

    /// Publishes a meta-event through the ordinary synchronous dispatch
    /// path. Meta descriptors do not bubble; listener failures here are
    /// logged and dropped so mutation calls stay infallible.
    pub(crate) fn emit_meta(&self, target: Target, name: MetaEvent, detail: EventDetail) {
        let event = Event::meta(target, detail);
        let names = [EventName::Meta(name)];
        if let Err(error) = self.dispatch(target, &names, &event, Direction::Up) {
            tracing::warn!(
                namespace = %self.shared.namespace,
                event = %names[0],
                error = %error,
                "meta-event listener failed",
            );
        }
    }

    fn leak_check(&self, target: Target, name: &EventName) {
        let (count, limit) = {
            let mut state = self.state();
            if state.warned.contains(name) {
                return;
            }
            let count = state.store.listener_count(target, name);
            let limit = state.store.max_listeners(target).unwrap_or(state.max_listeners);
            if count <= limit {
                return;
            }
            state.warned.insert(name.clone());
            (count, limit)
        };
        tracing::warn!(
            namespace = %self.shared.namespace,
            event = %name,
            count,
            limit,
            "possible listener leak: count exceeds the max-listener threshold",
        );
    }

    #[cfg(test)]
    pub(crate) fn warned_names(&self) -> Vec<EventName> {
        self.state().warned.iter().cloned().collect()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("namespace", &self.shared.namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::listeners::ListenerFn;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Namespace::Default, DispatcherConfig::default())
    }

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> ListenerRef {
        let log = Arc::clone(log);
        ListenerFn::arc(move |_ev| {
            log.lock().unwrap().push(tag);
            Ok(())
        })
    }

    #[test]
    fn test_new_listener_meta_event_fires_on_registration() {
        let bus = dispatcher();
        let target = Target::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.on(target, MetaEvent::NewListener, recording(&seen, "meta"));
        // the meta listener observes its own registration; reset before the
        // registration under test
        seen.lock().unwrap().clear();

        bus.on(target, "ping", ListenerFn::arc(|_ev| Ok(())));
        assert_eq!(*seen.lock().unwrap(), vec!["meta"]);
    }

    #[test]
    fn test_remove_listener_meta_fires_even_when_absent() {
        let bus = dispatcher();
        let target = Target::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.on(target, MetaEvent::RemoveListener, recording(&seen, "removed"));

        let never_registered = ListenerFn::arc(|_ev| Ok(()));
        bus.remove_listener(target, "ping", &never_registered);
        assert_eq!(*seen.lock().unwrap(), vec!["removed"]);
    }

    #[test]
    fn test_hierarchy_meta_events_carry_both_edge_ends() {
        let bus = dispatcher();
        let target = Target::new();
        let parent = Target::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        bus.on(
            target,
            MetaEvent::AddParent,
            ListenerFn::arc(move |ev| {
                log.lock().unwrap().push((ev.parent(), ev.child()));
                Ok(())
            }),
        );

        bus.add_parent(target, parent);
        assert_eq!(*seen.lock().unwrap(), vec![(Some(parent), Some(target))]);
        assert_eq!(bus.parents(target), vec![parent]);
        assert_eq!(bus.children(parent), vec![target]);
    }

    #[test]
    fn test_remove_all_listeners_clears_everything_but_not_edges() {
        let bus = dispatcher();
        let target = Target::new();
        let parent = Target::new();

        bus.add_parent(target, parent);
        bus.on(target, "a", ListenerFn::arc(|_ev| Ok(())));
        bus.on(target, "a", ListenerFn::arc(|_ev| Ok(())));
        bus.on(target, "b", ListenerFn::arc(|_ev| Ok(())));

        bus.remove_all_listeners(target);
        assert_eq!(bus.total_listener_count(target), 0);
        assert!(bus.event_names(target).is_empty());
        assert_eq!(bus.parents(target), vec![parent]);
    }

    #[test]
    fn test_remove_all_listeners_for_signals_each_cleared_listener() {
        let bus = dispatcher();
        let target = Target::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.on(target, "a", ListenerFn::arc(|_ev| Ok(())));
        bus.on(target, "a", ListenerFn::arc(|_ev| Ok(())));
        bus.on(target, "b", ListenerFn::arc(|_ev| Ok(())));
        bus.on(target, MetaEvent::RemoveListener, recording(&seen, "removed"));

        bus.remove_all_listeners_for(target, ["a", "b"]);
        assert_eq!(*seen.lock().unwrap(), vec!["removed", "removed", "removed"]);
        assert_eq!(bus.listener_count(target, "a"), 0);
        assert_eq!(bus.listener_count(target, "b"), 0);
        // only the named lists were cleared
        assert_eq!(bus.listener_count(target, MetaEvent::RemoveListener), 1);
        assert_eq!(
            bus.event_names(target),
            vec![EventName::Meta(MetaEvent::RemoveListener)],
        );
    }

    #[test]
    fn test_leak_advisory_warns_once_per_event_name() {
        let bus = dispatcher();
        let target = Target::new();
        bus.set_max_listeners(2);

        for _ in 0..5 {
            bus.on(target, "chatty", ListenerFn::arc(|_ev| Ok(())));
        }
        for _ in 0..5 {
            bus.on(target, "quiet-enough", ListenerFn::arc(|_ev| Ok(())));
        }

        let warned = bus.warned_names();
        assert_eq!(warned.len(), 2);
        assert!(warned.contains(&EventName::user("chatty")));
        assert!(warned.contains(&EventName::user("quiet-enough")));
    }

    #[test]
    fn test_leak_advisory_respects_target_override() {
        let bus = dispatcher();
        let roomy = Target::new();
        bus.set_target_max_listeners(roomy, Some(100));

        for _ in 0..20 {
            bus.on(roomy, "bulk", ListenerFn::arc(|_ev| Ok(())));
        }
        assert!(bus.warned_names().is_empty());
        assert_eq!(bus.target_max_listeners(roomy), 100);
    }

    #[test]
    fn test_leak_advisory_scoped_per_namespace() {
        let first = Dispatcher::new(Namespace::from("one"), DispatcherConfig::default());
        let second = Dispatcher::new(Namespace::from("two"), DispatcherConfig::default());
        let target = Target::new();
        first.set_max_listeners(1);
        second.set_max_listeners(1);

        for _ in 0..3 {
            first.on(target, "x", ListenerFn::arc(|_ev| Ok(())));
        }
        assert_eq!(first.warned_names(), vec![EventName::user("x")]);
        // a warning in one namespace never suppresses another namespace's
        assert!(second.warned_names().is_empty());
        for _ in 0..3 {
            second.on(target, "x", ListenerFn::arc(|_ev| Ok(())));
        }
        assert_eq!(second.warned_names(), vec![EventName::user("x")]);
    }

    #[test]
    fn test_registration_on_multiple_names() {
        let bus = dispatcher();
        let target = Target::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let listener = bus.on(target, ["ping", "pong"], recording(&seen, "hit"));
        assert_eq!(bus.listener_count(target, "ping"), 1);
        assert_eq!(bus.listener_count(target, "pong"), 1);

        bus.remove_listener(target, ["ping", "pong"], &listener);
        assert_eq!(bus.total_listener_count(target), 0);
    }
}
