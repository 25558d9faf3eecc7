//! # Dispatch engine: the bubbling traversal.
//!
//! The engine walks listeners for each event name and recurses along the
//! hierarchy in the configured direction. It is deliberately small:
//!
//! - Direction selects the edge set: `emit` bubbles toward parents,
//!   `broadcast` toward children, direct mode recurses nowhere.
//! - The `stopped` flag is read live (through [`Cancelable`]) before every
//!   listener and before recursing, so a listener cancelling the shared
//!   descriptor halts the remainder of the traversal immediately.
//! - `bubbling` is read (through [`Bubbles`]) at each recursion level, so
//!   `stop_bubbling` mid-traversal still cuts off deeper levels.
//! - The return value aggregates "did any listener actually run" across the
//!   local list and every recursive branch.
//!
//! ## Semantics
//!
//! Per event name, in the order supplied:
//!
//! 1. Snapshot the local listener list and invoke it in order, skipping the
//!    rest as soon as the descriptor reports stopped. One-shot entries are
//!    retired (with their `RemoveListener` meta-event) before they run.
//! 2. If not stopped and still bubbling, recurse into the adjacency snapshot
//!    for the direction, OR-ing each branch's result into the aggregate.
//! 3. If the name is `error`, the current target is strict, and nothing in
//!    this level's subtree ran, fail with `UnhandledError`.
//!
//! The same ancestor reached via two hierarchy paths is visited once per
//! path; cycles in the hierarchy graph are a caller error and not defended
//! against here.
//!
//! ## Sync vs async discipline
//!
//! Synchronous dispatch is pure call/return. Sync listeners run inline; an
//! async listener cannot be awaited here, so its future is spawned onto the
//! ambient tokio runtime (fire-and-forget, failures logged) or skipped with a
//! warning when no runtime exists. Asynchronous dispatch awaits every
//! listener to completion before the next listener or hierarchy step runs —
//! there is no concurrent fan-out, trading throughput for a fully
//! deterministic left-to-right, depth-consistent order.
//!
//! A listener `Err` aborts the remaining traversal in both disciplines and
//! surfaces as [`DispatchError::ListenerFailed`]; panics are never caught.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::dispatch::Target;
use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::store::Direction;
use crate::error::DispatchError;
use crate::events::{Bubbles, Cancelable, Event, EventName};
use crate::listeners::ListenerRef;

impl Dispatcher {
    /// Synchronous traversal over every supplied name.
    pub(crate) fn dispatch(
        &self,
        target: Target,
        names: &[EventName],
        event: &Event,
        direction: Direction,
    ) -> Result<bool, DispatchError> {
        let mut had_any = false;
        for name in names {
            if self.dispatch_one(target, name, event, direction)? {
                had_any = true;
            }
        }
        Ok(had_any)
    }

    fn dispatch_one(
        &self,
        target: Target,
        name: &EventName,
        event: &Event,
        direction: Direction,
    ) -> Result<bool, DispatchError> {
        let bubbling = event.bubbling();
        let mut had = false;

        for entry in self.snapshot_entries(target, name) {
            if event.stopped() {
                break;
            }
            if entry.once && !self.retire_once(target, name, &entry.listener) {
                continue;
            }
            had = true;
            self.invoke_sync(&entry.listener, name, event)?;
        }

        if !event.stopped() && bubbling {
            for adjacent in self.adjacent(target, direction) {
                if self.dispatch_one(adjacent, name, event, direction)? {
                    had = true;
                }
            }
        }

        if name.is_error() && !had && self.strict_errors(target) {
            return Err(DispatchError::UnhandledError { target });
        }
        Ok(had)
    }

    fn invoke_sync(
        &self,
        listener: &ListenerRef,
        name: &EventName,
        event: &Event,
    ) -> Result<(), DispatchError> {
        match listener {
            ListenerRef::Sync(listener) => {
                listener
                    .on_event(event.clone())
                    .map_err(|source| DispatchError::ListenerFailed {
                        event: name.clone(),
                        source,
                    })
            }
            ListenerRef::Async(listener) => {
                // Mirrors an un-awaited future: the result is not part of
                // this traversal.
                let listener = Arc::clone(listener);
                let event = event.clone();
                let name = name.clone();
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            if let Err(error) = listener.on_event(event).await {
                                tracing::warn!(
                                    event = %name,
                                    listener = listener.name(),
                                    error = %error,
                                    "async listener failed during synchronous dispatch",
                                );
                            }
                        });
                    }
                    Err(_) => {
                        tracing::warn!(
                            event = %name,
                            listener = listener.name(),
                            "async listener skipped: synchronous dispatch outside a runtime",
                        );
                    }
                }
                Ok(())
            }
        }
    }

    /// Asynchronous traversal over every supplied name; strictly one
    /// listener at a time.
    pub(crate) async fn dispatch_async(
        &self,
        target: Target,
        names: &[EventName],
        event: &Event,
        direction: Direction,
    ) -> Result<bool, DispatchError> {
        let mut had_any = false;
        for name in names {
            if self.dispatch_one_async(target, name, event, direction).await? {
                had_any = true;
            }
        }
        Ok(had_any)
    }

    // Recursive async fn, boxed by hand.
    fn dispatch_one_async<'a>(
        &'a self,
        target: Target,
        name: &'a EventName,
        event: &'a Event,
        direction: Direction,
    ) -> BoxFuture<'a, Result<bool, DispatchError>> {
        async move {
            let bubbling = event.bubbling();
            let mut had = false;

            for entry in self.snapshot_entries(target, name) {
                if event.stopped() {
                    break;
                }
                if entry.once && !self.retire_once(target, name, &entry.listener) {
                    continue;
                }
                had = true;
                match &entry.listener {
                    ListenerRef::Sync(listener) => listener.on_event(event.clone()),
                    ListenerRef::Async(listener) => listener.on_event(event.clone()).await,
                }
                .map_err(|source| DispatchError::ListenerFailed {
                    event: name.clone(),
                    source,
                })?;
            }

            if !event.stopped() && bubbling {
                for adjacent in self.adjacent(target, direction) {
                    if self
                        .dispatch_one_async(adjacent, name, event, direction)
                        .await?
                    {
                        had = true;
                    }
                }
            }

            if name.is_error() && !had && self.strict_errors(target) {
                return Err(DispatchError::UnhandledError { target });
            }
            Ok(had)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::config::DispatcherConfig;
    use crate::dispatch::Target;
    use crate::dispatch::dispatcher::Dispatcher;
    use crate::error::{DispatchError, ListenerError};
    use crate::events::{Bubbles, Cancelable, Event};
    use crate::listeners::{AsyncListenerFn, ListenerFn, ListenerRef};
    use crate::registry::Namespace;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Namespace::Default, DispatcherConfig::default())
    }

    fn recording(log: &Log, tag: &'static str) -> ListenerRef {
        let log = Arc::clone(log);
        ListenerFn::arc(move |_ev| {
            log.lock().unwrap().push(tag);
            Ok(())
        })
    }

    fn taken(log: &Log) -> Vec<&'static str> {
        log.lock().unwrap().clone()
    }

    /// A → P → G chain with a recording listener on each tier.
    fn chain(bus: &Dispatcher, log: &Log) -> (Target, Target, Target) {
        let a = Target::new();
        let p = Target::new();
        let g = Target::new();
        bus.add_parent(a, p);
        bus.add_parent(p, g);
        bus.on(a, "ping", recording(log, "a"));
        bus.on(p, "ping", recording(log, "p"));
        bus.on(g, "ping", recording(log, "g"));
        (a, p, g)
    }

    #[test]
    fn test_emit_without_listeners_reports_none() {
        let bus = dispatcher();
        let target = Target::new();
        assert!(!bus.emit(target, "ping", &Event::new(target)).unwrap());

        bus.on(target, "ping", ListenerFn::arc(|_ev| Ok(())));
        assert!(bus.emit(target, "ping", &Event::new(target)).unwrap());
    }

    #[test]
    fn test_emit_bubbles_upward_in_tier_order() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        assert!(bus.emit(a, "ping", &Event::new(a)).unwrap());
        assert_eq!(taken(&log), vec!["a", "p", "g"]);
    }

    #[test]
    fn test_non_bubbling_event_stays_target_local() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        assert!(bus.emit(a, "ping", &Event::non_bubbling(a)).unwrap());
        assert_eq!(taken(&log), vec!["a"]);
    }

    #[test]
    fn test_broadcast_bubbles_downward() {
        let bus = dispatcher();
        let log = Log::default();
        let (_a, _p, g) = chain(&bus, &log);

        assert!(bus.broadcast(g, "ping", &Event::new(g)).unwrap());
        assert_eq!(taken(&log), vec!["g", "p", "a"]);
    }

    #[test]
    fn test_direct_mode_never_recurses() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        assert!(bus.emit_direct(a, "ping", &Event::new(a)).unwrap());
        assert_eq!(taken(&log), vec!["a"]);
    }

    #[test]
    fn test_cancel_stops_same_level_and_ancestors() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        let canceller = ListenerFn::arc(|ev| {
            ev.cancel();
            Ok(())
        });
        bus.prepend_listener(a, "ping", canceller);

        let event = Event::new(a);
        assert!(bus.emit(a, "ping", &event).unwrap());
        // only the canceller itself ran
        assert_eq!(taken(&log), Vec::<&str>::new());
        assert!(event.stopped());
    }

    #[test]
    fn test_stop_bubbling_mid_level_finishes_level_then_halts() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        let stopper = ListenerFn::arc(|ev| {
            ev.stop_bubbling();
            Ok(())
        });
        bus.prepend_listener(a, "ping", stopper);

        assert!(bus.emit(a, "ping", &Event::new(a)).unwrap());
        // local delivery completes, ancestors are cut off
        assert_eq!(taken(&log), vec!["a"]);
    }

    #[test]
    fn test_prepend_then_append_invocation_order() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        bus.on(target, "ping", recording(&log, "appended"));
        bus.prepend_listener(target, "ping", recording(&log, "prepended"));

        bus.emit(target, "ping", &Event::new(target)).unwrap();
        assert_eq!(taken(&log), vec!["prepended", "appended"]);
    }

    #[test]
    fn test_once_fires_exactly_once() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        bus.once(target, "ping", recording(&log, "once"));
        assert!(bus.emit(target, "ping", &Event::new(target)).unwrap());
        assert!(!bus.emit(target, "ping", &Event::new(target)).unwrap());
        assert_eq!(taken(&log), vec!["once"]);
        assert_eq!(bus.listener_count(target, "ping"), 0);
    }

    #[test]
    fn test_multiple_names_processed_in_supplied_order() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        bus.on(target, "second", recording(&log, "second"));
        bus.on(target, "first", recording(&log, "first"));

        assert!(
            bus.emit(target, ["first", "second"], &Event::new(target))
                .unwrap()
        );
        assert_eq!(taken(&log), vec!["first", "second"]);
    }

    #[test]
    fn test_diamond_ancestor_visited_once_per_path() {
        let bus = dispatcher();
        let log = Log::default();
        let a = Target::new();
        let p1 = Target::new();
        let p2 = Target::new();
        let g = Target::new();
        bus.add_parent(a, p1);
        bus.add_parent(a, p2);
        bus.add_parent(p1, g);
        bus.add_parent(p2, g);
        bus.on(g, "ping", recording(&log, "g"));

        assert!(bus.emit(a, "ping", &Event::new(a)).unwrap());
        assert_eq!(taken(&log), vec!["g", "g"]);
    }

    #[test]
    fn test_listener_failure_aborts_remaining_traversal() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        let failing = ListenerFn::arc(|_ev| Err(ListenerError::fail("boom")));
        bus.prepend_listener(a, "ping", failing);

        let err = bus.emit(a, "ping", &Event::new(a)).unwrap_err();
        assert_eq!(err.as_label(), "dispatch_listener_failed");
        // nothing after the failure ran, locally or up the chain
        assert_eq!(taken(&log), Vec::<&str>::new());
    }

    #[test]
    fn test_mutation_during_dispatch_does_not_affect_inflight_snapshot() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        let late = recording(&log, "late");
        let registrar = {
            let bus = bus.clone();
            let late = late.clone();
            ListenerFn::arc(move |ev| {
                bus.on(ev.target(), "ping", late.clone());
                Ok(())
            })
        };
        bus.on(target, "ping", registrar);
        bus.on(target, "ping", recording(&log, "second"));

        bus.emit(target, "ping", &Event::new(target)).unwrap();
        // the listener added mid-flight is absent from this traversal
        assert_eq!(taken(&log), vec!["second"]);

        log.lock().unwrap().clear();
        bus.emit(target, "ping", &Event::new(target)).unwrap();
        // subsequent traversals see it (the registrar added another copy)
        assert!(taken(&log).contains(&"late"));
    }

    #[test]
    fn test_strict_unhandled_error_event_fails() {
        let bus = dispatcher();
        let target = Target::new();
        bus.set_strict_errors(target, true);

        let err = bus.emit(target, "error", &Event::new(target)).unwrap_err();
        assert!(matches!(err, DispatchError::UnhandledError { target: t } if t == target));
    }

    #[test]
    fn test_strict_error_satisfied_by_ancestor_listener() {
        let bus = dispatcher();
        let log = Log::default();
        let target = Target::new();
        let parent = Target::new();
        bus.add_parent(target, parent);
        bus.set_strict_errors(target, true);
        bus.on(parent, "error", recording(&log, "parent"));

        assert!(bus.emit(target, "error", &Event::new(target)).unwrap());
        assert_eq!(taken(&log), vec!["parent"]);
    }

    #[test]
    fn test_non_strict_unhandled_error_is_ordinary() {
        let bus = dispatcher();
        let target = Target::new();
        assert!(!bus.emit(target, "error", &Event::new(target)).unwrap());
    }

    #[tokio::test]
    async fn test_async_emission_is_strictly_sequential() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        for (start, end, delay) in [
            ("start-1", "end-1", 20),
            ("start-2", "end-2", 10),
            ("start-3", "end-3", 1),
        ] {
            let log = Arc::clone(&log);
            bus.on(
                target,
                "work",
                AsyncListenerFn::arc(move |_ev| {
                    let log = Arc::clone(&log);
                    async move {
                        log.lock().unwrap().push(start);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        log.lock().unwrap().push(end);
                        Ok(())
                    }
                }),
            );
        }

        assert!(bus.emit_async(target, "work", &Event::new(target)).await.unwrap());
        assert_eq!(
            taken(&log),
            vec!["start-1", "end-1", "start-2", "end-2", "start-3", "end-3"],
        );
    }

    #[tokio::test]
    async fn test_async_emission_bubbles_after_local_listeners() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        assert!(bus.emit_async(a, "ping", &Event::new(a)).await.unwrap());
        assert_eq!(taken(&log), vec!["a", "p", "g"]);
    }

    #[tokio::test]
    async fn test_async_listener_error_propagates_and_aborts() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        bus.on(
            target,
            "work",
            AsyncListenerFn::arc(|_ev| async { Err(ListenerError::fail("boom")) }),
        );
        bus.on(target, "work", recording(&log, "after"));

        let err = bus
            .emit_async(target, "work", &Event::new(target))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "dispatch_listener_failed");
        assert_eq!(taken(&log), Vec::<&str>::new());
    }

    #[tokio::test]
    async fn test_async_cancel_halts_ancestor_delivery() {
        let bus = dispatcher();
        let log = Log::default();
        let (a, _, _) = chain(&bus, &log);

        bus.prepend_listener(
            a,
            "ping",
            AsyncListenerFn::arc(|ev| async move {
                ev.cancel();
                Ok(())
            }),
        );

        assert!(bus.emit_async(a, "ping", &Event::new(a)).await.unwrap());
        assert_eq!(taken(&log), Vec::<&str>::new());
    }

    #[tokio::test]
    async fn test_sync_emit_spawns_async_listener_fire_and_forget() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        {
            let log = Arc::clone(&log);
            bus.on(
                target,
                "work",
                AsyncListenerFn::arc(move |_ev| {
                    let log = Arc::clone(&log);
                    async move {
                        log.lock().unwrap().push("spawned");
                        Ok(())
                    }
                }),
            );
        }

        // counted as a listener even though its result is not awaited
        assert!(bus.emit(target, "work", &Event::new(target)).unwrap());
        assert_eq!(taken(&log), Vec::<&str>::new());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(taken(&log), vec!["spawned"]);
    }

    #[tokio::test]
    async fn test_async_once_fires_exactly_once() {
        let bus = dispatcher();
        let target = Target::new();
        let log = Log::default();

        {
            let log = Arc::clone(&log);
            bus.once(
                target,
                "work",
                AsyncListenerFn::arc(move |_ev| {
                    let log = Arc::clone(&log);
                    async move {
                        log.lock().unwrap().push("once");
                        Ok(())
                    }
                }),
            );
        }

        assert!(bus.emit_async(target, "work", &Event::new(target)).await.unwrap());
        assert!(!bus.emit_async(target, "work", &Event::new(target)).await.unwrap());
        assert_eq!(taken(&log), vec!["once"]);
    }
}
