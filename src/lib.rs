//! # emitree
//!
//! **Emitree** is an in-process, namespaced, hierarchical publish/subscribe
//! dispatcher for Rust.
//!
//! Arbitrary [`Target`] identities are linked into parent/child trees, and
//! events raised against a target propagate (bubble) along that hierarchy:
//! upward to ancestors with [`emit`](Dispatcher::emit), downward to
//! descendants with [`broadcast`](Dispatcher::broadcast), synchronously or
//! asynchronously, with cooperative stop/cancel semantics. The crate is a
//! best-effort, synchronous-by-default, single-process notification
//! mechanism — no cross-process delivery, no persistence, no back-pressure.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!     │   Emitter    │    │   Emitter    │    │   (direct    │
//!     │ (bound tgt A)│    │ (bound tgt B)│    │  Dispatcher  │
//!     └──────┬───────┘    └──────┬───────┘    │    calls)    │
//!            ▼                   ▼            └──────┬───────┘
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Registry (namespace key → singleton Dispatcher)                │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (one per namespace)                                 │
//! │  - ListenerStore ((target, event) → ordered listener list)      │
//! │  - Hierarchy (parents/children adjacency per target)            │
//! │  - Settings (max-listener thresholds, strict-error flags)       │
//! │  - Engine (sync + async bubbling traversal)                     │
//! └──────┬──────────────────────────────────────────────────┬───────┘
//!        │ emit: target ─► parents ─► ...                   │
//!        │ broadcast: target ─► children ─► ...             │
//!        ▼                                                  ▼
//!   user listeners                          meta-event listeners
//!   (sync / async)                          (NewListener, AddParent, ...)
//! ```
//!
//! ### One emission, step by step
//! ```text
//! emit(target, "name", &event)
//!
//! per event name (in supplied order):
//!   ├─► snapshot listener list for (target, name)
//!   ├─► for each listener, in order:
//!   │     ├─ event.stopped()?          ─► skip the rest of the traversal
//!   │     ├─ one-shot entry?           ─► retire it (+ RemoveListener meta)
//!   │     └─ invoke; Err aborts the whole traversal
//!   ├─► not stopped && event.bubbling()?
//!   │     └─ for each parent (emit) / child (broadcast):
//!   │          recurse with the same name, arguments and direction
//!   └─► strict target, name == "error", nothing ran anywhere?
//!         └─► DispatchError::UnhandledError
//!
//! returns: did any listener actually run (local + all branches)
//! ```
//!
//! ## Features
//! | Area            | Description                                                        | Key types / traits                      |
//! |-----------------|--------------------------------------------------------------------|-----------------------------------------|
//! | **Namespaces**  | Isolated dispatcher per opaque key, singleton per registry.        | [`Registry`], [`Namespace`]             |
//! | **Hierarchy**   | Paired parent/child edges with observable mutations.               | [`Dispatcher`], [`MetaEvent`]           |
//! | **Dispatch**    | Sync and async bubbling with live cancellation.                    | [`Event`], [`Cancelable`], [`Bubbles`]  |
//! | **Listeners**   | Trait or closure-backed, removable by identity.                    | [`Listener`], [`AsyncListener`], [`ListenerFn`] |
//! | **Facade**      | Fixed-target convenience wrapper.                                  | [`Emitter`], [`EmitterBuilder`]         |
//! | **Diagnostics** | One-shot leak advisory, strict unhandled-`error` checking.         | [`DispatcherConfig`], [`DispatchError`] |
//!
//! ## Concurrency model
//! Delivery is single-threaded and cooperative: listeners run one at a time,
//! and async emission awaits each listener to completion before the next one
//! starts — ordering across the whole bubbling tree is deterministic.
//! Registry state sits behind one mutex per namespace; listener code never
//! runs under it, so listeners may mutate the registry freely. There is no
//! timeout mechanism beyond the cooperative `stopped` flag: a listener that
//! never resolves stalls its traversal, and callers needing bounded latency
//! must race the emission future against a timer.
//!
//! ## Example
//! ```
//! use emitree::{Cancelable, Emitter, ListenerFn, Registry};
//!
//! let registry = Registry::new();
//!
//! let window = Emitter::builder(&registry).namespace("ui").build();
//! let panel = Emitter::builder(&registry)
//!     .namespace("ui")
//!     .parent(window.target())
//!     .build();
//!
//! window.on("click", ListenerFn::arc(|_ev| {
//!     // reached second, via bubbling
//!     Ok(())
//! }));
//! panel.on("click", ListenerFn::arc(|ev| {
//!     // reached first; call ev.cancel() to keep the click local
//!     let _ = ev.stopped();
//!     Ok(())
//! }));
//!
//! let handled = panel.emit("click", &panel.event()).unwrap();
//! assert!(handled);
//! ```

mod config;
mod dispatch;
mod emitter;
mod error;
mod events;
mod listeners;
mod registry;

// ---- Public re-exports ----

pub use config::{DEFAULT_MAX_LISTENERS, DispatcherConfig};
pub use dispatch::{Dispatcher, Target};
pub use emitter::{Emitter, EmitterBuilder};
pub use error::{DispatchError, ListenerError};
pub use events::{
    Bubbles, Cancelable, ERROR_EVENT, Event, EventDetail, EventName, IntoEventNames, MetaEvent,
};
pub use listeners::{
    AsyncListener, AsyncListenerFn, BoxListenerFuture, Listener, ListenerFn, ListenerRef,
};
pub use registry::{Namespace, Registry};
