//! # Listener traits and the shared listener handle.
//!
//! Provides the two extension points for plugging event handlers into the
//! dispatcher, plus [`ListenerRef`], the handle the store keeps and the
//! identity that removal compares.
//!
//! ## Sync vs async
//! - [`Listener`] handles events inline; it is the only kind that runs as
//!   part of a synchronous `emit` traversal.
//! - [`AsyncListener`] returns a future. During `emit_async`/`broadcast_async`
//!   each listener is awaited to completion before the next listener or
//!   hierarchy step runs. During a *synchronous* emission the future cannot
//!   be awaited; it is spawned onto the ambient tokio runtime instead
//!   (fire-and-forget), or skipped with a warning when no runtime is present.
//!
//! ## Identity
//! Listener identity is `Arc` pointer identity. Keep a clone of the
//! [`ListenerRef`] you registered and pass it back to remove that exact
//! registration:
//!
//! ```
//! use emitree::{ListenerFn, Registry, Target};
//!
//! let registry = Registry::new();
//! let bus = registry.default_dispatcher();
//! let target = Target::new();
//!
//! let listener = bus.on(target, "ping", ListenerFn::arc(|_ev| Ok(())));
//! assert_eq!(bus.listener_count(target, "ping"), 1);
//!
//! bus.remove_listener(target, "ping", &listener);
//! assert_eq!(bus.listener_count(target, "ping"), 0);
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ListenerError;
use crate::events::Event;

/// Synchronous event listener.
///
/// Invoked inline during dispatch; returning an `Err` aborts the remainder of
/// the traversal and surfaces to the emit caller. Handle recoverable problems
/// internally and reserve errors for failures the emitter must see.
pub trait Listener: Send + Sync + 'static {
    /// Handles a single event.
    ///
    /// The descriptor is a cheap clone sharing propagation flags with the
    /// in-flight traversal, so [`Cancelable::cancel`](crate::Cancelable::cancel)
    /// takes effect immediately.
    fn on_event(&self, event: Event) -> Result<(), ListenerError>;

    /// Returns the listener name used in diagnostics.
    ///
    /// Prefer short, descriptive names. The default uses
    /// `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Asynchronous event listener.
///
/// Awaited to completion during async dispatch (strictly one listener at a
/// time); spawned fire-and-forget during synchronous dispatch.
#[async_trait]
pub trait AsyncListener: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: Event) -> Result<(), ListenerError>;

    /// Returns the listener name used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a registered listener.
///
/// Cheap to clone; clones compare equal under [`ListenerRef::ptr_eq`] and
/// identify the same registration for removal.
#[derive(Clone)]
pub enum ListenerRef {
    /// A synchronous listener.
    Sync(Arc<dyn Listener>),
    /// An asynchronous listener.
    Async(Arc<dyn AsyncListener>),
}

impl ListenerRef {
    /// True if both handles refer to the same listener allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ListenerRef::Sync(a), ListenerRef::Sync(b)) => Arc::ptr_eq(a, b),
            (ListenerRef::Async(a), ListenerRef::Async(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// True for the asynchronous flavor.
    pub fn is_async(&self) -> bool {
        matches!(self, ListenerRef::Async(_))
    }

    /// The listener's diagnostic name.
    pub fn name(&self) -> &'static str {
        match self {
            ListenerRef::Sync(listener) => listener.name(),
            ListenerRef::Async(listener) => listener.name(),
        }
    }
}

impl From<Arc<dyn Listener>> for ListenerRef {
    fn from(listener: Arc<dyn Listener>) -> Self {
        ListenerRef::Sync(listener)
    }
}

impl From<Arc<dyn AsyncListener>> for ListenerRef {
    fn from(listener: Arc<dyn AsyncListener>) -> Self {
        ListenerRef::Async(listener)
    }
}

impl fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerRef::Sync(listener) => write!(f, "ListenerRef::Sync({})", listener.name()),
            ListenerRef::Async(listener) => write!(f, "ListenerRef::Async({})", listener.name()),
        }
    }
}
