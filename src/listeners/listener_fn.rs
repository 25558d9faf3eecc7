//! # Function-backed listeners (`ListenerFn`, `AsyncListenerFn`)
//!
//! Wrap plain closures as listeners without hand-writing a trait impl. The
//! async flavor wraps `F: Fn(Event) -> Fut`, producing a fresh future per
//! delivery so no state is shared between invocations; if shared state is
//! needed, move an `Arc<...>` into the closure explicitly.
//!
//! ## Example
//! ```
//! use std::sync::{Arc, Mutex};
//! use emitree::{AsyncListenerFn, ListenerFn, ListenerRef};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let log = Arc::clone(&seen);
//! let sync: ListenerRef = ListenerFn::arc(move |ev| {
//!     log.lock().unwrap().push(ev.target());
//!     Ok(())
//! });
//!
//! let log = Arc::clone(&seen);
//! let with_io: ListenerRef = AsyncListenerFn::arc(move |ev| {
//!     let log = Arc::clone(&log);
//!     async move {
//!         log.lock().unwrap().push(ev.target());
//!         Ok(())
//!     }
//! });
//! assert!(!sync.is_async());
//! assert!(with_io.is_async());
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::ListenerError;
use crate::events::Event;
use crate::listeners::listener::{AsyncListener, Listener, ListenerRef};

/// Boxed future returned by async listener invocations.
pub type BoxListenerFuture = BoxFuture<'static, Result<(), ListenerError>>;

/// Function-backed synchronous listener.
pub struct ListenerFn<F> {
    f: F,
}

impl<F> ListenerFn<F>
where
    F: Fn(Event) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    /// Creates a new function-backed listener.
    ///
    /// Prefer [`ListenerFn::arc`] when you immediately need a [`ListenerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the listener and returns it as a registrable handle.
    pub fn arc(f: F) -> ListenerRef {
        ListenerRef::Sync(Arc::new(Self::new(f)))
    }
}

impl<F> Listener for ListenerFn<F>
where
    F: Fn(Event) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    fn on_event(&self, event: Event) -> Result<(), ListenerError> {
        (self.f)(event)
    }

    fn name(&self) -> &'static str {
        "listener_fn"
    }
}

/// Function-backed asynchronous listener.
///
/// Wraps a closure that *creates* a new future per delivery.
pub struct AsyncListenerFn<F> {
    f: F,
}

impl<F, Fut> AsyncListenerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
{
    /// Creates a new function-backed async listener.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the listener and returns it as a registrable handle.
    pub fn arc(f: F) -> ListenerRef {
        ListenerRef::Async(Arc::new(Self::new(f)))
    }
}

#[async_trait]
impl<F, Fut> AsyncListener for AsyncListenerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
{
    async fn on_event(&self, event: Event) -> Result<(), ListenerError> {
        (self.f)(event).await
    }

    fn name(&self) -> &'static str {
        "async_listener_fn"
    }
}
