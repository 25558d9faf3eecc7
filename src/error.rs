//! Error types used by the dispatch engine and listeners.
//!
//! This module defines two main error enums:
//!
//! - [`DispatchError`] — errors raised by an emission call itself.
//! - [`ListenerError`] — errors raised by individual listener invocations.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! The engine never catches or suppresses listener failures: the first `Err`
//! returned by a listener aborts the remainder of that traversal and surfaces
//! to the `emit`/`emit_async` caller as [`DispatchError::ListenerFailed`].
//! Caller misuse (removing a listener or hierarchy edge that is not present)
//! is a silent no-op and never produces an error.

use thiserror::Error;

use crate::dispatch::Target;
use crate::events::EventName;

/// # Errors produced by an emission call.
///
/// These represent failures of the dispatch traversal, as opposed to the
/// advisory diagnostics (leak warnings) which are reported via `tracing`
/// and never fail a call.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A listener returned an error; the rest of the traversal was aborted.
    #[error("listener failed while handling `{event}`: {source}")]
    ListenerFailed {
        /// The event name being dispatched when the listener failed.
        event: EventName,
        /// The underlying listener error.
        #[source]
        source: ListenerError,
    },

    /// An `error` event was emitted on a strict target and nothing in the
    /// bubbling path had a listener for it.
    #[error("`error` event emitted on {target} but nothing captured it")]
    UnhandledError {
        /// The target whose strict-mode check failed.
        target: Target,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use emitree::{DispatchError, Target};
    ///
    /// let err = DispatchError::UnhandledError { target: Target::new() };
    /// assert_eq!(err.as_label(), "dispatch_unhandled_error");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::ListenerFailed { .. } => "dispatch_listener_failed",
            DispatchError::UnhandledError { .. } => "dispatch_unhandled_error",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::ListenerFailed { event, source } => {
                format!("listener failed on `{event}`: {source}")
            }
            DispatchError::UnhandledError { target } => {
                format!("unhandled `error` event on {target}")
            }
        }
    }
}

/// # Errors produced by listener invocations.
///
/// Returned from [`Listener::on_event`](crate::Listener::on_event) and
/// [`AsyncListener::on_event`](crate::AsyncListener::on_event). A listener
/// error during a traversal aborts the remaining listeners and hierarchy
/// steps of that traversal.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The listener failed to handle the event.
    #[error("listener failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl ListenerError {
    /// Creates a [`ListenerError::Fail`] from any displayable error.
    pub fn fail(error: impl ToString) -> Self {
        ListenerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Fail { .. } => "listener_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ListenerError::Fail { error } => format!("error: {error}"),
        }
    }
}

impl From<String> for ListenerError {
    fn from(error: String) -> Self {
        ListenerError::Fail { error }
    }
}

impl From<&str> for ListenerError {
    fn from(error: &str) -> Self {
        ListenerError::Fail {
            error: error.to_string(),
        }
    }
}
