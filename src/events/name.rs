//! # Event names: user events and reserved meta-events.
//!
//! Listener lists are keyed by [`EventName`]. User code normally works with
//! plain strings (`"ping"`, `"error"`); the engine itself publishes a closed
//! set of reserved [`MetaEvent`] names whenever listeners or hierarchy edges
//! change. Keeping the reserved names in their own enum variant means a user
//! string can never collide with or spoof a meta-event.
//!
//! Most registration and emission entry points accept anything implementing
//! [`IntoEventNames`], so a single name, a string, or a batch of names all
//! work at the call site:
//!
//! ```
//! use emitree::{EventName, IntoEventNames, MetaEvent};
//!
//! assert_eq!("ping".into_event_names(), vec![EventName::user("ping")]);
//! assert_eq!(
//!     ["ping", "pong"].into_event_names().len(),
//!     2,
//! );
//! assert_eq!(
//!     MetaEvent::NewListener.into_event_names(),
//!     vec![EventName::Meta(MetaEvent::NewListener)],
//! );
//! ```

use std::fmt;
use std::sync::Arc;

/// Name of the failure-class user event checked by strict mode.
pub const ERROR_EVENT: &str = "error";

/// Reserved events published by the engine itself.
///
/// These fire on the affected target whenever a listener or hierarchy edge is
/// added or removed, carrying a matching
/// [`EventDetail`](crate::events::EventDetail) variant. They are ordinary
/// subscription keys — `dispatcher.on(target, MetaEvent::AddChild, ...)` makes
/// hierarchy changes observable — but they are never raised by user code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetaEvent {
    /// A listener was registered on the target.
    NewListener,
    /// A listener was removed from the target.
    RemoveListener,
    /// A parent edge was added to the target.
    AddParent,
    /// A parent edge was removed from the target.
    RemoveParent,
    /// A child edge was added to the target.
    AddChild,
    /// A child edge was removed from the target.
    RemoveChild,
}

impl MetaEvent {
    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            MetaEvent::NewListener => "new_listener",
            MetaEvent::RemoveListener => "remove_listener",
            MetaEvent::AddParent => "add_parent",
            MetaEvent::RemoveParent => "remove_parent",
            MetaEvent::AddChild => "add_child",
            MetaEvent::RemoveChild => "remove_child",
        }
    }
}

impl fmt::Display for MetaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "meta:{}", self.as_label())
    }
}

/// Key under which listeners are stored: a user string or a reserved
/// meta-event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventName {
    /// A user-defined event name.
    User(Arc<str>),
    /// A reserved engine meta-event.
    Meta(MetaEvent),
}

impl EventName {
    /// Creates a user event name.
    pub fn user(name: impl Into<Arc<str>>) -> Self {
        EventName::User(name.into())
    }

    /// True if this is one of the reserved meta-events.
    pub fn is_meta(&self) -> bool {
        matches!(self, EventName::Meta(_))
    }

    /// True if this is the failure-class `error` user event.
    pub fn is_error(&self) -> bool {
        matches!(self, EventName::User(name) if &**name == ERROR_EVENT)
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        EventName::user(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        EventName::user(name)
    }
}

impl From<MetaEvent> for EventName {
    fn from(meta: MetaEvent) -> Self {
        EventName::Meta(meta)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventName::User(name) => f.write_str(name),
            EventName::Meta(meta) => meta.fmt(f),
        }
    }
}

/// Coercion from a single name (or a batch of names) into the name list for
/// one dispatch or registration call.
///
/// Multiple names are processed independently, in the order supplied.
pub trait IntoEventNames {
    /// Converts `self` into the ordered name list.
    fn into_event_names(self) -> Vec<EventName>;
}

impl IntoEventNames for EventName {
    fn into_event_names(self) -> Vec<EventName> {
        vec![self]
    }
}

impl IntoEventNames for &EventName {
    fn into_event_names(self) -> Vec<EventName> {
        vec![self.clone()]
    }
}

impl IntoEventNames for &str {
    fn into_event_names(self) -> Vec<EventName> {
        vec![self.into()]
    }
}

impl IntoEventNames for String {
    fn into_event_names(self) -> Vec<EventName> {
        vec![self.into()]
    }
}

impl IntoEventNames for MetaEvent {
    fn into_event_names(self) -> Vec<EventName> {
        vec![self.into()]
    }
}

impl IntoEventNames for Vec<EventName> {
    fn into_event_names(self) -> Vec<EventName> {
        self
    }
}

impl IntoEventNames for &[EventName] {
    fn into_event_names(self) -> Vec<EventName> {
        self.to_vec()
    }
}

impl<const N: usize> IntoEventNames for [EventName; N] {
    fn into_event_names(self) -> Vec<EventName> {
        self.into_iter().collect()
    }
}

impl<const N: usize> IntoEventNames for [&str; N] {
    fn into_event_names(self) -> Vec<EventName> {
        self.into_iter().map(EventName::from).collect()
    }
}
