//! # Event descriptors passed to listeners.
//!
//! [`Event`] is the payload every listener receives. The [`EventDetail`] enum
//! classifies descriptors across three categories:
//! - **User events**: raised by callers through `emit`/`broadcast`.
//! - **Listener meta-events**: published by the engine when listeners are
//!   added or removed, carrying the affected listener handle.
//! - **Hierarchy meta-events**: published by the engine when parent/child
//!   edges change, carrying both ends of the edge.
//!
//! ## Shared propagation flags
//! Cloning an [`Event`] is cheap and every clone shares the same `stopped`
//! and `bubbling` flags. This is what makes cooperative cancellation work: a
//! listener calling [`Event::cancel`] on its own copy is observed live by the
//! engine, which skips the remaining listeners and hierarchy steps of that
//! traversal. Once set, `stopped` stays set for the rest of the traversal.
//!
//! The engine consults the flags through the [`Cancelable`] and [`Bubbles`]
//! capability traits rather than probing fields ad hoc.
//!
//! ## Example
//! ```
//! use emitree::{Bubbles, Cancelable, Event, Target};
//!
//! let origin = Target::new();
//! let ev = Event::new(origin).with_data(42_u32);
//!
//! assert_eq!(ev.target(), origin);
//! assert_eq!(ev.data::<u32>(), Some(&42));
//! assert!(ev.bubbling() && !ev.stopped());
//!
//! let copy = ev.clone();
//! copy.cancel();
//! assert!(ev.stopped());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dispatch::Target;
use crate::listeners::ListenerRef;

/// A payload type whose delivery can be cooperatively cancelled mid-traversal.
pub trait Cancelable {
    /// True once the traversal has been cancelled.
    fn stopped(&self) -> bool;

    /// Cancels the traversal: no further listeners or hierarchy steps run.
    fn cancel(&self);
}

/// A payload type that controls hierarchy recursion for its traversal.
pub trait Bubbles {
    /// True while the event still propagates along the hierarchy.
    fn bubbling(&self) -> bool;

    /// Keeps delivery target-local from this point on; already-reached
    /// listeners are unaffected.
    fn stop_bubbling(&self);
}

/// Propagation state shared by every clone of one descriptor.
#[derive(Debug)]
struct Flags {
    stopped: AtomicBool,
    bubbling: AtomicBool,
}

/// Classification of a descriptor plus its kind-specific fields.
#[derive(Clone)]
pub enum EventDetail {
    /// An ordinary user event.
    User,
    /// A listener was registered on the target.
    NewListener {
        /// The listener that was added.
        listener: ListenerRef,
    },
    /// A listener was removed from the target.
    RemoveListener {
        /// The listener that was removed.
        listener: ListenerRef,
    },
    /// A parent edge was added.
    AddParent {
        /// The parent end of the edge.
        parent: Target,
        /// The child end of the edge.
        child: Target,
    },
    /// A parent edge was removed.
    RemoveParent {
        /// The parent end of the edge.
        parent: Target,
        /// The child end of the edge.
        child: Target,
    },
    /// A child edge was added.
    AddChild {
        /// The parent end of the edge.
        parent: Target,
        /// The child end of the edge.
        child: Target,
    },
    /// A child edge was removed.
    RemoveChild {
        /// The parent end of the edge.
        parent: Target,
        /// The child end of the edge.
        child: Target,
    },
}

impl fmt::Debug for EventDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDetail::User => f.write_str("User"),
            EventDetail::NewListener { .. } => f.write_str("NewListener"),
            EventDetail::RemoveListener { .. } => f.write_str("RemoveListener"),
            EventDetail::AddParent { parent, child } => {
                write!(f, "AddParent {{ parent: {parent}, child: {child} }}")
            }
            EventDetail::RemoveParent { parent, child } => {
                write!(f, "RemoveParent {{ parent: {parent}, child: {child} }}")
            }
            EventDetail::AddChild { parent, child } => {
                write!(f, "AddChild {{ parent: {parent}, child: {child} }}")
            }
            EventDetail::RemoveChild { parent, child } => {
                write!(f, "RemoveChild {{ parent: {parent}, child: {child} }}")
            }
        }
    }
}

/// Event descriptor delivered to listeners.
///
/// Carries the origin target, the kind-specific [`EventDetail`], optional
/// user data, and the shared propagation flags. The origin target stays fixed
/// while the engine walks the hierarchy — listeners on an ancestor still see
/// the target the event was raised against.
#[derive(Clone)]
pub struct Event {
    target: Target,
    detail: EventDetail,
    flags: Arc<Flags>,
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl Event {
    fn with_flags(target: Target, detail: EventDetail, bubbling: bool) -> Self {
        Self {
            target,
            detail,
            flags: Arc::new(Flags {
                stopped: AtomicBool::new(false),
                bubbling: AtomicBool::new(bubbling),
            }),
            data: None,
        }
    }

    /// Creates a user event descriptor originating at `target`.
    ///
    /// Bubbles by default; use [`Event::non_bubbling`] or
    /// [`Bubbles::stop_bubbling`] for target-local delivery.
    pub fn new(target: Target) -> Self {
        Self::with_flags(target, EventDetail::User, true)
    }

    /// Creates a user event descriptor that never recurses into the hierarchy.
    pub fn non_bubbling(target: Target) -> Self {
        Self::with_flags(target, EventDetail::User, false)
    }

    /// Meta-event constructor. Meta-events do not bubble.
    pub(crate) fn meta(target: Target, detail: EventDetail) -> Self {
        Self::with_flags(target, detail, false)
    }

    /// Attaches arbitrary user data, retrievable via [`Event::data`].
    pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// Returns the attached user data, if any of type `T` was attached.
    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|data| data.downcast_ref())
    }

    /// The target the event was originally raised against.
    pub fn target(&self) -> Target {
        self.target
    }

    /// The kind-specific detail of this descriptor.
    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    /// The affected listener, for listener meta-events.
    pub fn listener(&self) -> Option<&ListenerRef> {
        match &self.detail {
            EventDetail::NewListener { listener } | EventDetail::RemoveListener { listener } => {
                Some(listener)
            }
            _ => None,
        }
    }

    /// The parent end of the edge, for hierarchy meta-events.
    pub fn parent(&self) -> Option<Target> {
        match self.detail {
            EventDetail::AddParent { parent, .. }
            | EventDetail::RemoveParent { parent, .. }
            | EventDetail::AddChild { parent, .. }
            | EventDetail::RemoveChild { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// The child end of the edge, for hierarchy meta-events.
    pub fn child(&self) -> Option<Target> {
        match self.detail {
            EventDetail::AddParent { child, .. }
            | EventDetail::RemoveParent { child, .. }
            | EventDetail::AddChild { child, .. }
            | EventDetail::RemoveChild { child, .. } => Some(child),
            _ => None,
        }
    }
}

impl Cancelable for Event {
    fn stopped(&self) -> bool {
        self.flags.stopped.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.flags.stopped.store(true, Ordering::SeqCst);
    }
}

impl Bubbles for Event {
    fn bubbling(&self) -> bool {
        self.flags.bubbling.load(Ordering::SeqCst)
    }

    fn stop_bubbling(&self) {
        self.flags.bubbling.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("target", &self.target)
            .field("detail", &self.detail)
            .field("stopped", &self.stopped())
            .field("bubbling", &self.bubbling())
            .field("has_data", &self.data.is_some())
            .finish()
    }
}
