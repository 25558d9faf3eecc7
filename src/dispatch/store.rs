//! # Listener store: per-target listener lists and hierarchy adjacency.
//!
//! One [`ListenerStore`] holds the whole mutable state of a namespace:
//! listener lists keyed by `(target, event name)`, the parent/child adjacency
//! lists, and per-target settings (max-listener override, strict-error flag).
//!
//! ## Rules
//! - Records and lists are created on first touch and never pruned; removal
//!   empties a list but keeps its slot, so re-adding is always safe.
//! - The per-target list of event lists is an ordered `Vec`, preserving
//!   first-registration order for `event_names`.
//! - Hierarchy edges live in dedicated adjacency lists, NOT in the listener
//!   map — generic listener queries can never observe them.
//! - Every read handed to the dispatch engine is a snapshot (a clone), so
//!   listeners mutating the store mid-traversal never corrupt an in-flight
//!   iteration.
//! - Edge mutations always touch both sides: adding a parent to `t` also adds
//!   `t` to the parent's child list, and removal is symmetric.
//!
//! The store is plain data with `&mut` methods; the dispatcher serializes
//! access behind its per-namespace mutex.

use std::collections::HashMap;

use crate::dispatch::Target;
use crate::events::EventName;
use crate::listeners::ListenerRef;

/// One registered listener plus its registration mode.
#[derive(Clone, Debug)]
pub(crate) struct Entry {
    /// The listener handle.
    pub(crate) listener: ListenerRef,
    /// One-shot registrations are retired on first firing.
    pub(crate) once: bool,
}

/// Hierarchy direction selector for adjacency reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Recurse toward parents (`emit`).
    Up,
    /// Recurse toward children (`broadcast`).
    Down,
    /// Target-local delivery only.
    None,
}

/// Per-target state: listener lists, edges and local settings.
#[derive(Default)]
pub(crate) struct TargetRecord {
    events: Vec<(EventName, Vec<Entry>)>,
    parents: Vec<Target>,
    children: Vec<Target>,
    max_listeners: Option<usize>,
    strict_errors: bool,
}

impl TargetRecord {
    fn list_mut(&mut self, name: &EventName) -> &mut Vec<Entry> {
        if let Some(index) = self.events.iter().position(|(key, _)| key == name) {
            return &mut self.events[index].1;
        }
        self.events.push((name.clone(), Vec::new()));
        let last = self.events.len() - 1;
        &mut self.events[last].1
    }

    fn list(&self, name: &EventName) -> Option<&Vec<Entry>> {
        self.events
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entries)| entries)
    }
}

/// The whole mutable state of one namespace.
#[derive(Default)]
pub(crate) struct ListenerStore {
    targets: HashMap<Target, TargetRecord>,
}

impl ListenerStore {
    fn record_mut(&mut self, target: Target) -> &mut TargetRecord {
        self.targets.entry(target).or_default()
    }

    fn record(&self, target: Target) -> Option<&TargetRecord> {
        self.targets.get(&target)
    }

    // ---------------------------
    // Listener lists
    // ---------------------------

    /// Appends an entry at the tail of `(target, name)`.
    pub(crate) fn append(&mut self, target: Target, name: &EventName, entry: Entry) {
        self.record_mut(target).list_mut(name).push(entry);
    }

    /// Inserts an entry at the head of `(target, name)`.
    pub(crate) fn prepend(&mut self, target: Target, name: &EventName, entry: Entry) {
        self.record_mut(target).list_mut(name).insert(0, entry);
    }

    /// Removes every occurrence of `listener` (by identity) from
    /// `(target, name)`. Returns the number of entries removed; an absent
    /// listener removes nothing.
    pub(crate) fn remove(
        &mut self,
        target: Target,
        name: &EventName,
        listener: &ListenerRef,
    ) -> usize {
        let list = self.record_mut(target).list_mut(name);
        let before = list.len();
        list.retain(|entry| !entry.listener.ptr_eq(listener));
        before - list.len()
    }

    /// Retires the first still-present one-shot entry for `listener`.
    ///
    /// Returns false when another traversal already retired it, which is the
    /// signal to skip the invocation and keep one-shot semantics exact.
    pub(crate) fn take_once(
        &mut self,
        target: Target,
        name: &EventName,
        listener: &ListenerRef,
    ) -> bool {
        let list = self.record_mut(target).list_mut(name);
        match list
            .iter()
            .position(|entry| entry.once && entry.listener.ptr_eq(listener))
        {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Empties the list for `(target, name)`, returning the drained entries.
    /// The list slot itself is kept.
    pub(crate) fn clear(&mut self, target: Target, name: &EventName) -> Vec<Entry> {
        std::mem::take(self.record_mut(target).list_mut(name))
    }

    /// Empties every event list for `target`, returning the drained entries
    /// per name. Hierarchy edges are untouched.
    pub(crate) fn clear_all(&mut self, target: Target) -> Vec<(EventName, Vec<Entry>)> {
        let record = self.record_mut(target);
        record
            .events
            .iter_mut()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, entries)| (name.clone(), std::mem::take(entries)))
            .collect()
    }

    /// Snapshot of the entries for `(target, name)` in invocation order.
    pub(crate) fn snapshot(&self, target: Target, name: &EventName) -> Vec<Entry> {
        self.record(target)
            .and_then(|record| record.list(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Listener count for `(target, name)`.
    pub(crate) fn listener_count(&self, target: Target, name: &EventName) -> usize {
        self.record(target)
            .and_then(|record| record.list(name))
            .map_or(0, Vec::len)
    }

    /// Listener count across every event list of `target`. Edges never count.
    pub(crate) fn total_listener_count(&self, target: Target) -> usize {
        self.record(target).map_or(0, |record| {
            record.events.iter().map(|(_, entries)| entries.len()).sum()
        })
    }

    /// Event names with at least one live listener, first-registration order.
    pub(crate) fn event_names(&self, target: Target) -> Vec<EventName> {
        self.record(target).map_or_else(Vec::new, |record| {
            record
                .events
                .iter()
                .filter(|(_, entries)| !entries.is_empty())
                .map(|(name, _)| name.clone())
                .collect()
        })
    }

    /// Snapshot of the listeners for `(target, name)`, de-duplicated by
    /// identity.
    pub(crate) fn listeners(&self, target: Target, name: &EventName) -> Vec<ListenerRef> {
        let mut out = Vec::new();
        if let Some(entries) = self.record(target).and_then(|record| record.list(name)) {
            for entry in entries {
                dedup_push(&mut out, &entry.listener);
            }
        }
        out
    }

    /// Aggregate snapshot across every event list of `target`, de-duplicated
    /// by identity. Hierarchy edges are not listeners and never appear here.
    pub(crate) fn all_listeners(&self, target: Target) -> Vec<ListenerRef> {
        let mut out = Vec::new();
        if let Some(record) = self.record(target) {
            for (_, entries) in &record.events {
                for entry in entries {
                    dedup_push(&mut out, &entry.listener);
                }
            }
        }
        out
    }

    // ---------------------------
    // Hierarchy edges
    // ---------------------------

    /// Adds the matched edge pair: `parent` onto `target`'s parent list and
    /// `target` onto `parent`'s child list.
    pub(crate) fn push_parent(&mut self, target: Target, parent: Target) {
        self.record_mut(target).parents.push(parent);
        self.record_mut(parent).children.push(target);
    }

    /// Adds the matched edge pair in the child direction.
    pub(crate) fn push_child(&mut self, target: Target, child: Target) {
        self.record_mut(target).children.push(child);
        self.record_mut(child).parents.push(target);
    }

    /// Removes every occurrence of the edge pair; absent edges remove
    /// nothing.
    pub(crate) fn pull_parent(&mut self, target: Target, parent: Target) {
        self.record_mut(target).parents.retain(|t| *t != parent);
        self.record_mut(parent).children.retain(|t| *t != target);
    }

    /// Removes every occurrence of the edge pair in the child direction.
    pub(crate) fn pull_child(&mut self, target: Target, child: Target) {
        self.record_mut(target).children.retain(|t| *t != child);
        self.record_mut(child).parents.retain(|t| *t != target);
    }

    /// Snapshot of the adjacency list for `direction`.
    pub(crate) fn adjacent(&self, target: Target, direction: Direction) -> Vec<Target> {
        self.record(target).map_or_else(Vec::new, |record| match direction {
            Direction::Up => record.parents.clone(),
            Direction::Down => record.children.clone(),
            Direction::None => Vec::new(),
        })
    }

    // ---------------------------
    // Per-target settings
    // ---------------------------

    pub(crate) fn max_listeners(&self, target: Target) -> Option<usize> {
        self.record(target).and_then(|record| record.max_listeners)
    }

    pub(crate) fn set_max_listeners(&mut self, target: Target, limit: Option<usize>) {
        self.record_mut(target).max_listeners = limit;
    }

    pub(crate) fn strict_errors(&self, target: Target) -> bool {
        self.record(target).is_some_and(|record| record.strict_errors)
    }

    pub(crate) fn set_strict_errors(&mut self, target: Target, strict: bool) {
        self.record_mut(target).strict_errors = strict;
    }
}

fn dedup_push(out: &mut Vec<ListenerRef>, listener: &ListenerRef) {
    if !out.iter().any(|seen| seen.ptr_eq(listener)) {
        out.push(listener.clone());
    }
}
