//! # Per-namespace dispatcher configuration.
//!
//! Provides [`DispatcherConfig`], the defaults applied to every dispatcher a
//! [`Registry`](crate::Registry) creates.
//!
//! Config is used in two ways:
//! 1. **Registry creation**: `Registry::with_config(config)`
//! 2. **Dispatcher defaults**: each namespace starts with
//!    `config.max_listeners` as its leak-advisory threshold, adjustable later
//!    via `Dispatcher::set_max_listeners` (namespace level) or
//!    `Dispatcher::set_target_max_listeners` (per-target override).

/// Fallback max-listener threshold when nothing else is configured.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Defaults applied to every dispatcher created by a registry.
///
/// ## Field semantics
/// - `max_listeners`: per-(target, event) listener count above which a
///   one-time leak advisory is logged. Advisory only; registration always
///   succeeds regardless of the count.
#[derive(Clone, Copy, Debug)]
pub struct DispatcherConfig {
    /// Initial namespace-level max-listener threshold.
    ///
    /// The effective threshold for a given target resolves as: per-target
    /// override, else the namespace value, else [`DEFAULT_MAX_LISTENERS`].
    pub max_listeners: usize,
}

impl Default for DispatcherConfig {
    /// Returns a configuration with `max_listeners = 10`.
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}
