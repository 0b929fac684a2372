// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event subscription registry.
//
// Tracks a reference count per event name plus the order in which
// subscriptions arrived.  `remove_listeners` only receives a count, so it
// unwinds the most recent subscriptions first; the per-name counts follow.
// The registry is not synchronised itself; the bridge owns it behind a mutex.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pickerbridge_core::error::{BridgeError, Result};
use tracing::debug;

/// Reference-counted listener bookkeeping for one bridge instance.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    counts: HashMap<String, u64>,
    /// Every live subscription, oldest first.
    order: Vec<String>,
    invalidated: bool,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more listener for `event_name`. Returns the new count.
    pub fn add_listener(&mut self, event_name: &str) -> u64 {
        let count = self.counts.entry(event_name.to_owned()).or_insert(0);
        *count += 1;
        self.order.push(event_name.to_owned());
        debug!(event = %event_name, count = *count, "listener added");
        *count
    }

    /// Remove the `count` most recent subscriptions.
    ///
    /// Fails with `Underflow` without touching any state when `count` exceeds
    /// the number of live subscriptions.
    pub fn remove_listeners(&mut self, count: u64) -> Result<()> {
        self.check_removal(count)?;

        let keep = self.order.len() - count as usize;
        for name in self.order.drain(keep..) {
            if let Some(n) = self.counts.get_mut(&name) {
                *n -= 1;
                if *n == 0 {
                    self.counts.remove(&name);
                }
            }
        }
        debug!(removed = count, remaining = self.order.len(), "listeners removed");
        Ok(())
    }

    /// Fail with `Underflow` if `count` subscriptions cannot be removed.
    pub fn check_removal(&self, count: u64) -> Result<()> {
        let live = self.total();
        if count > live {
            return Err(BridgeError::Underflow {
                requested: count,
                live,
            });
        }
        Ok(())
    }

    /// Live listener count for `event_name`.
    pub fn listener_count(&self, event_name: &str) -> u64 {
        self.counts.get(event_name).copied().unwrap_or(0)
    }

    /// Aggregate live subscriptions across every event name.
    pub fn total(&self) -> u64 {
        self.order.len() as u64
    }

    /// Whether an emission for `event_name` should be delivered.
    pub fn has_listeners(&self, event_name: &str) -> bool {
        !self.invalidated && self.listener_count(event_name) > 0
    }

    /// Drop every registration. Terminal: nothing is delivered afterwards.
    pub fn invalidate(&mut self) {
        self.counts.clear();
        self.order.clear();
        self.invalidated = true;
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }
}

/// Lock a shared registry, recovering from poisoning.
///
/// Every mutation leaves the counters consistent before it can panic, so a
/// poisoned lock still guards valid state.
pub(crate) fn lock(registry: &Mutex<ListenerRegistry>) -> MutexGuard<'_, ListenerRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let registry = ListenerRegistry::new();
        assert_eq!(registry.total(), 0);
        assert_eq!(registry.listener_count("onConfirm"), 0);
        assert!(!registry.has_listeners("onConfirm"));
    }

    #[test]
    fn add_listener_counts_every_call() {
        let mut registry = ListenerRegistry::new();
        assert_eq!(registry.add_listener("onConfirm"), 1);
        assert_eq!(registry.add_listener("onConfirm"), 2);
        assert_eq!(registry.add_listener("onCancel"), 1);
        assert_eq!(registry.total(), 3);
    }

    #[test]
    fn remove_unwinds_most_recent_first() {
        let mut registry = ListenerRegistry::new();
        registry.add_listener("onConfirm");
        registry.add_listener("onCancel");
        registry.add_listener("onCancel");

        registry.remove_listeners(2).unwrap();
        assert_eq!(registry.listener_count("onCancel"), 0);
        assert_eq!(registry.listener_count("onConfirm"), 1);
        assert!(registry.has_listeners("onConfirm"));
    }

    #[test]
    fn two_adds_one_remove_leaves_a_listener() {
        let mut registry = ListenerRegistry::new();
        registry.add_listener("x");
        registry.add_listener("x");
        registry.remove_listeners(1).unwrap();
        assert_eq!(registry.listener_count("x"), 1);
    }

    #[test]
    fn underflow_leaves_state_unchanged() {
        let mut registry = ListenerRegistry::new();
        registry.add_listener("onConfirm");
        registry.add_listener("onCancel");

        let err = registry.remove_listeners(3).unwrap_err();
        assert!(matches!(err, BridgeError::Underflow { requested: 3, live: 2 }));
        assert_eq!(registry.total(), 2);
        assert_eq!(registry.listener_count("onConfirm"), 1);
        assert_eq!(registry.listener_count("onCancel"), 1);
    }

    #[test]
    fn remove_zero_is_a_no_op() {
        let mut registry = ListenerRegistry::new();
        registry.remove_listeners(0).unwrap();
        registry.add_listener("onConfirm");
        registry.remove_listeners(0).unwrap();
        assert_eq!(registry.total(), 1);
    }

    #[test]
    fn invalidate_is_terminal() {
        let mut registry = ListenerRegistry::new();
        registry.add_listener("onConfirm");
        registry.invalidate();
        assert!(registry.is_invalidated());
        assert_eq!(registry.total(), 0);
        assert!(!registry.has_listeners("onConfirm"));
    }
}
