//! Identity and teardown for bound UI state.
//!
//! Every state instance gets a [`SubscriberId`] at construction. Stores key
//! their subscriptions by that id, and the [`Lifecycle`] runs the registered
//! teardown hooks (unsubscribing from each store) exactly once.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

/// Unique identifier for a store subscriber.
///
/// Each state instance gets a unique ID when created. Stores use this ID to
/// route notifications and to drop the subscription on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "state-{}", self.0)
    }
}

type TeardownHook = Box<dyn FnOnce(SubscriberId) + Send>;

/// Identity plus one-shot teardown.
pub struct Lifecycle {
    id: SubscriberId,
    disposed: AtomicBool,
    hooks: Mutex<Vec<TeardownHook>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            id: SubscriberId::new(),
            disposed: AtomicBool::new(false),
            hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Register a hook to run on teardown, in registration order.
    ///
    /// Hooks registered after teardown run immediately.
    pub fn on_teardown<F>(&self, hook: F)
    where
        F: FnOnce(SubscriberId) + Send + 'static,
    {
        let mut hooks = self.hooks.lock();
        if self.is_disposed() {
            drop(hooks);
            hook(self.id);
            return;
        }
        hooks.push(Box::new(hook));
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Run every hook once. Returns false if teardown already happened.
    pub fn teardown(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }

        let hooks = std::mem::take(&mut *self.hooks.lock());
        for hook in hooks {
            hook(self.id);
        }
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .field("pending_hooks", &self.hooks.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;
    use std::sync::Arc;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn teardown_runs_hooks_once_in_order() {
        let lifecycle = Lifecycle::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            lifecycle.on_teardown(move |_| order.lock().push(n));
        }

        assert!(lifecycle.teardown());
        assert!(!lifecycle.teardown());
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert!(lifecycle.is_disposed());
    }

    #[test]
    fn hooks_receive_lifecycle_id() {
        let lifecycle = Lifecycle::new();
        let expected = lifecycle.id();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        lifecycle.on_teardown(move |id| *sink.lock() = Some(id));
        lifecycle.teardown();

        assert_eq!(*seen.lock(), Some(expected));
    }

    #[test]
    fn late_hook_runs_immediately() {
        let lifecycle = Lifecycle::new();
        lifecycle.teardown();

        let calls = Arc::new(AtomicI32::new(0));
        let counter = calls.clone();
        lifecycle.on_teardown(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
