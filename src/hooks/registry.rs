//! Hook registry for relationship lifecycle events
//!
//! The registry handles:
//! - Registration per event kind
//! - Priority-based ordering (higher first, ties in registration order)
//! - Safe failure handling (a failed hook is logged and the rest still run)

use super::traits::{EventKind, RelationshipEvent, RelationshipHook};
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

struct HookEntry {
    hook: Arc<dyn RelationshipHook>,
    priority: i32,
}

/// Per-event listener lists, shared by every store built from one context.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<EventKind, Vec<HookEntry>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for one event kind
    pub fn register(&self, kind: EventKind, hook: Arc<dyn RelationshipHook>) {
        let priority = hook.priority();
        let name = hook.name().to_string();
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        let entries = hooks.entry(kind).or_default();

        entries.push(HookEntry { hook, priority });
        // Stable sort keeps registration order among equal priorities
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        debug!("Hook registered: {} on {} (priority: {})", name, kind, priority);
    }

    /// Register a closure for one event kind
    pub fn on<F>(&self, kind: EventKind, hook: F)
    where
        F: Fn(&RelationshipEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(hook));
    }

    /// Number of hooks listening for an event kind
    pub fn count(&self, kind: EventKind) -> usize {
        self.hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Run every hook registered for the event's kind.
    ///
    /// Returns the number of hooks that failed.
    pub fn dispatch(&self, event: &RelationshipEvent) -> usize {
        // Snapshot so a hook may register further hooks without deadlocking
        let hooks: Vec<Arc<dyn RelationshipHook>> = self
            .hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&event.kind)
            .map(|entries| entries.iter().map(|e| e.hook.clone()).collect())
            .unwrap_or_default();

        let mut failures = 0;
        for hook in hooks {
            match hook.handle(event) {
                Ok(()) => {
                    debug!(
                        "Hook '{}' handled {} for relationship {}",
                        hook.name(),
                        event.kind,
                        event.relationship_id
                    );
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Hook '{}' failed on {} for relationship {}: {}",
                        hook.name(),
                        event.kind,
                        event.relationship_id,
                        e
                    );
                }
            }
        }
        failures
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("HookRegistry");
        for kind in EventKind::all() {
            debug.field(kind.as_str(), &self.count(*kind));
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    fn event(kind: EventKind) -> RelationshipEvent {
        RelationshipEvent {
            kind,
            relationship_id: 1,
            left_id: 1,
            left_type: "post".to_string(),
            right_type: "user".to_string(),
            right_id: 2,
        }
    }

    struct Named {
        name: &'static str,
        priority: i32,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RelationshipHook for Named {
        fn handle(&self, _event: &RelationshipEvent) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            Ok(())
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn test_dispatch_only_matching_kind() {
        let registry = HookRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.on(EventKind::Deleted, move |e| {
            sink.lock().unwrap().push(e.kind);
            Ok(())
        });

        registry.dispatch(&event(EventKind::Added));
        registry.dispatch(&event(EventKind::Deleted));

        assert_eq!(*seen.lock().unwrap(), vec![EventKind::Deleted]);
        assert_eq!(registry.count(EventKind::Deleted), 1);
        assert_eq!(registry.count(EventKind::Added), 0);
    }

    #[test]
    fn test_priority_order() {
        let registry = HookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (name, priority) in [("low", 0), ("high", 10), ("also_low", 0)] {
            registry.register(
                EventKind::Added,
                Arc::new(Named { name, priority, log: log.clone() }),
            );
        }

        registry.dispatch(&event(EventKind::Added));
        assert_eq!(*log.lock().unwrap(), vec!["high", "low", "also_low"]);
    }

    #[test]
    fn test_failing_hook_does_not_stop_others() {
        let registry = HookRegistry::new();
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();

        registry.on(EventKind::Added, |_| Err(Error::Meta("boom".to_string())));
        registry.on(EventKind::Added, move |_| {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        let failures = registry.dispatch(&event(EventKind::Added));
        assert_eq!(failures, 1);
        assert!(*ran.lock().unwrap());
    }
}
