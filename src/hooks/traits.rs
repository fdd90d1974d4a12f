//! Event and hook types
//!
//! # Examples
//!
//! ```
//! use objrel::hooks::{EventKind, HookRegistry};
//!
//! let hooks = HookRegistry::new();
//! hooks.on(EventKind::Added, |event| {
//!     println!("added relationship {}", event.relationship_id);
//!     Ok(())
//! });
//! ```

use crate::validate::PairArgs;
use crate::{ObjectId, RelationshipId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle events emitted by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A lookup found a stored relationship
    Existing,
    /// A new relationship row was inserted
    Added,
    /// A relationship row is about to be deleted
    PreDelete,
    /// A relationship row was deleted
    Deleted,
}

impl EventKind {
    /// Hook name under which listeners subscribe
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Existing => "existing_object_relationship",
            EventKind::Added => "added_object_relationship",
            EventKind::PreDelete => "pre_delete_object_relationship",
            EventKind::Deleted => "deleted_object_relationship",
        }
    }

    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::Existing,
            EventKind::Added,
            EventKind::PreDelete,
            EventKind::Deleted,
        ]
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EventKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown relationship event: {}", s))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload passed to every listener: the relationship id plus the call's arguments as given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEvent {
    pub kind: EventKind,
    pub relationship_id: RelationshipId,
    pub left_id: ObjectId,
    pub left_type: String,
    pub right_type: String,
    pub right_id: ObjectId,
}

impl RelationshipEvent {
    pub fn new(kind: EventKind, relationship_id: RelationshipId, args: &PairArgs) -> Self {
        Self {
            kind,
            relationship_id,
            left_id: args.left_id,
            left_type: args.left_type.clone(),
            right_type: args.right_type.clone(),
            right_id: args.right_id,
        }
    }
}

/// Listener for relationship events.
///
/// A hook that returns an error is logged by the registry; the error never
/// reaches the caller of the store operation and never undoes the mutation.
pub trait RelationshipHook: Send + Sync {
    fn handle(&self, event: &RelationshipEvent) -> Result<()>;

    /// Higher priority runs first
    fn priority(&self) -> i32 {
        0
    }

    /// Name used in log lines
    fn name(&self) -> &str {
        "anonymous_hook"
    }
}

impl<F> RelationshipHook for F
where
    F: Fn(&RelationshipEvent) -> Result<()> + Send + Sync,
{
    fn handle(&self, event: &RelationshipEvent) -> Result<()> {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_roundtrip() {
        for kind in EventKind::all() {
            let parsed: EventKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
        assert!("deleted".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_event_keeps_call_arguments() {
        let args = PairArgs {
            left_id: 2,
            left_type: "user".to_string(),
            right_type: "post".to_string(),
            right_id: 1,
        };
        let event = RelationshipEvent::new(EventKind::Existing, 9, &args);
        assert_eq!(event.relationship_id, 9);
        assert_eq!(event.left_id, 2);
        assert_eq!(event.left_type, "user");
        assert_eq!(event.right_id, 1);
    }
}
