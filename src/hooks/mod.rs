//! Relationship lifecycle hooks
//!
//! The store announces four events, each carrying the relationship id and the
//! caller's original four arguments:
//! - `existing_object_relationship`: a lookup found a stored relationship
//! - `added_object_relationship`: a new row was inserted
//! - `pre_delete_object_relationship`: a row is about to be removed
//! - `deleted_object_relationship`: a row was removed
//!
//! Listeners are registered per event on a [`HookRegistry`] and run
//! synchronously after the storage mutation has committed.

pub mod registry;
pub mod traits;

pub use registry::HookRegistry;
pub use traits::{EventKind, RelationshipEvent, RelationshipHook};
