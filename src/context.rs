//! Wiring shared by every store: recognized types and event listeners

use crate::hooks::HookRegistry;
use crate::object_type::TypeRegistry;
use std::sync::Arc;

/// Explicit context handed to [`crate::RelationshipStore`] at construction.
///
/// Cloning is cheap; clones share the same registries, so several stores
/// (e.g. one per worker thread) see the same types and hooks.
#[derive(Debug, Clone, Default)]
pub struct RelationshipContext {
    pub types: Arc<TypeRegistry>,
    pub hooks: Arc<HookRegistry>,
}

impl RelationshipContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with extra object types registered on top of the built-ins
    pub fn with_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: Arc::new(TypeRegistry::with_types(types)),
            hooks: Arc::new(HookRegistry::new()),
        }
    }
}
