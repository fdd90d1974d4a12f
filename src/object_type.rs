//! Recognized object types
//!
//! Every relationship endpoint carries a type tag drawn from this registry.
//! The set is seeded with the built-in tags:
//! - `comment`
//! - `post`
//! - `page`
//! - `taxonomy`
//! - `user`
//!
//! External collaborators extend it with taxonomy-like names through
//! [`TypeRegistry::register`], or reshape it through filters.

use std::sync::{Arc, RwLock};

/// Built-in object type tags
pub const BUILTIN_TYPES: &[&str] = &["comment", "post", "page", "taxonomy", "user"];

type TypeFilter = Arc<dyn Fn(&mut Vec<String>) + Send + Sync>;

/// Extensible set of object type tags accepted by validation.
#[derive(Default)]
pub struct TypeRegistry {
    registered: RwLock<Vec<String>>,
    filters: RwLock<Vec<TypeFilter>>,
}

impl TypeRegistry {
    /// Create a registry holding only the built-in tags
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with additional tags already registered
    pub fn with_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for tag in types {
            registry.register(tag);
        }
        registry
    }

    /// Register a type tag. Returns false if the tag was already known.
    pub fn register(&self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if BUILTIN_TYPES.contains(&tag.as_str()) {
            return false;
        }

        let mut registered = self.registered.write().unwrap_or_else(|e| e.into_inner());
        if registered.contains(&tag) {
            return false;
        }
        tracing::debug!("Registered object type: {}", tag);
        registered.push(tag);
        true
    }

    /// Add a filter run over the list on every read, in registration order
    pub fn add_filter<F>(&self, filter: F)
    where
        F: Fn(&mut Vec<String>) + Send + Sync + 'static,
    {
        self.filters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(filter));
    }

    /// The current recognized set: built-ins, then registrations, then filter edits
    pub fn recognized(&self) -> Vec<String> {
        let mut types: Vec<String> = BUILTIN_TYPES.iter().map(|t| t.to_string()).collect();
        types.extend(
            self.registered
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .cloned(),
        );

        // Snapshot so a filter may call back into the registry
        let filters: Vec<TypeFilter> = self
            .filters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for filter in &filters {
            filter(&mut types);
        }

        let mut seen = std::collections::HashSet::new();
        types.retain(|t| seen.insert(t.clone()));
        types
    }

    /// Check if a tag is currently recognized
    pub fn contains(&self, tag: &str) -> bool {
        self.recognized().iter().any(|t| t == tag)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("recognized", &self.recognized())
            .finish()
    }
}
