//! Relationship - an undirected association between two typed objects
//!
//! A relationship is stored as one row with a left and a right endpoint, but
//! the two layouts below describe the same relationship:
//! - `Forward`: the caller's left endpoint is the row's left endpoint
//! - `Reverse`: the caller's left endpoint is the row's right endpoint

use crate::{ObjectId, RelationshipId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    /// Object type tag (e.g. "post", "user", a taxonomy name)
    pub object_type: String,
    /// Object identifier, opaque to objrel
    pub id: ObjectId,
}

impl Endpoint {
    pub fn new(id: ObjectId, object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.id)
    }
}

/// Row layout in which a relationship was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Forward => "forward",
            Orientation::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored relationship row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Surrogate key, assigned on creation and never reused
    pub id: RelationshipId,
    pub left: Endpoint,
    pub right: Endpoint,
}

impl Relationship {
    pub fn new(id: RelationshipId, left: Endpoint, right: Endpoint) -> Self {
        Self { id, left, right }
    }

    /// The endpoints in canonical order, independent of row layout
    pub fn canonical(&self) -> (&Endpoint, &Endpoint) {
        canonical(&self.left, &self.right)
    }

    /// Check if `(left, right)` names this relationship in either layout
    pub fn matches(&self, left: &Endpoint, right: &Endpoint) -> Option<Orientation> {
        if &self.left == left && &self.right == right {
            Some(Orientation::Forward)
        } else if &self.left == right && &self.right == left {
            Some(Orientation::Reverse)
        } else {
            None
        }
    }
}

/// Two relationships are equal when they connect the same unordered pair
impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Relationship {}

impl std::hash::Hash for Relationship {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} <-> {}", self.id, self.left, self.right)
    }
}

/// Order two endpoints by type tag, then id.
///
/// The store keeps this ordering in separate columns under one unique
/// constraint, so no tag content can make two pairs collide.
pub fn canonical<'a>(a: &'a Endpoint, b: &'a Endpoint) -> (&'a Endpoint, &'a Endpoint) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: ObjectId) -> Endpoint {
        Endpoint::new(id, "post")
    }

    fn user(id: ObjectId) -> Endpoint {
        Endpoint::new(id, "user")
    }

    #[test]
    fn test_canonical_is_symmetric() {
        assert_eq!(canonical(&post(1), &user(2)), canonical(&user(2), &post(1)));
        assert_eq!(canonical(&user(2), &post(1)), (&post(1), &user(2)));
        assert_ne!(canonical(&post(1), &user(2)), canonical(&post(2), &user(1)));
    }

    #[test]
    fn test_delimiters_in_tags_stay_distinct() {
        let a = Relationship::new(1, Endpoint::new(1, "x"), Endpoint::new(3, "y:2|z"));
        let b = Relationship::new(2, Endpoint::new(2, "x:1|y"), Endpoint::new(3, "z"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_layouts_are_equal() {
        let rel = Relationship::new(7, post(1), user(2));
        let swapped = Relationship::new(7, user(2), post(1));
        assert_eq!(rel, swapped);
    }

    #[test]
    fn test_matches_orientation() {
        let rel = Relationship::new(7, post(1), user(2));
        assert_eq!(rel.matches(&post(1), &user(2)), Some(Orientation::Forward));
        assert_eq!(rel.matches(&user(2), &post(1)), Some(Orientation::Reverse));
        assert_eq!(rel.matches(&post(1), &user(3)), None);
    }
}
