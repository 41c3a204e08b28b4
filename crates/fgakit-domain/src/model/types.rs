//! Core relationship types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Returns the type portion of an identifier (the substring before the first `:`).
///
/// Identifiers without a `:` are returned whole, so `type_of("user")` is `"user"`.
/// Userset references keep only their type: `type_of("group:eng#member")` is `"group"`.
pub fn type_of(value: &str) -> &str {
    match value.split_once(':') {
        Some((prefix, _)) => prefix,
        None => value,
    }
}

/// A tuple representing a relationship (user, relation, object).
///
/// Duplicate tuples are tolerated by the stores in this crate; equality is
/// plain field equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tuple {
    /// The user (subject) of the relationship, `type:id` or `type:id#relation`.
    pub user: String,
    /// The relation between user and object.
    pub relation: String,
    /// The object of the relationship, `type:id`.
    pub object: String,
}

impl Tuple {
    /// Creates a new Tuple.
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    /// Returns the `"user:relation:object"` lookup key.
    ///
    /// The same key format is used for mock overrides and batch check results.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.user, self.relation, self.object)
    }

    /// Returns the type of the user (e.g., "user" for "user:alice").
    pub fn user_type(&self) -> &str {
        type_of(&self.user)
    }

    /// Returns the type of the object (e.g., "document" for "document:readme").
    pub fn object_type(&self) -> &str {
        type_of(&self.object)
    }

    /// Returns true if the tuple matches the given fields exactly.
    pub fn matches(&self, user: &str, relation: &str, object: &str) -> bool {
        self.user == user && self.relation == relation && self.object == object
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.user)
    }
}

/// Audit entry recorded every time the fake engine answers a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub user: String,
    pub relation: String,
    pub object: String,
    pub allowed: bool,
}

impl CheckRecord {
    /// Returns true if this record is for the given triple.
    pub fn is_for(&self, user: &str, relation: &str, object: &str) -> bool {
        self.user == user && self.relation == relation && self.object == object
    }
}

/// Audit entry recorded for every batch write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    pub writes: Vec<Tuple>,
    pub deletes: Vec<Tuple>,
}
