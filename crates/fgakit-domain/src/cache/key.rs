//! Cache key and tag derivation.
//!
//! Keys are order-sensitive string joins so that swapping relation and object
//! never collides. Tags are the secondary index scopes used for invalidation.

use std::fmt;

use crate::model::type_of;

/// Key for a cached permission decision: `{prefix}:perm:{user}:{relation}:{object}`.
pub fn permission_key(prefix: &str, user: &str, relation: &str, object: &str) -> String {
    format!("{prefix}:perm:{user}:{relation}:{object}")
}

/// Key for a cached list-objects result: `{prefix}:list:{user}:{relation}:{object_type}`.
pub fn list_objects_key(prefix: &str, user: &str, relation: &str, object_type: &str) -> String {
    format!("{prefix}:list:{user}:{relation}:{object_type}")
}

/// An invalidation scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// Every entry mentioning a user, `user:{id}`.
    User(String),
    /// Every entry mentioning an object, `object:{id}`.
    Object(String),
    /// Every entry for a relation, `relation:{name}`.
    Relation(String),
    /// Every entry whose user is of a type, `user_type:{type}`.
    UserType(String),
    /// Every entry whose object is of a type, `object_type:{type}`.
    ObjectType(String),
}

impl Tag {
    pub fn user(user: impl Into<String>) -> Self {
        Self::User(user.into())
    }

    pub fn object(object: impl Into<String>) -> Self {
        Self::Object(object.into())
    }

    pub fn relation(relation: impl Into<String>) -> Self {
        Self::Relation(relation.into())
    }

    pub fn user_type(user_type: impl Into<String>) -> Self {
        Self::UserType(user_type.into())
    }

    pub fn object_type(object_type: impl Into<String>) -> Self {
        Self::ObjectType(object_type.into())
    }

    /// The five tags a permission decision for `(user, relation, object)` belongs to.
    pub fn for_permission(user: &str, relation: &str, object: &str) -> [Tag; 5] {
        [
            Tag::user(user),
            Tag::object(object),
            Tag::relation(relation),
            Tag::user_type(type_of(user)),
            Tag::object_type(type_of(object)),
        ]
    }

    /// The tags a list-objects result belongs to: the query scope plus one
    /// `object:` tag per returned object.
    pub fn for_list_objects(
        user: &str,
        relation: &str,
        object_type: &str,
        objects: &[String],
    ) -> Vec<Tag> {
        let mut tags = vec![
            Tag::user(user),
            Tag::relation(relation),
            Tag::user_type(type_of(user)),
            Tag::object_type(object_type),
        ];
        tags.extend(objects.iter().map(Tag::object));
        tags
    }

    /// The tags a write or delete of `(user, relation, object)` must invalidate.
    pub fn for_mutation(user: &str, relation: &str, object: &str) -> [Tag; 3] {
        [Tag::user(user), Tag::object(object), Tag::relation(relation)]
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::User(v) => write!(f, "user:{v}"),
            Tag::Object(v) => write!(f, "object:{v}"),
            Tag::Relation(v) => write!(f, "relation:{v}"),
            Tag::UserType(v) => write!(f, "user_type:{v}"),
            Tag::ObjectType(v) => write!(f, "object_type:{v}"),
        }
    }
}
