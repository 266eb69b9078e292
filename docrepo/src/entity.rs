//! The entity contract.
//!
//! Every record type a repository stores implements [`Entity`]. Types that
//! carry audit timestamps also implement [`Audited`], and types keyed by a
//! string `_id` implement [`MongoEntity`]. The `docrepo_derive` crate derives
//! all three.

use crate::index::IndexDefinition;
use bson::oid::ObjectId;
use bson::Bson;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A record stored as one document in a collection.
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Role {
///     #[serde(rename = "_id")]
///     name: String,
///     level: i32,
/// }
///
/// impl Entity for Role {}
/// assert_eq!(Role::entity_name(), "Role");
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Default collection name for the entity.
    ///
    /// The default implementation returns the bare type name.
    fn entity_name() -> String {
        let full_name = std::any::type_name::<Self>();
        let without_generics = full_name.split('<').next().unwrap_or(full_name);
        without_generics
            .rsplit("::")
            .next()
            .unwrap_or(without_generics)
            .to_string()
    }

    /// Indexes ensured on the collection when a repository first resolves it.
    fn entity_indexes() -> Vec<IndexDefinition> {
        Vec::new()
    }
}

/// An entity carrying creation and update timestamps.
///
/// `created` is set once, at first persistence; `updated` on every
/// persistence, so `created <= updated` always holds for stored records. Both
/// read as [`timestamp::zero`](crate::timestamp::zero) until set.
pub trait Audited: Entity {
    fn created(&self) -> DateTime<Utc>;

    fn set_created(&mut self, created: DateTime<Utc>);

    fn updated(&self) -> DateTime<Utc>;

    fn set_updated(&mut self, updated: DateTime<Utc>);
}

/// An audited entity identified by a string `_id`.
///
/// The id field must serialize under the name `_id`. An empty id means the
/// entity has not been persisted yet; entity repositories assign a fresh
/// ObjectId hex string on insert.
pub trait MongoEntity: Audited {
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// A key type usable to look entities up.
///
/// A key converts to the BSON value stored in the document. A key that
/// [`is_unset`](EntityKey::is_unset) cannot address a record, and operations
/// taking one fail with `InvalidArgument` before reaching the store.
pub trait EntityKey: Clone + Debug + Send + Sync + 'static {
    fn to_bson(&self) -> Bson;

    fn is_unset(&self) -> bool {
        false
    }
}

impl EntityKey for String {
    fn to_bson(&self) -> Bson {
        Bson::String(self.clone())
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl EntityKey for i32 {
    fn to_bson(&self) -> Bson {
        Bson::Int32(*self)
    }
}

impl EntityKey for i64 {
    fn to_bson(&self) -> Bson {
        Bson::Int64(*self)
    }
}

impl EntityKey for ObjectId {
    fn to_bson(&self) -> Bson {
        Bson::ObjectId(*self)
    }
}

impl<T: EntityKey> EntityKey for Option<T> {
    fn to_bson(&self) -> Bson {
        match self {
            Some(key) => key.to_bson(),
            None => Bson::Null,
        }
    }

    fn is_unset(&self) -> bool {
        self.as_ref().map_or(true, |key| key.is_unset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Plain {
        name: String,
    }

    impl Entity for Plain {}

    #[derive(Serialize, Deserialize)]
    struct Wrapper<T> {
        value: T,
    }

    impl<T: Serialize + DeserializeOwned + Send + Sync + 'static> Entity for Wrapper<T> {}

    #[test]
    fn default_entity_name_is_type_name() {
        assert_eq!(Plain::entity_name(), "Plain");
        assert_eq!(Wrapper::<i32>::entity_name(), "Wrapper");
        assert!(Plain::entity_indexes().is_empty());
    }

    #[test]
    fn string_keys_are_unset_when_empty() {
        assert!(String::new().is_unset());
        assert!(!"k1".to_string().is_unset());
        assert_eq!("k1".to_string().to_bson(), Bson::String("k1".into()));
    }

    #[test]
    fn optional_keys() {
        let none: Option<i64> = None;
        assert!(none.is_unset());
        assert!(!Some(5i64).is_unset());
        assert_eq!(Some(5i64).to_bson(), Bson::Int64(5));
        assert!(Some(String::new()).is_unset());
    }
}
