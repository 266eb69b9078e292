use crate::entity::{EntityKey, MongoEntity};
use crate::filter::{by_id, field, Filter};
use std::marker::PhantomData;
use std::sync::Arc;

/// Extracts the key of an entity and builds the filter that addresses it.
///
/// The two operations must agree: `key_filter(&entity_key(e))` matches `e`
/// and only records with the same key. Every key-based repository operation
/// goes through this trait.
pub trait KeySelector<E, K>: Send + Sync + 'static {
    fn entity_key(&self, entity: &E) -> K;

    fn key_filter(&self, key: &K) -> Filter;
}

/// Selects entities by their `_id` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdKey;

impl<E: MongoEntity> KeySelector<E, String> for IdKey {
    fn entity_key(&self, entity: &E) -> String {
        entity.id().to_string()
    }

    fn key_filter(&self, key: &String) -> Filter {
        by_id(key.as_str())
    }
}

/// Selects entities by an arbitrary field.
///
/// # Examples
///
/// ```rust,ignore
/// // roles keyed by their unique name
/// let selector = FieldKey::new("name", |role: &Role| role.name.clone());
/// let roles = Repository::new(database, selector, RepositoryOptions::new());
/// ```
pub struct FieldKey<E, K> {
    field_name: String,
    extractor: Arc<dyn Fn(&E) -> K + Send + Sync>,
    _marker: PhantomData<fn() -> E>,
}

impl<E, K> FieldKey<E, K> {
    pub fn new<F>(field_name: &str, extractor: F) -> Self
    where
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        FieldKey {
            field_name: field_name.to_string(),
            extractor: Arc::new(extractor),
            _marker: PhantomData,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

impl<E, K> Clone for FieldKey<E, K> {
    fn clone(&self) -> Self {
        FieldKey {
            field_name: self.field_name.clone(),
            extractor: self.extractor.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: 'static, K: EntityKey> KeySelector<E, K> for FieldKey<E, K> {
    fn entity_key(&self, entity: &E) -> K {
        (self.extractor)(entity)
    }

    fn key_filter(&self, key: &K) -> Filter {
        field(&self.field_name).eq(key.to_bson())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    struct Role {
        name: String,
    }

    #[test]
    fn field_key_filter_matches_own_key() {
        let selector = FieldKey::new("name", |role: &Role| role.name.clone());
        let role = Role { name: "admin".into() };
        let filter = selector.key_filter(&selector.entity_key(&role));

        assert_eq!(selector.field_name(), "name");
        assert!(filter.matches(&doc! { "name": "admin" }).unwrap());
        assert!(!filter.matches(&doc! { "name": "user" }).unwrap());
    }

    #[test]
    fn integer_field_key() {
        let selector = FieldKey::new("number", |n: &i64| *n);
        assert_eq!(selector.key_filter(&7), field("number").eq(7i64));
    }
}
