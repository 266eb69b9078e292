use crate::entity::{Entity, EntityKey, MongoEntity};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::filter::{all, Filter};
use crate::repository::key::{IdKey, KeySelector};
use crate::repository::options::RepositoryOptions;
use crate::repository::resolver::CollectionResolver;
use crate::repository::Query;
use crate::store::{Database, DocumentCollection};
use std::marker::PhantomData;
use std::sync::Arc;

/// Read-only access to the entities of one collection.
///
/// # Purpose
/// `QueryRepository` binds an entity type `E` and a key type `K` to one
/// collection of a [`Database`]. It offers key lookups, predicate lookups,
/// lazy queries and exact counts. All filtering, sorting and paging runs in
/// the store.
///
/// # Collection Resolution
/// The collection is resolved on the first operation, not at construction:
/// the name comes from the naming policy (default: `E::entity_name()`), the
/// handle from the database, and the declared indexes are ensured. The
/// resolved handle is cached for the lifetime of the repository and shared
/// by its clones. If resolution fails the error is returned to the caller
/// and the next operation retries.
///
/// # Lazy and Eager Reads
/// - [`all`](QueryRepository::all) and [`find_all`](QueryRepository::find_all)
///   return a [`Query`] that can be refined before it runs.
/// - [`find`](QueryRepository::find), [`find_one`](QueryRepository::find_one)
///   and [`list`](QueryRepository::list) run immediately.
///
/// # Examples
///
/// ```rust,ignore
/// let roles: EntityQueryRepository<Role> = QueryRepository::for_entity(database, RepositoryOptions::new());
///
/// let admin = roles.find(&"admin".to_string()).await?;
/// let seniors = roles.list(field("level").gte(3)).await?;
/// let total = roles.count().await?;
/// ```
pub struct QueryRepository<E, K> {
    resolver: Arc<CollectionResolver>,
    key_selector: Arc<dyn KeySelector<E, K>>,
    _marker: PhantomData<fn() -> E>,
}

impl<E, K> Clone for QueryRepository<E, K> {
    fn clone(&self) -> Self {
        QueryRepository {
            resolver: self.resolver.clone(),
            key_selector: self.key_selector.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity, K: EntityKey> QueryRepository<E, K> {
    /// Creates a query repository keyed by `key_selector`.
    ///
    /// # Arguments
    /// * `database` - The database holding the collection
    /// * `key_selector` - Maps entities to keys and keys to filters
    /// * `options` - Naming policy and indexes; hooks are ignored for reads
    pub fn new<S>(database: Database, key_selector: S, options: RepositoryOptions<E>) -> Self
    where
        S: KeySelector<E, K>,
    {
        let resolver = CollectionResolver::new(
            database,
            E::entity_name(),
            options.naming_policy,
            E::entity_indexes().into_iter().chain(options.indexes).collect(),
            options.index_hook,
        );
        QueryRepository {
            resolver: Arc::new(resolver),
            key_selector: Arc::new(key_selector),
            _marker: PhantomData,
        }
    }

    /// Returns the collection handle, resolving it on first use.
    pub async fn collection(&self) -> RepoResult<DocumentCollection> {
        self.resolver.get().await
    }

    /// Name of the bound collection, as given by the naming policy.
    pub fn collection_name(&self) -> String {
        self.resolver.collection_name()
    }

    pub fn database(&self) -> &Database {
        self.resolver.database()
    }

    /// Returns `true` once the collection has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolver.is_resolved()
    }

    /// Returns a lazy query over every entity of the collection.
    pub fn all(&self) -> Query<E> {
        Query::new(self.resolver.clone(), all())
    }

    /// Finds the entity with the given key.
    ///
    /// # Returns
    /// * `Ok(Some(entity))` if a record with the key exists
    /// * `Ok(None)` if it does not
    /// * `Err(RepoError)` with kind `InvalidArgument` if the key is unset,
    ///   before any store call
    pub async fn find(&self, key: &K) -> RepoResult<Option<E>> {
        let filter = self.checked_key_filter(key)?;
        self.find_one(filter).await
    }

    /// Finds the first entity matching `filter`, in the store's natural order.
    pub async fn find_one(&self, filter: Filter) -> RepoResult<Option<E>> {
        let collection = self.collection().await?;
        match collection.find_one(&filter).await? {
            Some(document) => Ok(Some(bson::from_document(document)?)),
            None => Ok(None),
        }
    }

    /// Returns a lazy query over the entities matching `filter`.
    pub fn find_all(&self, filter: Filter) -> Query<E> {
        Query::new(self.resolver.clone(), filter)
    }

    /// Runs `filter` and collects every matching entity.
    pub async fn list(&self, filter: Filter) -> RepoResult<Vec<E>> {
        self.find_all(filter).fetch().await
    }

    /// Counts every entity of the collection.
    pub async fn count(&self) -> RepoResult<u64> {
        self.count_matching(all()).await
    }

    /// Counts the entities matching `filter`. The count is exact.
    pub async fn count_matching(&self, filter: Filter) -> RepoResult<u64> {
        let collection = self.collection().await?;
        collection.count(&filter).await
    }

    /// Extracts the key of `entity`.
    pub fn key_of(&self, entity: &E) -> K {
        self.key_selector.entity_key(entity)
    }

    /// Builds the filter addressing `key`.
    pub fn key_filter(&self, key: &K) -> Filter {
        self.key_selector.key_filter(key)
    }

    pub(crate) fn checked_key_filter(&self, key: &K) -> RepoResult<Filter> {
        if key.is_unset() {
            log::error!(
                "Key {:?} is not set, cannot address an entity of {}",
                key,
                self.collection_name()
            );
            return Err(RepoError::new(
                &format!("Key of {} must be set", self.collection_name()),
                ErrorKind::InvalidArgument,
            ));
        }
        Ok(self.key_selector.key_filter(key))
    }
}

impl<E: MongoEntity> QueryRepository<E, String> {
    /// Creates a query repository over a [`MongoEntity`], keyed by `_id`.
    pub fn for_entity(database: Database, options: RepositoryOptions<E>) -> Self {
        QueryRepository::new(database, IdKey, options)
    }
}

/// Query repository over a [`MongoEntity`], keyed by its string `_id`.
pub type EntityQueryRepository<E> = QueryRepository<E, String>;
