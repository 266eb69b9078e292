//! Synchronous variants of the repository operations.
//!
//! The types here wrap their asynchronous counterparts and drive them on a
//! tokio runtime. Each wrapper either owns a runtime or shares one passed in
//! by the caller. They must not be used from inside an asynchronous context;
//! blocking a runtime worker on another runtime panics.
//!
//! ```rust,ignore
//! let roles = docrepo::blocking::Repository::new(Repository::for_entity(database, RepositoryOptions::new()))?;
//! let admin = roles.insert(Role::new("admin"))?;
//! let found = roles.find(&admin.id)?;
//! ```

use crate::entity::{Entity, EntityKey};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::filter::Filter;
use crate::repository;
use crate::store::{DocumentCollection, SortOrder};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Builds the runtime used by a blocking wrapper that owns its own.
pub fn new_runtime() -> RepoResult<Arc<Runtime>> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|err| {
            log::error!("Failed to build blocking runtime: {}", err);
            RepoError::with_cause("Failed to build blocking runtime", ErrorKind::InternalError, err)
        })
}

/// Blocking wrapper of [`repository::Query`].
pub struct Query<E> {
    inner: repository::Query<E>,
    runtime: Arc<Runtime>,
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Query {
            inner: self.inner.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<E: Entity> Query<E> {
    pub fn filter(self, filter: Filter) -> Self {
        Query {
            inner: self.inner.filter(filter),
            runtime: self.runtime,
        }
    }

    pub fn sort_by(self, field_name: &str, order: SortOrder) -> Self {
        Query {
            inner: self.inner.sort_by(field_name, order),
            runtime: self.runtime,
        }
    }

    pub fn skip(self, skip: u64) -> Self {
        Query {
            inner: self.inner.skip(skip),
            runtime: self.runtime,
        }
    }

    pub fn limit(self, limit: u64) -> Self {
        Query {
            inner: self.inner.limit(limit),
            runtime: self.runtime,
        }
    }

    pub fn fetch(&self) -> RepoResult<Vec<E>> {
        self.runtime.block_on(self.inner.fetch())
    }

    pub fn first(&self) -> RepoResult<Option<E>> {
        self.runtime.block_on(self.inner.first())
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.runtime.block_on(self.inner.count())
    }
}

/// Blocking wrapper of [`repository::QueryRepository`].
pub struct QueryRepository<E, K> {
    inner: repository::QueryRepository<E, K>,
    runtime: Arc<Runtime>,
}

impl<E, K> Clone for QueryRepository<E, K> {
    fn clone(&self) -> Self {
        QueryRepository {
            inner: self.inner.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<E: Entity, K: EntityKey> QueryRepository<E, K> {
    /// Wraps `inner` with a runtime of its own.
    pub fn new(inner: repository::QueryRepository<E, K>) -> RepoResult<Self> {
        Ok(QueryRepository::with_runtime(inner, new_runtime()?))
    }

    pub fn with_runtime(inner: repository::QueryRepository<E, K>, runtime: Arc<Runtime>) -> Self {
        QueryRepository { inner, runtime }
    }

    pub fn collection(&self) -> RepoResult<DocumentCollection> {
        self.runtime.block_on(self.inner.collection())
    }

    pub fn all(&self) -> Query<E> {
        self.query(self.inner.all())
    }

    pub fn find(&self, key: &K) -> RepoResult<Option<E>> {
        self.runtime.block_on(self.inner.find(key))
    }

    pub fn find_one(&self, filter: Filter) -> RepoResult<Option<E>> {
        self.runtime.block_on(self.inner.find_one(filter))
    }

    pub fn find_all(&self, filter: Filter) -> Query<E> {
        self.query(self.inner.find_all(filter))
    }

    pub fn list(&self, filter: Filter) -> RepoResult<Vec<E>> {
        self.runtime.block_on(self.inner.list(filter))
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.runtime.block_on(self.inner.count())
    }

    pub fn count_matching(&self, filter: Filter) -> RepoResult<u64> {
        self.runtime.block_on(self.inner.count_matching(filter))
    }

    /// The wrapped asynchronous repository.
    pub fn inner(&self) -> &repository::QueryRepository<E, K> {
        &self.inner
    }

    fn query(&self, inner: repository::Query<E>) -> Query<E> {
        Query {
            inner,
            runtime: self.runtime.clone(),
        }
    }
}

/// Blocking wrapper of [`repository::Repository`].
pub struct Repository<E, K> {
    inner: repository::Repository<E, K>,
    query: QueryRepository<E, K>,
}

impl<E, K> Clone for Repository<E, K> {
    fn clone(&self) -> Self {
        Repository {
            inner: self.inner.clone(),
            query: self.query.clone(),
        }
    }
}

impl<E, K> std::ops::Deref for Repository<E, K> {
    type Target = QueryRepository<E, K>;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

impl<E: Entity, K: EntityKey> Repository<E, K> {
    /// Wraps `inner` with a runtime of its own.
    pub fn new(inner: repository::Repository<E, K>) -> RepoResult<Self> {
        Ok(Repository::with_runtime(inner, new_runtime()?))
    }

    pub fn with_runtime(inner: repository::Repository<E, K>, runtime: Arc<Runtime>) -> Self {
        let query = QueryRepository::with_runtime(inner.query_repository(), runtime);
        Repository { inner, query }
    }

    pub fn insert(&self, entity: E) -> RepoResult<E> {
        self.block_on(self.inner.insert(entity))
    }

    pub fn insert_batch(&self, entities: Vec<E>) -> RepoResult<Vec<E>> {
        self.block_on(self.inner.insert_batch(entities))
    }

    pub fn update(&self, entity: E) -> RepoResult<E> {
        self.block_on(self.inner.update(entity))
    }

    pub fn upsert(&self, entity: E) -> RepoResult<E> {
        self.block_on(self.inner.upsert(entity))
    }

    pub fn delete(&self, key: &K) -> RepoResult<u64> {
        self.block_on(self.inner.delete(key))
    }

    pub fn delete_entity(&self, entity: &E) -> RepoResult<u64> {
        self.block_on(self.inner.delete_entity(entity))
    }

    pub fn delete_all(&self, filter: Filter) -> RepoResult<u64> {
        self.block_on(self.inner.delete_all(filter))
    }

    pub fn clear(&self) -> RepoResult<u64> {
        self.block_on(self.inner.clear())
    }

    fn block_on<T>(&self, future: impl std::future::Future<Output = RepoResult<T>>) -> RepoResult<T> {
        self.query.runtime.block_on(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::field;
    use crate::repository::{FieldKey, RepositoryOptions};
    use crate::store::memory::InMemoryDatabase;
    use crate::store::Database;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        name: String,
        value: i64,
    }

    impl Entity for Counter {}

    fn counters() -> Repository<Counter, String> {
        let database = Database::new(InMemoryDatabase::new("blocking"));
        let inner = repository::Repository::new(
            database,
            FieldKey::new("name", |counter: &Counter| counter.name.clone()),
            RepositoryOptions::new(),
        );
        Repository::new(inner).unwrap()
    }

    #[test]
    fn blocking_crud() {
        let counters = counters();
        counters
            .insert(Counter { name: "a".into(), value: 1 })
            .unwrap();
        counters
            .update(Counter { name: "a".into(), value: 2 })
            .unwrap();

        let found = counters.find(&"a".to_string()).unwrap().unwrap();
        assert_eq!(found.value, 2);
        assert_eq!(counters.count().unwrap(), 1);
        assert_eq!(counters.delete(&"a".to_string()).unwrap(), 1);
        assert_eq!(counters.delete(&"a".to_string()).unwrap(), 0);
    }

    #[test]
    fn blocking_query() {
        let counters = counters();
        counters
            .insert_batch(
                (1..=5)
                    .map(|value| Counter { name: format!("c{}", value), value })
                    .collect(),
            )
            .unwrap();

        let query = counters
            .find_all(field("value").gt(1))
            .sort_by("value", SortOrder::Descending)
            .limit(2);
        let values: Vec<i64> = query.fetch().unwrap().into_iter().map(|c| c.value).collect();
        assert_eq!(values, vec![5, 4]);
        assert_eq!(query.count().unwrap(), 2);
        assert_eq!(counters.all().count().unwrap(), 5);
    }
}
