use super::InMemoryCollection;
use crate::errors::RepoResult;
use crate::store::{DatabaseProvider, DocumentCollection};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DATABASE_NAME: &str = "docrepo";

/// In-memory implementation of a document database.
///
/// # Purpose
/// `InMemoryDatabase` is a complete backend for tests and embedded use. It
/// enforces the same key and index rules a document server does, so code
/// tested against it behaves the same against a real server.
///
/// # Characteristics
/// - **Thread-Safe**: collections live in a concurrent map and clones share them
/// - **Lazy collections**: a collection appears in
///   [`list_collection_names`](DatabaseProvider::list_collection_names) after
///   its first write or index
/// - **No Persistence**: all data is lost when the last clone is dropped
///
/// # Usage
/// ```text
/// let database = Database::new(InMemoryDatabase::new("app"));
/// let roles = database.collection("Role").await?;
/// ```
#[derive(Clone)]
pub struct InMemoryDatabase {
    inner: Arc<InMemoryDatabaseInner>,
}

struct InMemoryDatabaseInner {
    name: String,
    latency: Option<Duration>,
    collections: DashMap<String, InMemoryCollection>,
}

impl InMemoryDatabase {
    /// Creates an empty in-memory database with the given name.
    pub fn new(name: &str) -> InMemoryDatabase {
        InMemoryDatabase::builder().name(name).build()
    }

    /// Returns a builder for configuring an in-memory database.
    pub fn builder() -> InMemoryDatabaseBuilder {
        InMemoryDatabaseBuilder::default()
    }

    fn get_or_create(&self, name: &str) -> InMemoryCollection {
        self.inner
            .collections
            .entry(name.to_string())
            .or_insert_with(|| InMemoryCollection::new(name, self.inner.latency))
            .clone()
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        InMemoryDatabase::new(DEFAULT_DATABASE_NAME)
    }
}

#[async_trait]
impl DatabaseProvider for InMemoryDatabase {
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    async fn collection(&self, name: &str) -> RepoResult<DocumentCollection> {
        Ok(DocumentCollection::new(self.get_or_create(name)))
    }

    async fn list_collection_names(&self) -> RepoResult<Vec<String>> {
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .filter(|entry| entry.value().is_materialized())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> RepoResult<()> {
        if self.inner.collections.remove(name).is_some() {
            log::debug!("Dropped in-memory collection {}", name);
        }
        Ok(())
    }
}

/// Builder for [`InMemoryDatabase`].
///
/// # Examples
///
/// ```rust,ignore
/// let database = InMemoryDatabase::builder()
///     .name("test")
///     .latency(Duration::from_millis(50))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabaseBuilder {
    name: Option<String>,
    latency: Option<Duration>,
}

impl InMemoryDatabaseBuilder {
    /// Sets the database name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Delays every collection operation by `latency` before it touches the
    /// data, simulating a remote store.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn build(self) -> InMemoryDatabase {
        InMemoryDatabase {
            inner: Arc::new(InMemoryDatabaseInner {
                name: self.name.unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
                latency: self.latency,
                collections: DashMap::new(),
            }),
        }
    }
}
