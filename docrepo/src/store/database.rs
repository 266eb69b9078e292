use crate::errors::RepoResult;
use crate::store::DocumentCollection;
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

/// Low-level interface to a document database.
///
/// A database hands out collection handles by name. Obtaining a handle for a
/// collection that does not exist yet must succeed; the collection comes into
/// existence with its first write, like on a document server.
///
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// Name of the database.
    fn name(&self) -> String;

    /// Returns a handle to the named collection.
    ///
    /// # Returns
    /// * `Ok(DocumentCollection)` bound to `name`
    /// * `Err(RepoError)` if the store cannot provide the handle
    async fn collection(&self, name: &str) -> RepoResult<DocumentCollection>;

    /// Lists the names of the collections currently in the database.
    async fn list_collection_names(&self) -> RepoResult<Vec<String>>;

    /// Drops the named collection with all its documents and indexes.
    async fn drop_collection(&self, name: &str) -> RepoResult<()>;
}

/// A handle to a document database.
///
/// Wraps a [`DatabaseProvider`] behind an `Arc`; cloning is cheap and every
/// clone talks to the same backend.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::store::memory::InMemoryDatabase;
/// use docrepo::store::Database;
///
/// let database = Database::new(InMemoryDatabase::new("app"));
/// let roles = database.collection("Role").await?;
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<dyn DatabaseProvider>,
}

impl Database {
    /// Creates a new `Database` from a provider implementation.
    pub fn new<T: DatabaseProvider + 'static>(inner: T) -> Self {
        Database {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Database {
    type Target = Arc<dyn DatabaseProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name())
            .finish()
    }
}
