use crate::errors::RepoResult;
use crate::index::IndexDefinition;
use crate::store::DocumentCollection;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// A lifecycle hook run on an entity right before it is written.
pub type Hook<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// Maps an entity name to the collection name a repository binds to.
pub type NamingPolicy = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Runs once against the freshly resolved collection, after the declared
/// indexes are ensured.
pub type IndexHook = Arc<dyn Fn(DocumentCollection) -> BoxFuture<'static, RepoResult<()>> + Send + Sync>;

/// Customization points of a repository.
///
/// Instead of subclassing a base repository, callers inject behaviour:
///
/// - a naming policy (default: the entity name),
/// - extra indexes and an index hook, both applied during collection resolution,
/// - `before_insert` / `before_update` hooks, run after the repository's own
///   audit hooks, in registration order.
///
/// # Examples
///
/// ```rust,ignore
/// let options = RepositoryOptions::<User>::new()
///     .collection_name("users")
///     .index(IndexDefinition::unique(vec!["email"]))
///     .before_insert(|user| user.email = user.email.to_lowercase())
///     .before_update(|user| user.email = user.email.to_lowercase());
///
/// let users = Repository::for_entity(database, options);
/// ```
pub struct RepositoryOptions<E> {
    pub(crate) naming_policy: Option<NamingPolicy>,
    pub(crate) indexes: Vec<IndexDefinition>,
    pub(crate) index_hook: Option<IndexHook>,
    pub(crate) before_insert: Vec<Hook<E>>,
    pub(crate) before_update: Vec<Hook<E>>,
}

impl<E> RepositoryOptions<E> {
    pub fn new() -> Self {
        RepositoryOptions {
            naming_policy: None,
            indexes: Vec::new(),
            index_hook: None,
            before_insert: Vec::new(),
            before_update: Vec::new(),
        }
    }

    /// Binds the repository to a fixed collection name.
    pub fn collection_name(self, name: &str) -> Self {
        let name = name.to_string();
        self.naming_policy(move |_| name.clone())
    }

    /// Derives the collection name from the entity name.
    pub fn naming_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.naming_policy = Some(Arc::new(policy));
        self
    }

    /// Adds an index to ensure on top of the entity's declared indexes.
    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Sets a hook run once with the resolved collection.
    pub fn index_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(DocumentCollection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RepoResult<()>> + Send + 'static,
    {
        self.index_hook = Some(Arc::new(move |collection| hook(collection).boxed()));
        self
    }

    /// Adds a hook run on every entity before insert.
    pub fn before_insert<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.before_insert.push(Arc::new(hook));
        self
    }

    /// Adds a hook run on every entity before update and upsert.
    pub fn before_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.before_update.push(Arc::new(hook));
        self
    }
}

impl<E> Default for RepositoryOptions<E> {
    fn default() -> Self {
        RepositoryOptions::new()
    }
}

impl<E> Clone for RepositoryOptions<E> {
    fn clone(&self) -> Self {
        RepositoryOptions {
            naming_policy: self.naming_policy.clone(),
            indexes: self.indexes.clone(),
            index_hook: self.index_hook.clone(),
            before_insert: self.before_insert.clone(),
            before_update: self.before_update.clone(),
        }
    }
}
