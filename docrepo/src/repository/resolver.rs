use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::index::IndexDefinition;
use crate::repository::options::{IndexHook, NamingPolicy};
use crate::store::{Database, DocumentCollection};
use tokio::sync::OnceCell;

/// Resolves the collection of a repository on first use and caches it.
///
/// States move from unresolved to resolved exactly once. Concurrent callers
/// wait on the same resolution. A failed resolution leaves the resolver
/// unresolved, so the next operation tries again.
pub(crate) struct CollectionResolver {
    database: Database,
    entity_name: String,
    naming_policy: Option<NamingPolicy>,
    indexes: Vec<IndexDefinition>,
    index_hook: Option<IndexHook>,
    collection: OnceCell<DocumentCollection>,
}

impl CollectionResolver {
    pub(crate) fn new(
        database: Database,
        entity_name: String,
        naming_policy: Option<NamingPolicy>,
        indexes: Vec<IndexDefinition>,
        index_hook: Option<IndexHook>,
    ) -> Self {
        CollectionResolver {
            database,
            entity_name,
            naming_policy,
            indexes,
            index_hook,
            collection: OnceCell::new(),
        }
    }

    pub(crate) fn database(&self) -> &Database {
        &self.database
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.collection.initialized()
    }

    pub(crate) fn collection_name(&self) -> String {
        match &self.naming_policy {
            Some(policy) => policy(&self.entity_name),
            None => self.entity_name.clone(),
        }
    }

    pub(crate) async fn get(&self) -> RepoResult<DocumentCollection> {
        self.collection
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    async fn resolve(&self) -> RepoResult<DocumentCollection> {
        let name = self.collection_name();
        if name.is_empty() {
            log::error!("Collection name for entity {} resolved to an empty string", self.entity_name);
            return Err(RepoError::new(
                &format!("Collection name for entity {} cannot be empty", self.entity_name),
                ErrorKind::InvalidArgument,
            ));
        }

        let collection = self.database.collection(&name).await?;
        for index in &self.indexes {
            collection.create_index(index).await?;
        }
        if let Some(hook) = &self.index_hook {
            hook(collection.clone()).await?;
        }

        log::debug!(
            "Resolved collection {} of database {} for entity {}",
            name,
            self.database.name(),
            self.entity_name
        );
        Ok(collection)
    }
}
