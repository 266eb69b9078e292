use crate::errors::RepoResult;
use crate::filter::Filter;
use crate::index::IndexDefinition;
use crate::store::FindOptions;
use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::ops::Deref;
use std::sync::Arc;

/// A stream of documents produced by a find operation.
///
/// The stream owns everything it needs, so it can outlive the call that
/// created it. Each item is either a document or the error that ended the scan.
pub type DocumentStream = BoxStream<'static, RepoResult<Document>>;

/// Outcome of a replace operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceResult {
    /// Number of documents that matched the filter (0 or 1).
    pub matched_count: u64,
    /// Number of documents actually changed.
    pub modified_count: u64,
    /// `_id` of the document inserted by an upsert miss.
    pub upserted_id: Option<Bson>,
}

/// Low-level interface to one collection of a document store.
///
/// # Purpose
/// Defines the contract every backend implements for a single named
/// collection. Repositories translate their typed operations into calls on
/// this trait and never look at the backend behind it.
///
/// # Key Responsibilities
/// - **Writes**: insert one or many documents, replace one, delete one or many
/// - **Reads**: filtered, sorted and paged scans, exact counts
/// - **Indexes**: ensure secondary indexes exist
///
/// # Error Contract
/// A key collision on insert, replace or upsert must be reported as
/// [`ErrorKind::DuplicateKey`](crate::errors::ErrorKind::DuplicateKey).
/// Store-reported timeouts map to `Timeout`; everything else to `StoreError`
/// with the backend error kept as the cause.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; one handle is shared by every clone
/// of a repository.
#[async_trait]
pub trait DocumentCollectionProvider: Send + Sync {
    /// Name of the collection in its database.
    fn name(&self) -> String;

    /// Inserts a single document.
    ///
    /// A document without `_id` gets a generated ObjectId.
    ///
    /// # Returns
    /// * `Ok(Bson)` with the `_id` of the stored document
    /// * `Err(RepoError)` with kind `DuplicateKey` if the `_id` or a unique
    ///   index value is already taken
    async fn insert_one(&self, document: Document) -> RepoResult<Bson>;

    /// Inserts documents in order, stopping at the first failure.
    ///
    /// Not atomic: documents before the failing one stay persisted.
    ///
    /// # Returns
    /// * `Ok(Vec<Bson>)` with the `_id` of every stored document
    /// * `Err(RepoError)` for the first rejected document
    async fn insert_many(&self, documents: Vec<Document>) -> RepoResult<Vec<Bson>>;

    /// Replaces the whole content of the first document matching `filter`.
    ///
    /// The stored `_id` is kept. When nothing matches and `upsert` is `true`
    /// the replacement is inserted instead.
    async fn replace_one(
        &self,
        filter: &Filter,
        replacement: Document,
        upsert: bool,
    ) -> RepoResult<ReplaceResult>;

    /// Deletes the first document matching `filter` and returns how many were
    /// removed (0 or 1).
    async fn delete_one(&self, filter: &Filter) -> RepoResult<u64>;

    /// Deletes every document matching `filter` and returns the exact count.
    async fn delete_many(&self, filter: &Filter) -> RepoResult<u64>;

    /// Scans documents matching `filter`, applying sort, then skip, then limit.
    ///
    /// Without a sort the store's natural order is used.
    async fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<DocumentStream>;

    /// Returns the first document matching `filter` in natural order.
    async fn find_one(&self, filter: &Filter) -> RepoResult<Option<Document>> {
        let mut stream = self.find(filter, &FindOptions::new().limit(1)).await?;
        stream.next().await.transpose()
    }

    /// Counts documents matching `filter`. The count is exact.
    async fn count(&self, filter: &Filter) -> RepoResult<u64>;

    /// Ensures an index exists. Creating an index that already exists is a no-op.
    async fn create_index(&self, index: &IndexDefinition) -> RepoResult<()>;
}

/// A handle to one collection of a document store.
///
/// `DocumentCollection` wraps a [`DocumentCollectionProvider`] behind an `Arc`
/// and dereferences to it, so every provider method is available on the
/// handle. Clones share the same underlying collection.
#[derive(Clone)]
pub struct DocumentCollection {
    inner: Arc<dyn DocumentCollectionProvider>,
}

impl DocumentCollection {
    /// Creates a new `DocumentCollection` from a provider implementation.
    pub fn new<T: DocumentCollectionProvider + 'static>(inner: T) -> Self {
        DocumentCollection {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for DocumentCollection {
    type Target = Arc<dyn DocumentCollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for DocumentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCollection")
            .field("name", &self.inner.name())
            .finish()
    }
}
