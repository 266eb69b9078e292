use crate::error::map_error;
use async_trait::async_trait;
use bson::{Bson, Document};
use docrepo::errors::{ErrorKind, RepoError, RepoResult};
use docrepo::filter::Filter;
use docrepo::index::IndexDefinition;
use docrepo::store::{DocumentCollectionProvider, DocumentStream, FindOptions, ReplaceResult};
use futures::{StreamExt, TryStreamExt};
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};

/// A MongoDB collection seen through the docrepo store abstraction.
///
/// Filters and find options are translated to their query-language form and
/// executed by the server; nothing is evaluated client side.
#[derive(Clone)]
pub struct MongoCollection {
    collection: Collection<Document>,
}

impl MongoCollection {
    pub fn new(collection: Collection<Document>) -> MongoCollection {
        MongoCollection { collection }
    }

    /// The underlying driver handle.
    pub fn inner(&self) -> &Collection<Document> {
        &self.collection
    }

    fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

#[async_trait]
impl DocumentCollectionProvider for MongoCollection {
    fn name(&self) -> String {
        self.collection.name().to_string()
    }

    async fn insert_one(&self, document: Document) -> RepoResult<Bson> {
        let result = self
            .collection
            .insert_one(document)
            .await
            .map_err(|err| map_error("insert_one", self.collection_name(), err))?;
        Ok(result.inserted_id)
    }

    async fn insert_many(&self, documents: Vec<Document>) -> RepoResult<Vec<Bson>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let result = self
            .collection
            .insert_many(documents)
            .await
            .map_err(|err| map_error("insert_many", self.collection_name(), err))?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        replacement: Document,
        upsert: bool,
    ) -> RepoResult<ReplaceResult> {
        let result = self
            .collection
            .replace_one(filter.to_document(), replacement)
            .upsert(upsert)
            .await
            .map_err(|err| map_error("replace_one", self.collection_name(), err))?;

        Ok(ReplaceResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_one(&self, filter: &Filter) -> RepoResult<u64> {
        let result = self
            .collection
            .delete_one(filter.to_document())
            .await
            .map_err(|err| map_error("delete_one", self.collection_name(), err))?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, filter: &Filter) -> RepoResult<u64> {
        let result = self
            .collection
            .delete_many(filter.to_document())
            .await
            .map_err(|err| map_error("delete_many", self.collection_name(), err))?;
        Ok(result.deleted_count)
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<DocumentStream> {
        // the server reads a zero limit as "no limit"
        if options.limit_count() == Some(0) {
            return Ok(futures::stream::empty().boxed());
        }

        let mut find = self.collection.find(filter.to_document());
        if let Some(sort) = options.sort_document() {
            find = find.sort(sort);
        }
        if let Some(skip) = options.skip_count() {
            find = find.skip(skip);
        }
        if let Some(limit) = options.limit_count() {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let cursor = find
            .await
            .map_err(|err| map_error("find", self.collection_name(), err))?;

        let name = self.name();
        Ok(cursor
            .map_err(move |err| map_error("cursor iteration", &name, err))
            .boxed())
    }

    async fn count(&self, filter: &Filter) -> RepoResult<u64> {
        self.collection
            .count_documents(filter.to_document())
            .await
            .map_err(|err| map_error("count_documents", self.collection_name(), err))
    }

    async fn create_index(&self, index: &IndexDefinition) -> RepoResult<()> {
        let mut keys = Document::new();
        for field in index.field_names() {
            keys.insert(field.clone(), 1);
        }

        let options = IndexOptions::builder()
            .name(index.name())
            .unique(index.is_unique())
            .build();
        let model = IndexModel::builder().keys(keys).options(options).build();

        self.collection
            .create_index(model)
            .await
            .map_err(|err| {
                log::error!("Failed to create index {} on {}: {}", index, self.collection_name(), err);
                RepoError::with_cause(
                    &format!("Failed to create index {} on {}: {}", index.name(), self.collection_name(), err),
                    ErrorKind::IndexingError,
                    err,
                )
            })?;

        log::debug!("Ensured index {} on {}", index, self.collection_name());
        Ok(())
    }
}
