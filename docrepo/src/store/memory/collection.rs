use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::filter::{compare_bson, key_string, lookup_path, Filter, DOC_ID};
use crate::index::IndexDefinition;
use crate::store::{DocumentCollectionProvider, DocumentStream, FindOptions, ReplaceResult, SortOrder};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use futures::StreamExt;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const KEY_SEPARATOR: char = '\u{1f}';

/// A collection held entirely in memory.
///
/// # Characteristics
/// - **Natural order**: documents are scanned in insertion order; a replace
///   keeps the document in place
/// - **Primary key**: `_id` is unique; documents without one get an ObjectId
/// - **Unique indexes**: enforced on every write, like on a document server
/// - **Thread-Safe**: clones share the same documents behind a lock
///
/// Handles are obtained through [`InMemoryDatabase`](super::InMemoryDatabase).
#[derive(Clone)]
pub struct InMemoryCollection {
    inner: Arc<InMemoryCollectionInner>,
}

impl InMemoryCollection {
    pub(crate) fn new(name: &str, latency: Option<Duration>) -> InMemoryCollection {
        InMemoryCollection {
            inner: Arc::new(InMemoryCollectionInner {
                name: name.to_string(),
                latency,
                state: RwLock::new(CollectionState::default()),
            }),
        }
    }

    /// Returns `true` once the collection has received a write or an index.
    pub(crate) fn is_materialized(&self) -> bool {
        self.inner.state.read().materialized
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.state.read().documents.len()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.inner.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

struct InMemoryCollectionInner {
    name: String,
    latency: Option<Duration>,
    state: RwLock<CollectionState>,
}

#[derive(Default)]
struct CollectionState {
    materialized: bool,
    documents: IndexMap<String, Document>,
    indexes: IndexMap<String, IndexDefinition>,
    // index name -> composite key -> primary key
    unique_keys: HashMap<String, HashMap<String, String>>,
}

impl CollectionState {
    fn insert(&mut self, collection: &str, document: Document) -> RepoResult<Bson> {
        let document = with_id_first(document);
        let id = document.get(DOC_ID).cloned().unwrap_or(Bson::Null);
        let primary_key = key_string(&id);

        if self.documents.contains_key(&primary_key) {
            log::error!("Duplicate _id {} in collection {}", id, collection);
            return Err(RepoError::new(
                &format!("E11000 duplicate key error collection: {} index: _id_ dup key: {}", collection, id),
                ErrorKind::DuplicateKey,
            ));
        }

        self.check_unique(collection, &document, None)?;
        self.add_unique_keys(&document, &primary_key);
        self.documents.insert(primary_key, document);
        self.materialized = true;
        Ok(id)
    }

    fn replace(
        &mut self,
        collection: &str,
        primary_key: &str,
        mut replacement: Document,
    ) -> RepoResult<bool> {
        let existing = match self.documents.get(primary_key) {
            Some(existing) => existing.clone(),
            None => return Ok(false),
        };
        let id = existing.get(DOC_ID).cloned().unwrap_or(Bson::Null);

        if let Some(new_id) = replacement.remove(DOC_ID) {
            if key_string(&new_id) != primary_key {
                log::error!("Replacement would change _id {} to {} in collection {}", id, new_id, collection);
                return Err(RepoError::new(
                    &format!(
                        "Performing an update on the path '_id' would modify the immutable field '_id' in {}",
                        collection
                    ),
                    ErrorKind::StoreError,
                ));
            }
        }

        let mut document = Document::new();
        document.insert(DOC_ID, id);
        document.extend(replacement);

        self.check_unique(collection, &document, Some(primary_key))?;
        self.remove_unique_keys(&existing);
        self.add_unique_keys(&document, primary_key);

        let modified = existing != document;
        // existing key: IndexMap keeps the insertion position
        self.documents.insert(primary_key.to_string(), document);
        Ok(modified)
    }

    fn remove(&mut self, primary_key: &str) -> bool {
        match self.documents.shift_remove(primary_key) {
            Some(document) => {
                self.remove_unique_keys(&document);
                true
            }
            None => false,
        }
    }

    fn matching_keys(&self, filter: &Filter, limit: Option<usize>) -> RepoResult<Vec<String>> {
        let mut keys = Vec::new();
        for (key, document) in &self.documents {
            if limit.is_some_and(|limit| keys.len() >= limit) {
                break;
            }
            if filter.matches(document)? {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    fn check_unique(
        &self,
        collection: &str,
        document: &Document,
        own_key: Option<&str>,
    ) -> RepoResult<()> {
        for (name, index) in &self.indexes {
            if !index.is_unique() {
                continue;
            }
            let composite = composite_key(index, document);
            let taken = self
                .unique_keys
                .get(name)
                .and_then(|keys| keys.get(&composite))
                .is_some_and(|owner| Some(owner.as_str()) != own_key);
            if taken {
                log::error!("Unique index {} violated in collection {}", name, collection);
                return Err(RepoError::new(
                    &format!(
                        "E11000 duplicate key error collection: {} index: {}",
                        collection, name
                    ),
                    ErrorKind::DuplicateKey,
                ));
            }
        }
        Ok(())
    }

    fn add_unique_keys(&mut self, document: &Document, primary_key: &str) {
        for (name, index) in &self.indexes {
            if index.is_unique() {
                self.unique_keys
                    .entry(name.clone())
                    .or_default()
                    .insert(composite_key(index, document), primary_key.to_string());
            }
        }
    }

    fn remove_unique_keys(&mut self, document: &Document) {
        for (name, index) in &self.indexes {
            if let Some(keys) = self.unique_keys.get_mut(name) {
                keys.remove(&composite_key(index, document));
            }
        }
    }
}

#[async_trait]
impl DocumentCollectionProvider for InMemoryCollection {
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    async fn insert_one(&self, document: Document) -> RepoResult<Bson> {
        self.simulate_latency().await;
        let mut state = self.inner.state.write();
        state.insert(&self.inner.name, document)
    }

    async fn insert_many(&self, documents: Vec<Document>) -> RepoResult<Vec<Bson>> {
        self.simulate_latency().await;
        let mut state = self.inner.state.write();
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(state.insert(&self.inner.name, document)?);
        }
        Ok(ids)
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        replacement: Document,
        upsert: bool,
    ) -> RepoResult<ReplaceResult> {
        self.simulate_latency().await;
        let mut state = self.inner.state.write();

        if let Some(primary_key) = state.matching_keys(filter, Some(1))?.pop() {
            let modified = state.replace(&self.inner.name, &primary_key, replacement)?;
            return Ok(ReplaceResult {
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(ReplaceResult::default());
        }

        let mut document = replacement;
        if !document.contains_key(DOC_ID) {
            let id = id_from_filter(filter).unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
            document.insert(DOC_ID, id);
        }
        let id = state.insert(&self.inner.name, document)?;
        Ok(ReplaceResult {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
        })
    }

    async fn delete_one(&self, filter: &Filter) -> RepoResult<u64> {
        self.simulate_latency().await;
        let mut state = self.inner.state.write();
        match state.matching_keys(filter, Some(1))?.pop() {
            Some(primary_key) => Ok(u64::from(state.remove(&primary_key))),
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: &Filter) -> RepoResult<u64> {
        self.simulate_latency().await;
        let mut state = self.inner.state.write();
        let keys = state.matching_keys(filter, None)?;
        let mut removed = 0;
        for key in keys {
            if state.remove(&key) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<DocumentStream> {
        self.simulate_latency().await;
        let mut documents = {
            let state = self.inner.state.read();
            let mut documents = Vec::new();
            for document in state.documents.values() {
                if filter.matches(document)? {
                    documents.push(document.clone());
                }
            }
            documents
        };

        if !options.sort_by.is_empty() {
            // stable, so ties keep natural order
            documents.sort_by(|a, b| compare_documents(a, b, &options.sort_by));
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options.limit.map(|limit| limit as usize).unwrap_or(usize::MAX);
        let page: Vec<RepoResult<Document>> = documents
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(Ok)
            .collect();

        Ok(futures::stream::iter(page).boxed())
    }

    async fn count(&self, filter: &Filter) -> RepoResult<u64> {
        self.simulate_latency().await;
        let state = self.inner.state.read();
        let mut count = 0;
        for document in state.documents.values() {
            if filter.matches(document)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn create_index(&self, index: &IndexDefinition) -> RepoResult<()> {
        self.simulate_latency().await;
        let mut state = self.inner.state.write();
        let name = index.name();

        if let Some(existing) = state.indexes.get(&name) {
            if existing == index {
                return Ok(());
            }
            log::error!("Index {} already exists with different options on {}", name, self.inner.name);
            return Err(RepoError::new(
                &format!("Index {} already exists with different options", name),
                ErrorKind::IndexingError,
            ));
        }

        if index.is_unique() {
            let mut keys = HashMap::with_capacity(state.documents.len());
            for (primary_key, document) in &state.documents {
                if keys
                    .insert(composite_key(index, document), primary_key.clone())
                    .is_some()
                {
                    log::error!("Cannot create unique index {} on {}: duplicate values", name, self.inner.name);
                    return Err(RepoError::new(
                        &format!("Cannot create unique index {}, existing documents violate it", name),
                        ErrorKind::IndexingError,
                    ));
                }
            }
            state.unique_keys.insert(name.clone(), keys);
        }

        log::debug!("Created index {} on collection {}", index, self.inner.name);
        state.indexes.insert(name, index.clone());
        state.materialized = true;
        Ok(())
    }
}

/// Moves `_id` to the front, generating an ObjectId when it is missing.
fn with_id_first(mut document: Document) -> Document {
    let id = document
        .remove(DOC_ID)
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
    let mut result = Document::new();
    result.insert(DOC_ID, id);
    result.extend(document);
    result
}

/// Key value an upsert should take from an `_id` equality in its filter.
fn id_from_filter(filter: &Filter) -> Option<Bson> {
    match filter {
        Filter::Eq { field, value } if field == DOC_ID => Some(value.clone()),
        Filter::And(filters) => filters.iter().find_map(id_from_filter),
        _ => None,
    }
}

fn composite_key(index: &IndexDefinition, document: &Document) -> String {
    index
        .field_names()
        .iter()
        .map(|field| match lookup_path(document, field).first() {
            Some(value) => key_string(value),
            None => key_string(&Bson::Null),
        })
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

fn compare_documents(a: &Document, b: &Document, sort_by: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort_by {
        let left = lookup_path(a, field).first().copied().unwrap_or(&Bson::Null);
        let right = lookup_path(b, field).first().copied().unwrap_or(&Bson::Null);
        let ordering = match order {
            SortOrder::Ascending => compare_bson(left, right),
            SortOrder::Descending => compare_bson(right, left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
