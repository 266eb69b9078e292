use crate::entity::Entity;
use crate::errors::RepoResult;
use crate::filter::Filter;
use crate::repository::resolver::CollectionResolver;
use crate::store::{FindOptions, SortOrder};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::marker::PhantomData;
use std::sync::Arc;

/// A lazy, composable query over the entities of one collection.
///
/// Building a `Query` never touches the store. Further predicates, sorting and
/// paging can be chained on; the store is only called by the terminal
/// operations ([`fetch`](Query::fetch), [`first`](Query::first),
/// [`count`](Query::count) and [`stream`](Query::stream)). A query is a plain
/// value: every terminal call runs it again against the current data.
///
/// # Examples
///
/// ```rust,ignore
/// let page = roles
///     .find_all(field("level").gte(2))
///     .filter(field("name").starts_with("Big"))
///     .sort_by("name", SortOrder::Ascending)
///     .skip(10)
///     .limit(10)
///     .fetch()
///     .await?;
/// ```
pub struct Query<E> {
    resolver: Arc<CollectionResolver>,
    filter: Filter,
    options: FindOptions,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Query {
            resolver: self.resolver.clone(),
            filter: self.filter.clone(),
            options: self.options.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("collection", &self.resolver.collection_name())
            .field("filter", &self.filter)
            .field("options", &self.options)
            .finish()
    }
}

impl<E: Entity> Query<E> {
    pub(crate) fn new(resolver: Arc<CollectionResolver>, filter: Filter) -> Self {
        Query {
            resolver,
            filter,
            options: FindOptions::new(),
            _marker: PhantomData,
        }
    }

    /// Narrows the query; the new predicate is AND-combined with the current one.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    /// Adds a sort key. Keys apply in the order they are added.
    pub fn sort_by(mut self, field_name: &str, order: SortOrder) -> Self {
        self.options = self.options.sort_by(field_name, order);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.options = self.options.skip(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.options = self.options.limit(limit);
        self
    }

    pub fn get_filter(&self) -> &Filter {
        &self.filter
    }

    pub fn find_options(&self) -> &FindOptions {
        &self.options
    }

    /// Runs the query and collects every result.
    pub async fn fetch(&self) -> RepoResult<Vec<E>> {
        self.stream().await?.try_collect().await
    }

    /// Runs the query and returns its first result, if any.
    pub async fn first(&self) -> RepoResult<Option<E>> {
        let mut options = self.options.clone();
        options.limit = Some(options.limit.map_or(1, |limit| limit.min(1)));
        let collection = self.resolver.get().await?;
        let mut stream = collection.find(&self.filter, &options).await?;
        match stream.next().await {
            Some(document) => Ok(Some(bson::from_document(document?)?)),
            None => Ok(None),
        }
    }

    /// Counts the results the query would return, honouring skip and limit.
    pub async fn count(&self) -> RepoResult<u64> {
        let collection = self.resolver.get().await?;
        let total = collection.count(&self.filter).await?;
        let after_skip = total.saturating_sub(self.options.skip.unwrap_or(0));
        Ok(match self.options.limit {
            Some(limit) => after_skip.min(limit),
            None => after_skip,
        })
    }

    /// Runs the query and yields entities as the store produces them.
    pub async fn stream(&self) -> RepoResult<BoxStream<'static, RepoResult<E>>> {
        let collection = self.resolver.get().await?;
        let documents = collection.find(&self.filter, &self.options).await?;
        Ok(documents
            .map(|document| document.and_then(|document| Ok(bson::from_document::<E>(document)?)))
            .boxed())
    }
}
