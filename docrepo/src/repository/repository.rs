use crate::entity::{Audited, Entity, EntityKey, MongoEntity};
use crate::errors::RepoResult;
use crate::filter::{all, Filter};
use crate::repository::key::{IdKey, KeySelector};
use crate::repository::options::{Hook, RepositoryOptions};
use crate::repository::QueryRepository;
use crate::store::Database;
use crate::timestamp;
use bson::oid::ObjectId;
use bson::Document;
use std::ops::Deref;
use std::sync::Arc;

/// Read and write access to the entities of one collection.
///
/// # Purpose
/// `Repository` adds mutations to a [`QueryRepository`] and dereferences to
/// it, so every read operation is available on a repository too. Entities
/// pass through the lifecycle hooks before they are written:
///
/// - `before_insert` runs on [`insert`](Repository::insert) and on every
///   element of [`insert_batch`](Repository::insert_batch),
/// - `before_update` runs on [`update`](Repository::update) and
///   [`upsert`](Repository::upsert), whether the upsert ends up inserting or
///   replacing.
///
/// # Construction
/// - [`Repository::new`] installs no hooks beyond those in the options.
/// - [`Repository::audited`] requires `E: Audited` and installs the audit
///   hooks: insert sets `created` and `updated` to the same instant, update
///   sets `updated` and fills `created` only while it is still zero.
/// - [`Repository::for_entity`] requires `E: MongoEntity`, keys by `_id` and
///   additionally assigns a fresh ObjectId hex id on insert when the id is
///   empty.
///
/// Hooks from [`RepositoryOptions`] run after the audit hooks.
///
/// # Failure Semantics
/// Store errors are returned as they come: a key collision is a
/// `DuplicateKey` error, nothing is checked up front and nothing is retried.
pub struct Repository<E, K> {
    query: QueryRepository<E, K>,
    hooks: Arc<LifecycleHooks<E>>,
}

struct LifecycleHooks<E> {
    before_insert: Vec<Hook<E>>,
    before_update: Vec<Hook<E>>,
}

impl<E, K> Clone for Repository<E, K> {
    fn clone(&self) -> Self {
        Repository {
            query: self.query.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<E, K> Deref for Repository<E, K> {
    type Target = QueryRepository<E, K>;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

impl<E: Entity, K: EntityKey> Repository<E, K> {
    /// Creates a repository keyed by `key_selector`, with only the hooks
    /// registered in `options`.
    pub fn new<S>(database: Database, key_selector: S, options: RepositoryOptions<E>) -> Self
    where
        S: KeySelector<E, K>,
    {
        Repository::with_base_hooks(database, key_selector, options, Vec::new(), Vec::new())
    }

    fn with_base_hooks<S>(
        database: Database,
        key_selector: S,
        mut options: RepositoryOptions<E>,
        mut before_insert: Vec<Hook<E>>,
        mut before_update: Vec<Hook<E>>,
    ) -> Self
    where
        S: KeySelector<E, K>,
    {
        before_insert.append(&mut options.before_insert);
        before_update.append(&mut options.before_update);

        Repository {
            query: QueryRepository::new(database, key_selector, options),
            hooks: Arc::new(LifecycleHooks {
                before_insert,
                before_update,
            }),
        }
    }

    /// Returns the read-only half of this repository.
    pub fn query_repository(&self) -> QueryRepository<E, K> {
        self.query.clone()
    }

    /// Inserts an entity and returns it as stored, after the insert hooks ran.
    ///
    /// # Errors
    /// * `DuplicateKey` if the key or a unique index value is already taken
    pub async fn insert(&self, mut entity: E) -> RepoResult<E> {
        self.before_insert(&mut entity);
        let document = bson::to_document(&entity)?;
        let collection = self.collection().await?;
        collection.insert_one(document).await?;
        Ok(entity)
    }

    /// Inserts entities in order with a single store call.
    ///
    /// The batch is not atomic: when an element is rejected the elements
    /// before it stay stored and the error is returned.
    pub async fn insert_batch(&self, entities: Vec<E>) -> RepoResult<Vec<E>> {
        if entities.is_empty() {
            return Ok(entities);
        }

        let mut entities = entities;
        let mut documents = Vec::with_capacity(entities.len());
        for entity in entities.iter_mut() {
            self.before_insert(entity);
            documents.push(bson::to_document(&*entity)?);
        }

        let collection = self.collection().await?;
        collection.insert_many(documents).await?;
        Ok(entities)
    }

    /// Replaces the stored record with the same key as `entity`.
    ///
    /// Nothing is written if no record has that key.
    ///
    /// # Errors
    /// * `InvalidArgument` if the entity's key is unset
    pub async fn update(&self, entity: E) -> RepoResult<E> {
        self.replace(entity, false).await
    }

    /// Replaces the stored record with the same key as `entity`, or inserts
    /// the entity when there is none. Runs the update hooks in both cases.
    ///
    /// # Errors
    /// * `InvalidArgument` if the entity's key is unset
    pub async fn upsert(&self, entity: E) -> RepoResult<E> {
        self.replace(entity, true).await
    }

    /// Deletes the record with the given key and returns how many were
    /// removed (0 or 1). Deleting a missing key is not an error.
    ///
    /// # Errors
    /// * `InvalidArgument` if the key is unset
    pub async fn delete(&self, key: &K) -> RepoResult<u64> {
        let filter = self.checked_key_filter(key)?;
        let collection = self.collection().await?;
        collection.delete_one(&filter).await
    }

    /// Deletes the record with the same key as `entity`.
    pub async fn delete_entity(&self, entity: &E) -> RepoResult<u64> {
        self.delete(&self.key_of(entity)).await
    }

    /// Deletes every record matching `filter` and returns how many were removed.
    pub async fn delete_all(&self, filter: Filter) -> RepoResult<u64> {
        let collection = self.collection().await?;
        collection.delete_many(&filter).await
    }

    /// Deletes every record of the collection.
    pub async fn clear(&self) -> RepoResult<u64> {
        self.delete_all(all()).await
    }

    async fn replace(&self, mut entity: E, upsert: bool) -> RepoResult<E> {
        self.before_update(&mut entity);
        let key = self.key_of(&entity);
        let filter = self.checked_key_filter(&key)?;
        let document: Document = bson::to_document(&entity)?;

        let collection = self.collection().await?;
        let result = collection.replace_one(&filter, document, upsert).await?;
        if result.matched_count == 0 && result.upserted_id.is_none() {
            log::warn!(
                "Update of {:?} in {} matched no record",
                key,
                collection.name()
            );
        }
        Ok(entity)
    }

    fn before_insert(&self, entity: &mut E) {
        for hook in &self.hooks.before_insert {
            hook(entity);
        }
    }

    fn before_update(&self, entity: &mut E) {
        for hook in &self.hooks.before_update {
            hook(entity);
        }
    }
}

impl<E: Audited, K: EntityKey> Repository<E, K> {
    /// Creates a repository that maintains the `created` and `updated`
    /// timestamps of its entities.
    pub fn audited<S>(database: Database, key_selector: S, options: RepositoryOptions<E>) -> Self
    where
        S: KeySelector<E, K>,
    {
        Repository::with_base_hooks(
            database,
            key_selector,
            options,
            vec![Arc::new(stamp_insert::<E>) as Hook<E>],
            vec![Arc::new(stamp_update::<E>) as Hook<E>],
        )
    }
}

impl<E: MongoEntity> Repository<E, String> {
    /// Creates a repository over a [`MongoEntity`], keyed by `_id`, with
    /// audit hooks and id assignment on insert.
    pub fn for_entity(database: Database, options: RepositoryOptions<E>) -> Self {
        Repository::with_base_hooks(
            database,
            IdKey,
            options,
            vec![
                Arc::new(assign_id::<E>) as Hook<E>,
                Arc::new(stamp_insert::<E>) as Hook<E>,
            ],
            vec![Arc::new(stamp_update::<E>) as Hook<E>],
        )
    }
}

/// Repository over a [`MongoEntity`], keyed by its string `_id`.
pub type EntityRepository<E> = Repository<E, String>;

fn assign_id<E: MongoEntity>(entity: &mut E) {
    if entity.id().is_empty() {
        entity.set_id(ObjectId::new().to_hex());
    }
}

fn stamp_insert<E: Audited>(entity: &mut E) {
    let now = timestamp::now();
    entity.set_created(now);
    entity.set_updated(now);
}

fn stamp_update<E: Audited>(entity: &mut E) {
    let now = timestamp::now();
    if timestamp::is_zero(&entity.created()) {
        entity.set_created(now);
    }
    entity.set_updated(now);
}
