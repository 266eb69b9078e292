#![allow(
    clippy::module_inception,
)]
//! # docrepo - Typed Repositories over Document Databases
//!
//! docrepo is a data-access layer for document stores. It binds Rust types to
//! collections and exposes them through generic query and CRUD repositories,
//! leaving filtering, sorting and indexing to the store.
//!
//! ## Key Features
//!
//! - **Typed repositories**: `QueryRepository<E, K>` for reads,
//!   `Repository<E, K>` for writes, generic over entity and key
//! - **Audit timestamps**: `created` / `updated` maintained by lifecycle hooks
//! - **Lazy queries**: compose predicates, sorting and paging before running
//! - **Filter DSL**: `field("age").gte(18).and(field("name").starts_with("A"))`
//! - **Pluggable stores**: an in-memory store ships with the crate, MongoDB in
//!   `docrepo_mongodb_adapter`
//! - **Typed connections**: `Discriminator<M>` keeps several databases apart
//! - **Cancellation and blocking variants** for every operation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docrepo::prelude::*;
//! use docrepo_derive::{Entity, MongoEntity};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity, MongoEntity)]
//! struct Role {
//!     #[serde(rename = "_id")]
//!     id: String,
//!     name: String,
//!     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
//!     created: DateTime<Utc>,
//!     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
//!     updated: DateTime<Utc>,
//! }
//!
//! let database = Database::new(InMemoryDatabase::new("app"));
//! let roles: EntityRepository<Role> = Repository::for_entity(database, RepositoryOptions::new());
//!
//! let admin = roles.insert(role).await?;
//! let big = roles.list(field("name").starts_with("Big")).await?;
//! let removed = roles.delete(&admin.id).await?;
//! ```
//!
//! ## Modules
//!
//! - [`entity`] - Entity contract and key types
//! - [`errors`] - Error types and result alias
//! - [`filter`] - Filter DSL
//! - [`index`] - Declarative index definitions
//! - [`repository`] - Query and mutation repositories
//! - [`store`] - Store abstraction and the in-memory store
//! - [`discriminator`] - Typed database connections
//! - [`cancel`] - Cancellation of asynchronous operations
//! - [`blocking`] - Synchronous operation variants
//! - [`timestamp`] - Audit timestamp helpers

pub mod blocking;
pub mod cancel;
pub mod discriminator;
pub mod entity;
pub mod errors;
pub mod filter;
pub mod index;
pub mod repository;
pub mod store;
pub mod timestamp;

// re-exported for generated code and for callers building documents by hand
pub use bson;
pub use chrono;

/// Commonly used types, traits and functions.
pub mod prelude {
    pub use crate::cancel::{Cancellable, CancellationToken};
    pub use crate::discriminator::{ConnectionMarker, Discriminator};
    pub use crate::entity::{Audited, Entity, EntityKey, MongoEntity};
    pub use crate::errors::{ErrorKind, RepoError, RepoResult};
    pub use crate::filter::{all, and, by_id, field, not, or, Filter};
    pub use crate::index::{IndexDefinition, IndexType};
    pub use crate::repository::{
        EntityQueryRepository, EntityRepository, FieldKey, IdKey, KeySelector, Query,
        QueryRepository, Repository, RepositoryOptions,
    };
    pub use crate::store::memory::InMemoryDatabase;
    pub use crate::store::{Database, DatabaseProvider, DocumentCollection, DocumentCollectionProvider, FindOptions, SortOrder};
}
