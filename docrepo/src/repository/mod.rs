//! Typed repositories over document collections.
//!
//! A [`QueryRepository`] reads the entities of one collection; a
//! [`Repository`] adds inserts, updates, upserts and deletes together with
//! lifecycle hooks, and dereferences to its query half. Both are generic over
//! the entity type and the key type; [`EntityRepository`] and
//! [`EntityQueryRepository`] fix the key to the string `_id` of a
//! [`MongoEntity`](crate::entity::MongoEntity).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use docrepo::prelude::*;
//!
//! let database = Database::new(InMemoryDatabase::new("app"));
//! let roles: EntityRepository<Role> = Repository::for_entity(database, RepositoryOptions::new());
//!
//! let admin = roles.insert(Role::new("admin")).await?;
//! assert_eq!(admin.created, admin.updated);
//!
//! let found = roles.find(&admin.id).await?;
//! let big = roles.find_all(field("name").starts_with("Big")).fetch().await?;
//! ```

mod key;
mod options;
mod query;
mod query_repository;
mod repository;
mod resolver;

pub use key::*;
pub use options::*;
pub use query::*;
pub use query_repository::*;
pub use repository::*;
