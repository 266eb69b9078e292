//! # docrepo MongoDB Adapter
//!
//! Binds the docrepo store abstraction to the official `mongodb` driver.
//! Filters are sent to the server in query-language form, find options map
//! to the driver's sort/skip/limit, and driver errors are classified into
//! docrepo error kinds (duplicate key, timeout, store error) with the driver
//! error kept as the cause.
//!
//! ```rust,ignore
//! use docrepo::prelude::*;
//! use docrepo_mongodb_adapter::MongoDatabase;
//!
//! let database = MongoDatabase::with_config()
//!     .uri("mongodb://localhost:27017")
//!     .database("app")
//!     .build()
//!     .await?
//!     .into_database();
//!
//! let roles: EntityRepository<Role> = Repository::for_entity(database, RepositoryOptions::new());
//! ```

mod collection;
mod config;
mod database;
mod error;

pub use collection::*;
pub use config::*;
pub use database::*;
