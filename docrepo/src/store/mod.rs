//! Storage abstraction consumed by the repositories.
//!
//! A backend implements [`DatabaseProvider`] and [`DocumentCollectionProvider`];
//! the rest of the crate only sees the [`Database`] and [`DocumentCollection`]
//! handles. The crate ships an in-memory backend in [`memory`]; the MongoDB
//! binding lives in the `docrepo_mongodb_adapter` crate.

mod collection;
mod database;
mod find_options;
pub mod memory;

pub use collection::*;
pub use database::*;
pub use find_options::*;
