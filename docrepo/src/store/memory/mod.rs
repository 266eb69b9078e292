//! In-memory document store.

mod collection;
mod database;

pub use collection::*;
pub use database::*;
