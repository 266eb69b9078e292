//! Query filters for selecting documents from collections.
//!
//! A [`Filter`] is the predicate abstraction every repository operation runs
//! through: key lookups, `find_one`, `find_all`, counts and bulk deletes all
//! take one. Filters are built with a fluent API and are plain values that can
//! be cloned, compared and printed.
//!
//! # Creating Filters
//!
//! - `field("age").gt(30)` - comparison operators
//! - `field("name").eq("Alice")` - equality checks
//! - `field("name").starts_with("Big")` - prefix match
//! - `all()` - match all documents
//! - `by_id(id)` - match by the `_id` primary key
//! - `field("age").gt(30).and(field("status").eq("active"))` - logical AND
//!
//! # Supported Operators
//!
//! - **Equality**: `eq`, `ne`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte`, `between`
//! - **Pattern**: `regex`, `regex_case_insensitive`, `starts_with`
//! - **Membership**: `in_array`, `not_in`
//! - **Presence**: `exists`, `not_exists`
//! - **Logical**: `and`, `or`, `not`
//!
//! # Evaluation
//!
//! Filters are evaluated in process with [`Filter::matches`] (used by the
//! in-memory store) or translated with [`Filter::to_document`] into the query
//! language of a document server.

mod compare;
mod filter;
mod fluent;

pub(crate) use compare::*;
pub use filter::*;
pub use fluent::*;
