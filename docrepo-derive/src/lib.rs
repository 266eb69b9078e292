#![recursion_limit = "128"]
//! # docrepo Derive Macros
//!
//! This crate provides procedural macros for implementing the docrepo entity
//! traits automatically.
//!
//! ## Macros
//!
//! ### `Entity`
//!
//! Derives `docrepo::entity::Entity`, naming the collection and declaring its
//! indexes.
//!
//! - **Supported for**: structs and enums
//! - **Type attribute**: `#[entity(name = "...", index(type = "...", fields = "..."))]`
//!
//! ```rust,ignore
//! use docrepo_derive::Entity;
//!
//! #[derive(Serialize, Deserialize, Entity)]
//! #[entity(name = "users", index(type = "unique", fields = "email"))]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: String,
//!     pub email: String,
//! }
//! ```
//!
//! ### `MongoEntity`
//!
//! Derives `docrepo::entity::Audited` and `docrepo::entity::MongoEntity` for
//! structs carrying a string id and two `DateTime<Utc>` timestamps. Fields
//! default to `id`, `created` and `updated`.
//!
//! - **Supported for**: structs with named fields only
//! - **Type attribute**: `#[mongo_entity(id = "...", created = "...", updated = "...")]`
//!
//! ```rust,ignore
//! use docrepo_derive::{Entity, MongoEntity};
//!
//! #[derive(Serialize, Deserialize, Entity, MongoEntity)]
//! #[mongo_entity(created = "created_at", updated = "updated_at")]
//! pub struct Role {
//!     #[serde(rename = "_id")]
//!     pub id: String,
//!     pub name: String,
//!     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
//!     pub created_at: DateTime<Utc>,
//!     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
//!     pub updated_at: DateTime<Utc>,
//! }
//! ```

extern crate proc_macro;
mod entity;
mod mongo_entity;

use crate::entity::generate_entity;
use crate::mongo_entity::generate_mongo_entity;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `Entity` trait.
///
/// # Attributes
///
/// - `#[entity(name = "...")]` - Collection name (defaults to the type name)
/// - `#[entity(index(type = "unique" | "non-unique", fields = "a, b"))]` -
///   An index ensured when a repository resolves the collection; repeatable
///
/// # Errors
///
/// Returns a compile error for an unknown attribute, an unknown index type,
/// or an index without fields.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Union(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for unions. Only structs and enums are supported.",
        )
        .to_compile_error()
        .into(),
        _ => match generate_entity(&ast) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
    }
}

/// Derives the `Audited` and `MongoEntity` traits.
///
/// # Attributes
///
/// - `#[mongo_entity(id = "...")]` - The `String` id field, serialized as `_id`
/// - `#[mongo_entity(created = "...", updated = "...")]` - The timestamp fields
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum or union
/// - A configured field does not exist
/// - The id field is not serialized as `_id`
///
/// ```
/// use docrepo::chrono::{DateTime, Utc};
/// use docrepo_derive::{Entity, MongoEntity};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Entity, MongoEntity)]
/// struct Tag {
///     #[serde(rename = "_id", default)]
///     id: String,
///     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
///     created: DateTime<Utc>,
///     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
///     updated: DateTime<Utc>,
/// }
/// ```
///
/// An id field stored under its own name is rejected, since key lookups
/// always filter on `_id`:
///
/// ```compile_fail
/// use docrepo::chrono::{DateTime, Utc};
/// use docrepo_derive::{Entity, MongoEntity};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Entity, MongoEntity)]
/// struct Tag {
///     #[serde(default)]
///     id: String,
///     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
///     created: DateTime<Utc>,
///     #[serde(with = "docrepo::timestamp", default = "docrepo::timestamp::zero")]
///     updated: DateTime<Utc>,
/// }
/// ```
#[proc_macro_derive(MongoEntity, attributes(mongo_entity))]
pub fn derive_mongo_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_mongo_entity(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new_spanned(
                    &ast,
                    format!(
                        "Failed to derive MongoEntity for struct '{}': {}.\n\
                         Example: #[derive(MongoEntity)] pub struct Role {{ id: String, created: DateTime<Utc>, updated: DateTime<Utc> }}",
                        ast.ident, e
                    ),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive MongoEntity for enums. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
        Data::Union(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive MongoEntity for unions. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
    }
}
