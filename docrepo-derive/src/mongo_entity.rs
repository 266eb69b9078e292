use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::{DataStruct, DeriveInput, Field, LitStr, Result, Token};

const DOC_ID: &str = "_id";

pub(crate) fn generate_mongo_entity(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut id_field = "id".to_string();
    let mut created_field = "created".to_string();
    let mut updated_field = "updated".to_string();

    for attr in &ast.attrs {
        if !attr.path().is_ident("mongo_entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let s: LitStr = meta.value()?.parse()?;
            if meta.path.is_ident("id") {
                id_field = s.value();
            } else if meta.path.is_ident("created") {
                created_field = s.value();
            } else if meta.path.is_ident("updated") {
                updated_field = s.value();
            } else {
                return Err(meta.error("Unknown mongo_entity attribute, expected id, created or updated"));
            }
            Ok(())
        })?;
    }

    for field_name in [&id_field, &created_field, &updated_field] {
        let found = data
            .fields
            .iter()
            .any(|field| field.ident.as_ref().is_some_and(|ident| ident == field_name));
        if !found {
            return Err(syn::Error::new_spanned(
                ast,
                format!("Field {} not found in struct", field_name),
            ));
        }
    }

    if let Some(field) = data
        .fields
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == &id_field))
    {
        if !serialized_as_id(field)? {
            return Err(syn::Error::new_spanned(
                field,
                format!(
                    "Field {} must be serialized as `_id`, add #[serde(rename = \"_id\")]",
                    id_field
                ),
            ));
        }
    }

    let id = format_ident!("{}", id_field);
    let created = format_ident!("{}", created_field);
    let updated = format_ident!("{}", updated_field);

    let gen = quote! {
        impl #impl_generics docrepo::entity::Audited for #name #ty_generics #where_clause {
            fn created(&self) -> docrepo::chrono::DateTime<docrepo::chrono::Utc> {
                self.#created
            }

            fn set_created(&mut self, created: docrepo::chrono::DateTime<docrepo::chrono::Utc>) {
                self.#created = created;
            }

            fn updated(&self) -> docrepo::chrono::DateTime<docrepo::chrono::Utc> {
                self.#updated
            }

            fn set_updated(&mut self, updated: docrepo::chrono::DateTime<docrepo::chrono::Utc>) {
                self.#updated = updated;
            }
        }

        impl #impl_generics docrepo::entity::MongoEntity for #name #ty_generics #where_clause {
            fn id(&self) -> &str {
                &self.#id
            }

            fn set_id(&mut self, id: String) {
                self.#id = id;
            }
        }
    };

    Ok(TokenStream::from(gen))
}

/// Returns `true` when serde writes the field under the `_id` key.
fn serialized_as_id(field: &Field) -> Result<bool> {
    if field.ident.as_ref().is_some_and(|ident| ident == DOC_ID) {
        return Ok(true);
    }

    let mut renamed = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("rename") {
                return skip_value(&meta);
            }
            if meta.input.peek(Token![=]) {
                let name: LitStr = meta.value()?.parse()?;
                renamed |= name.value() == DOC_ID;
                return Ok(());
            }
            // rename(serialize = "...", deserialize = "...")
            meta.parse_nested_meta(|inner| {
                if inner.path.is_ident("serialize") {
                    let name: LitStr = inner.value()?.parse()?;
                    renamed |= name.value() == DOC_ID;
                    Ok(())
                } else {
                    skip_value(&inner)
                }
            })
        })?;
    }
    Ok(renamed)
}

fn skip_value(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_value(&inner))?;
    }
    Ok(())
}
