use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, Result};

fn split_fields(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|field| field.trim().to_string())
        .filter(|field| !field.is_empty())
        .collect()
}

pub(crate) fn generate_entity(ast: &DeriveInput) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut entity_name: Option<String> = None;
    let mut indexes: Vec<(proc_macro2::TokenStream, Vec<String>)> = Vec::new();

    for attr in &ast.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let s: LitStr = meta.value()?.parse()?;
                if s.value().is_empty() {
                    return Err(meta.error("Entity name cannot be empty"));
                }
                entity_name = Some(s.value());
                Ok(())
            } else if meta.path.is_ident("index") {
                let mut index_type: Option<proc_macro2::TokenStream> = None;
                let mut index_fields: Option<Vec<String>> = None;

                meta.parse_nested_meta(|meta| {
                    if meta.path.is_ident("type") {
                        let s: LitStr = meta.value()?.parse()?;
                        let normalized = s.value().to_ascii_lowercase().replace('_', "-");
                        index_type = Some(match normalized.as_str() {
                            "unique" => quote!(docrepo::index::IndexType::Unique),
                            "non-unique" | "nonunique" => quote!(docrepo::index::IndexType::NonUnique),
                            other => {
                                return Err(meta.error(format!(
                                    "Unknown index type '{}', expected \"unique\" or \"non-unique\"",
                                    other
                                )))
                            }
                        });
                        Ok(())
                    } else if meta.path.is_ident("fields") {
                        let s: LitStr = meta.value()?.parse()?;
                        index_fields = Some(split_fields(&s.value()));
                        Ok(())
                    } else {
                        Err(meta.error("Unknown index attribute"))
                    }
                })?;

                match (index_type, index_fields) {
                    (Some(index_type), Some(fields)) if !fields.is_empty() => {
                        indexes.push((index_type, fields));
                        Ok(())
                    }
                    _ => Err(meta.error("Index type and fields are required")),
                }
            } else {
                Err(meta.error("Unknown entity attribute"))
            }
        })?;
    }

    let entity_name_code = match entity_name {
        Some(entity_name) => quote! {
            fn entity_name() -> String {
                #entity_name.to_string()
            }
        },
        None => {
            let default_name = name.to_string();
            quote! {
                fn entity_name() -> String {
                    #default_name.to_string()
                }
            }
        }
    };

    let entity_indexes_code = if indexes.is_empty() {
        quote! {}
    } else {
        let indexes_code = indexes.iter().map(|(index_type, fields)| {
            quote! {
                docrepo::index::IndexDefinition::new(vec![#(#fields),*], #index_type)
            }
        });
        quote! {
            fn entity_indexes() -> Vec<docrepo::index::IndexDefinition> {
                vec![#(#indexes_code),*]
            }
        }
    };

    let gen = quote! {
        impl #impl_generics docrepo::entity::Entity for #name #ty_generics #where_clause {
            #entity_name_code
            #entity_indexes_code
        }
    };

    Ok(TokenStream::from(gen))
}
