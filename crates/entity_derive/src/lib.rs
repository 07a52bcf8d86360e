use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{
    Expr, ExprLit, Fields, Ident, ItemStruct, Lit, Meta, Path, Token, parse_macro_input, parse_str,
    punctuated::Punctuated,
};

struct TimestampedConfig {
    traits_path: Path,
    active_model_ident: Ident,
    created_at_field: Ident,
    updated_at_field: Ident,
}

impl Default for TimestampedConfig {
    fn default() -> Self {
        Self {
            traits_path: parse_str("crate::db::dao::base_traits")
                .expect("default traits path should parse"),
            active_model_ident: Ident::new("ActiveModel", proc_macro2::Span::call_site()),
            created_at_field: Ident::new("created_at", proc_macro2::Span::call_site()),
            updated_at_field: Ident::new("updated_at", proc_macro2::Span::call_site()),
        }
    }
}

/// Appends `created_at` / `updated_at` columns to a sea-orm model and wires
/// the DAO timestamp traits for its `ActiveModel` and `Entity`.
///
/// Primary keys are left to the model: entities in this crate use string,
/// integer and composite keys, so only the timestamp pair is shared.
#[proc_macro_attribute]
pub fn timestamped(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated<Meta, Token![,]>::parse_terminated);
    let mut config = TimestampedConfig::default();
    if let Err(err) = apply_args(&mut config, args) {
        return err.to_compile_error().into();
    }

    let mut input = parse_macro_input!(item as ItemStruct);
    let fields = match &mut input.fields {
        Fields::Named(fields) => fields,
        _ => {
            return syn::Error::new_spanned(
                input,
                "timestamped requires a struct with named fields",
            )
            .to_compile_error()
            .into();
        }
    };

    let existing: HashSet<String> = fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| ident.to_string()))
        .collect();

    // Relation fields (`HasOne`/`HasMany`) must stay last for the model macro,
    // so the timestamp columns go right after the plain columns.
    let (columns, relations): (Vec<syn::Field>, Vec<syn::Field>) = fields
        .named
        .iter()
        .cloned()
        .partition(|field| !is_relation_field(field));

    let mut new_fields = Punctuated::new();
    for field in columns {
        new_fields.push(field);
    }

    if !existing.contains(&config.created_at_field.to_string()) {
        let created_ident = config.created_at_field.clone();
        let created_field: syn::Field = syn::parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub #created_ident: sea_orm::entity::prelude::DateTimeWithTimeZone
        };
        new_fields.push(created_field);
    }

    if !existing.contains(&config.updated_at_field.to_string()) {
        let updated_ident = config.updated_at_field.clone();
        let updated_field: syn::Field = syn::parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub #updated_ident: sea_orm::entity::prelude::DateTimeWithTimeZone
        };
        new_fields.push(updated_field);
    }

    for field in relations {
        new_fields.push(field);
    }

    fields.named = new_fields;

    let traits_path = config.traits_path;
    let active_model = config.active_model_ident;
    let created_at_field = config.created_at_field;
    let updated_at_field = config.updated_at_field;

    let expanded = quote! {
        #input

        impl #traits_path::TimestampedActiveModel for #active_model {
            fn set_created_at(
                &mut self,
                ts: sea_orm::entity::prelude::DateTimeWithTimeZone,
            ) {
                self.#created_at_field = sea_orm::ActiveValue::Set(ts);
            }

            fn set_updated_at(
                &mut self,
                ts: sea_orm::entity::prelude::DateTimeWithTimeZone,
            ) {
                self.#updated_at_field = sea_orm::ActiveValue::Set(ts);
            }
        }

        impl #traits_path::HasCreatedAtColumn for Entity {
            fn created_at_column() -> Column {
                Column::CreatedAt
            }
        }
    };

    expanded.into()
}

fn is_relation_field(field: &syn::Field) -> bool {
    let syn::Type::Path(type_path) = &field.ty else {
        return false;
    };
    type_path
        .path
        .segments
        .last()
        .map(|segment| segment.ident == "HasOne" || segment.ident == "HasMany")
        .unwrap_or(false)
}

fn apply_args(
    config: &mut TimestampedConfig,
    args: Punctuated<Meta, Token![,]>,
) -> Result<(), syn::Error> {
    for meta in args {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "expected name-value pair, e.g. traits = \"path::to::traits\"",
            ));
        };

        let Some(ident) = name_value.path.get_ident() else {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "expected simple identifier for attribute key",
            ));
        };

        let value = match name_value.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit_str),
                ..
            }) => lit_str,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected string literal for attribute value",
                ));
            }
        };

        match ident.to_string().as_str() {
            "traits" => {
                config.traits_path = value.parse::<Path>().map_err(|err| {
                    syn::Error::new(value.span(), format!("invalid traits path: {err}"))
                })?;
            }
            "active_model" => {
                config.active_model_ident = Ident::new(&value.value(), value.span());
            }
            "created_at" => {
                config.created_at_field = Ident::new(&value.value(), value.span());
            }
            "updated_at" => {
                config.updated_at_field = Ident::new(&value.value(), value.span());
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown timestamped attribute key",
                ));
            }
        }
    }

    Ok(())
}
