//! Derive macro for persistent object types.
//!
//! This crate provides `#[derive(Persistent)]`, which implements
//! `oxide_store::Persistent` by handing every field, in declaration order,
//! to a field visitor.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta};

/// Derives `Persistent` for a struct with named fields.
///
/// Every field type must implement `oxide_store::Attribute`: scalars,
/// `Identifier`, `Varchar<N>`, `ObjectPtr<T>`, `ObjectRef<T>` and
/// `HasMany<T>`. Exactly one field should be an `Identifier`; registering
/// the type with a store fails otherwise.
///
/// # Field Attributes
///
/// - `#[persist(name = "column_name")]` - Column name (optional, defaults
///   to the field name)
/// - `#[persist(skip)]` - Leaves the field out of the table; it keeps its
///   `Default` value on load
#[proc_macro_derive(Persistent, attributes(persist))]
pub fn derive_persistent(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_persistent_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_persistent_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Persistent derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Persistent derive only supports structs",
            ));
        }
    };

    let mut field_infos: Vec<FieldInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_persist_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        field_infos.push(FieldInfo {
            field_name: field_name.clone(),
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for info in &field_infos {
        if !seen.insert(info.column_name.as_str()) {
            return Err(syn::Error::new_spanned(
                &info.field_name,
                format!("duplicate column name `{}`", info.column_name),
            ));
        }
    }

    let visits = field_infos.iter().map(|info| {
        let field_name = &info.field_name;
        let column_name = &info.column_name;
        quote! {
            visitor.visit(#column_name, ::oxide_store::Attribute::field(&mut self.#field_name));
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::oxide_store::Persistent for #struct_name #ty_generics #where_clause {
            fn visit_fields(&mut self, visitor: &mut dyn ::oxide_store::FieldVisitor) {
                #(#visits)*
            }
        }
    };

    Ok(expanded)
}

struct FieldInfo {
    field_name: Ident,
    column_name: String,
}

#[derive(Default)]
struct PersistAttrs {
    name: Option<String>,
    skip: bool,
}

fn parse_persist_attrs(attrs: &[Attribute]) -> syn::Result<PersistAttrs> {
    let mut result = PersistAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("persist") {
            // Handle empty attribute like #[persist]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    result.skip = true;
                } else if meta.path.is_ident("name") {
                    let value: Expr = meta.value()?.parse()?;
                    match value {
                        Expr::Lit(lit) => match lit.lit {
                            Lit::Str(s) => result.name = Some(s.value()),
                            other => {
                                return Err(syn::Error::new_spanned(
                                    other,
                                    "expected a string literal",
                                ));
                            }
                        },
                        other => {
                            return Err(syn::Error::new_spanned(other, "expected a string literal"));
                        }
                    }
                } else {
                    return Err(meta.error("unknown persist attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}
