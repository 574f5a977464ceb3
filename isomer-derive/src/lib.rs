use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod fields;

/// Derive macro for the `Record` trait.
///
/// Generates `type_name()`, `fields()`, `base()`, `as_any()` and, when
/// requested, the capability accessors.
///
/// # Example
///
/// ```ignore
/// use isomer_core::Record;
/// use std::sync::Arc;
///
/// #[derive(Record)]
/// struct Animal {
///     name: String,
/// }
///
/// #[derive(Record)]
/// struct Dog {
///     #[record(base)]
///     animal: Animal,
///     breed: String,
///     friend: Option<Arc<Dog>>,
/// }
/// ```
///
/// # Type attributes
///
/// - `#[record(rename = "Name")]` - Type name used for ordering (default
///   `module::path::Type`)
/// - `#[record(crate = "path")]` - Path to `isomer_core` (default `::isomer_core`)
/// - `#[record(comparable)]` - Accessor returns `Self` as `Comparable`
/// - `#[record(restricted)]` - Accessor returns `Self` as `RestrictedComparable`
/// - `#[record(self_comparable)]` - Accessor returns `Self` as `SelfComparable`
///
/// # Field attributes
///
/// - `#[record(base)]` - Embedded ancestor level; its fields come first
/// - `#[record(skip)]` - Leave the field out of the field list
/// - `#[record(rename = "name")]` - Custom field name
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_record_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_record_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let attrs = parse_type_attrs(&input.attrs)?;
    let krate = &attrs.crate_path;

    let syn::Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Record can only be derived for structs",
        ));
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let where_clause = build_where_clause(&input.generics, where_clause, krate);

    // Module-qualified by default so same-named types in different modules
    // stay distinct.
    let type_name = match &attrs.rename {
        Some(rename) => quote! { #rename },
        None => quote! {
            ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#name))
        },
    };
    let layout = fields::Layout::from_fields(&data.fields)?;
    let fields_impl = layout.generate_fields(krate);
    let base_impl = layout.generate_base(krate);
    let accessors = generate_accessors(&attrs.capabilities, krate);

    Ok(quote! {
        impl #impl_generics #krate::Record for #name #ty_generics #where_clause {
            fn type_name(&self) -> &str {
                #type_name
            }

            #fields_impl
            #base_impl

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            #accessors
        }
    })
}

fn build_where_clause(
    generics: &syn::Generics,
    existing: Option<&syn::WhereClause>,
    krate: &syn::Path,
) -> proc_macro2::TokenStream {
    let type_params: Vec<_> = generics.type_params().map(|p| &p.ident).collect();

    if type_params.is_empty() && existing.is_none() {
        return quote! {};
    }

    let value_bounds = type_params.iter().map(|p| {
        quote! { #p: #krate::ToValue + 'static }
    });

    let existing_predicates = existing
        .map(|w| {
            let predicates = &w.predicates;
            quote! { #predicates, }
        })
        .unwrap_or_default();

    quote! {
        where
            Self: ::std::marker::Send + ::std::marker::Sync + 'static,
            #existing_predicates
            #(#value_bounds),*
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capability {
    Comparable,
    Restricted,
    SelfComparable,
}

fn generate_accessors(capabilities: &[Capability], krate: &syn::Path) -> proc_macro2::TokenStream {
    let accessors = capabilities.iter().map(|capability| match capability {
        Capability::Comparable => quote! {
            fn as_comparable(&self) -> ::std::option::Option<&dyn #krate::Comparable> {
                ::std::option::Option::Some(self)
            }
        },
        Capability::Restricted => quote! {
            fn as_restricted(&self) -> ::std::option::Option<&dyn #krate::RestrictedComparable> {
                ::std::option::Option::Some(self)
            }
        },
        Capability::SelfComparable => quote! {
            fn as_self_comparable(&self) -> ::std::option::Option<&dyn #krate::SelfComparable> {
                ::std::option::Option::Some(self)
            }
        },
    });

    quote! { #(#accessors)* }
}

struct TypeAttrs {
    rename: Option<String>,
    crate_path: syn::Path,
    capabilities: Vec<Capability>,
}

fn parse_type_attrs(attrs: &[syn::Attribute]) -> syn::Result<TypeAttrs> {
    let mut result = TypeAttrs {
        rename: None,
        crate_path: syn::parse_quote!(::isomer_core),
        capabilities: Vec::new(),
    };

    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let capability = if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename = Some(value.value());
                return Ok(());
            } else if meta.path.is_ident("crate") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.crate_path = value.parse()?;
                return Ok(());
            } else if meta.path.is_ident("comparable") {
                Capability::Comparable
            } else if meta.path.is_ident("restricted") {
                Capability::Restricted
            } else if meta.path.is_ident("self_comparable") {
                Capability::SelfComparable
            } else {
                return Err(meta.error("unsupported record attribute"));
            };

            if !result.capabilities.contains(&capability) {
                result.capabilities.push(capability);
            }
            Ok(())
        })?;
    }

    Ok(result)
}
