use proc_macro2::TokenStream;
use quote::quote;

/// Field slots of a struct, split into the ancestor level and own fields.
pub struct Layout {
    base: Option<syn::Member>,
    own: Vec<(String, syn::Member)>,
}

impl Layout {
    pub fn from_fields(fields: &syn::Fields) -> syn::Result<Self> {
        let mut layout = Layout {
            base: None,
            own: Vec::new(),
        };

        for (index, field) in fields.iter().enumerate() {
            let attrs = parse_field_attrs(&field.attrs)?;
            let member = match &field.ident {
                Some(ident) => syn::Member::Named(ident.clone()),
                None => syn::Member::Unnamed(syn::Index::from(index)),
            };

            if attrs.base {
                if layout.base.is_some() {
                    return Err(syn::Error::new_spanned(
                        field,
                        "a record can embed only one base",
                    ));
                }
                layout.base = Some(member);
                continue;
            }
            if attrs.skip {
                continue;
            }

            let name = attrs.rename.unwrap_or_else(|| match &member {
                syn::Member::Named(ident) => ident.to_string(),
                syn::Member::Unnamed(index) => index.index.to_string(),
            });
            if layout.own.iter().any(|(existing, _)| *existing == name) {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("duplicate record field name `{name}`"),
                ));
            }
            layout.own.push((name, member));
        }

        Ok(layout)
    }

    /// Generates the `fields()` method: base level first, then own fields
    /// in declaration order.
    pub fn generate_fields(&self, krate: &syn::Path) -> TokenStream {
        let inherit = self.base.as_ref().map(|base| {
            quote! {
                fields.inherit(
                    #krate::Record::type_name(&self.#base),
                    #krate::Record::fields(&self.#base),
                );
            }
        });

        let pushes = self.own.iter().map(|(name, member)| {
            quote! {
                fields.push(#name, #krate::ToValue::to_value(&self.#member));
            }
        });

        quote! {
            fn fields(&self) -> #krate::FieldList {
                let mut fields = #krate::FieldList::new();
                #inherit
                #(#pushes)*
                fields
            }
        }
    }

    /// Generates `base()` when the struct embeds an ancestor level.
    pub fn generate_base(&self, krate: &syn::Path) -> TokenStream {
        match &self.base {
            Some(base) => quote! {
                fn base(&self) -> ::std::option::Option<&dyn #krate::Record> {
                    ::std::option::Option::Some(&self.#base)
                }
            },
            None => quote! {},
        }
    }
}

#[derive(Default)]
struct FieldAttrs {
    base: bool,
    skip: bool,
    rename: Option<String>,
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                result.base = true;
            } else if meta.path.is_ident("skip") {
                result.skip = true;
            } else if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename = Some(value.value());
            } else {
                return Err(meta.error("unsupported record field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}
