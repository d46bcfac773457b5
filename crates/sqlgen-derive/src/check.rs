//! Shape checks for `#[sqlgen(...)]` attributes.

use proc_macro2::TokenStream;
use std::collections::BTreeSet;
use syn::{Attribute, Data, DeriveInput, Fields, Result};

const ATTRIBUTE: &str = "sqlgen";

pub(crate) fn expand(input: DeriveInput) -> Result<TokenStream> {
    if let Some(attr) = input.attrs.iter().find(|a| a.path().is_ident(ATTRIBUTE)) {
        return Err(syn::Error::new_spanned(
            attr,
            "#[sqlgen(...)] belongs on fields; mark the struct with a `/// sqlgen:model` or `/// sqlgen:query` doc line",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Sqlgen can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Sqlgen can only be derived for structs",
            ));
        }
    };

    for field in fields {
        let mut keys = BTreeSet::new();
        for attr in field.attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE)) {
            check_attr(attr, &mut keys)?;
        }
    }

    Ok(TokenStream::new())
}

fn check_attr(attr: &Attribute, keys: &mut BTreeSet<String>) -> Result<()> {
    attr.parse_nested_meta(|meta| {
        let Some(key) = meta.path.get_ident().map(ToString::to_string) else {
            return Err(meta.error("expected a plain annotation key"));
        };
        let value: syn::LitStr = meta.value()?.parse()?;
        if value.value().trim().is_empty() {
            return Err(syn::Error::new_spanned(
                &value,
                format!("annotation `{key}` must not be empty"),
            ));
        }
        if !keys.insert(key.clone()) {
            return Err(meta.error(format!("duplicate annotation key `{key}`")));
        }
        Ok(())
    })
}
