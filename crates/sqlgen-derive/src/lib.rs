//! Derive macro for sqlgen declarations
//!
//! Provides `#[derive(Sqlgen)]`, which registers the `#[sqlgen(...)]` field
//! attribute so annotated model and query structs build. The macro expands to
//! nothing; the `sqlgen` generator reads the annotations from source.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod check;

/// Accept `#[sqlgen(...)]` on the fields of a struct.
///
/// # Example
///
/// ```ignore
/// use sqlgen_derive::Sqlgen;
///
/// /// sqlgen:model users
/// #[derive(Default, Sqlgen)]
/// pub struct User {
///     #[sqlgen(model = "id,BIGINT")]
///     pub id: i64,
///     #[sqlgen(model = "name,TEXT;index,id")]
///     pub name: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[sqlgen(model = "...")]` - Model column annotation
/// - `#[sqlgen(query = "...")]` - Query field annotation
///
/// Keys are not interpreted here beyond requiring `key = "string"` pairs, so
/// custom annotation keys configured in `sqlgen.toml` work unchanged.
#[proc_macro_derive(Sqlgen, attributes(sqlgen))]
pub fn derive_sqlgen(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    check::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
