//! Declaration scanner.
//!
//! Reads the `.rs` files of one package directory with `syn` and flattens the
//! items the generator cares about into [`Declaration`]s. Field annotations are
//! read from one attribute namespace, registered in user crates by
//! `#[derive(sqlgen_derive::Sqlgen)]`:
//!
//! ```ignore
//! /// sqlgen:model users
//! #[derive(Sqlgen)]
//! pub struct User {
//!     #[sqlgen(model = "id,BIGINT")]
//!     pub id: i64,
//!     #[sqlgen(model = "email,TEXT;index,tenant")]
//!     pub email: String,
//! }
//! ```

use crate::decl::{
    AnnotatedField, DeclShape, Declaration, RecordBody, ScannedFile, ScannedPackage,
    SourceLocation,
};
use crate::error::ScanError;
use crate::naming::{normalize_type, sanitize_module_name};
use quote::ToTokens;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use syn::{Attribute, Fields, Item};

/// Files starting with this marker are generator output and never scanned.
pub const GENERATED_MARKER: &str = "// @generated";

/// Scan every `.rs` file directly inside `dir`.
///
/// The package name is the directory name as a module identifier.
pub fn scan_package(dir: &Path, attribute: &str) -> Result<ScannedPackage, ScanError> {
    let dir = std::fs::canonicalize(dir).map_err(|e| ScanError::io(dir, e))?;
    let name = dir
        .file_name()
        .and_then(|s| s.to_str())
        .map(sanitize_module_name)
        .unwrap_or_else(|| "_".to_string());

    let mut files = Vec::new();
    for path in source_files(&dir)? {
        let content = std::fs::read_to_string(&path).map_err(|e| ScanError::io(&path, e))?;
        if content.starts_with(GENERATED_MARKER) {
            tracing::debug!(target: "sqlgen", file = %path.display(), "skipping generated file");
            continue;
        }
        let decls = scan_source(&path, &content, attribute)?;
        tracing::debug!(
            target: "sqlgen",
            file = %path.display(),
            decls = decls.len(),
            "scanned source file"
        );
        files.push(ScannedFile { path, decls });
    }

    Ok(ScannedPackage { name, dir, files })
}

fn source_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let pattern = format!("{}/*.rs", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern).map_err(|e| ScanError::Pattern {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ScanError::io(path, e.into())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Scan the declarations of one source text.
pub fn scan_source(path: &Path, content: &str, attribute: &str) -> Result<Vec<Declaration>, ScanError> {
    let file = syn::parse_file(content).map_err(|e| ScanError::parse(path, &e))?;
    scan_items(path, &file.items, &[], attribute)
}

fn scan_items(
    path: &Path,
    items: &[Item],
    scope: &[String],
    attribute: &str,
) -> Result<Vec<Declaration>, ScanError> {
    let mut out = Vec::new();
    for item in items {
        let decl = match item {
            Item::Struct(s) => Declaration {
                ident: s.ident.to_string(),
                shape: DeclShape::Type,
                doc: doc_text(&s.attrs),
                body: match &s.fields {
                    Fields::Named(named) => {
                        let mut fields = Vec::with_capacity(named.named.len());
                        for f in &named.named {
                            fields.push(scan_field(path, f, attribute)?);
                        }
                        RecordBody::Named(fields)
                    }
                    Fields::Unnamed(_) => RecordBody::Tuple,
                    Fields::Unit => RecordBody::Unit,
                },
                members: Vec::new(),
                scope: scope.to_vec(),
                location: location(path, s.ident.span()),
            },
            Item::Enum(e) => leaf(path, scope, &e.ident, &e.attrs, DeclShape::Type),
            Item::Union(u) => leaf(path, scope, &u.ident, &u.attrs, DeclShape::Type),
            Item::Type(t) => leaf(path, scope, &t.ident, &t.attrs, DeclShape::Type),
            Item::Const(c) => leaf(path, scope, &c.ident, &c.attrs, DeclShape::Const),
            Item::Static(s) => leaf(path, scope, &s.ident, &s.attrs, DeclShape::Static),
            Item::Mod(m) => {
                // `mod foo;` lives in another file; only inline groups are declarations here.
                let Some((_, content)) = &m.content else {
                    continue;
                };
                let mut inner = scope.to_vec();
                inner.push(m.ident.to_string());
                Declaration {
                    ident: m.ident.to_string(),
                    shape: DeclShape::TypeGroup,
                    doc: doc_text(&m.attrs),
                    body: RecordBody::NotRecord,
                    members: scan_items(path, content, &inner, attribute)?,
                    scope: scope.to_vec(),
                    location: location(path, m.ident.span()),
                }
            }
            _ => continue,
        };
        out.push(decl);
    }
    Ok(out)
}

fn leaf(
    path: &Path,
    scope: &[String],
    ident: &syn::Ident,
    attrs: &[Attribute],
    shape: DeclShape,
) -> Declaration {
    Declaration {
        ident: ident.to_string(),
        shape,
        doc: doc_text(attrs),
        body: RecordBody::NotRecord,
        members: Vec::new(),
        scope: scope.to_vec(),
        location: location(path, ident.span()),
    }
}

fn scan_field(path: &Path, field: &syn::Field, attribute: &str) -> Result<AnnotatedField, ScanError> {
    let ident = field
        .ident
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let source_type = normalize_type(&field.ty.to_token_stream().to_string());

    let mut annotations: BTreeMap<String, String> = BTreeMap::new();
    for attr in &field.attrs {
        if !attr.path().is_ident(attribute) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .map(ToString::to_string)
                .ok_or_else(|| meta.error("expected a plain annotation key"))?;
            let value: syn::LitStr = meta.value()?.parse()?;
            if annotations.contains_key(&key) {
                return Err(meta.error(format!("duplicate annotation key `{key}`")));
            }
            annotations.insert(key, value.value());
            Ok(())
        })
        .map_err(|e| ScanError::parse(path, &e))?;
    }

    Ok(AnnotatedField {
        ident,
        source_type,
        annotations,
    })
}

fn doc_text(attrs: &[Attribute]) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) = &nv.value
            {
                lines.extend(lit.value().lines().map(str::to_string));
            }
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn location(path: &Path, span: proc_macro2::Span) -> SourceLocation {
    SourceLocation {
        file: path.to_path_buf(),
        line: span.start().line,
    }
}
