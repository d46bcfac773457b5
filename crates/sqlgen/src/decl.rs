//! Scanned declarations.
//!
//! These are the plain-data view of a package the rest of the pipeline works
//! from; nothing downstream touches `syn` types.

use crate::naming::sanitize_module_name;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where a declaration came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

/// How a declaration is shaped, which decides what a directive on it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclShape {
    /// An inline module; a directive on it scopes the whole group.
    TypeGroup,
    /// A `struct`, `enum`, `union` or `type` item.
    Type,
    /// A `const` item.
    Const,
    /// A `static` item.
    Static,
}

impl DeclShape {
    pub fn is_group(self) -> bool {
        matches!(self, Self::TypeGroup)
    }
}

/// The field list of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    /// `struct S { a: T }`
    Named(Vec<AnnotatedField>),
    /// `struct S(T);`
    Tuple,
    /// `struct S;`
    Unit,
    /// Not a struct at all (enum, union, alias, const, static, module).
    NotRecord,
}

/// One named field with its annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedField {
    pub ident: String,
    /// Normalized with [`crate::naming::normalize_type`].
    pub source_type: String,
    /// Annotation key -> raw annotation string.
    pub annotations: BTreeMap<String, String>,
}

impl AnnotatedField {
    pub fn new(ident: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            source_type: source_type.into(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub ident: String,
    pub shape: DeclShape,
    /// Doc comment lines joined with `\n`, `None` when the item has no docs.
    pub doc: Option<String>,
    pub body: RecordBody,
    /// Items declared inside a [`DeclShape::TypeGroup`].
    pub members: Vec<Declaration>,
    /// Enclosing inline modules, outermost first.
    pub scope: Vec<String>,
    pub location: SourceLocation,
}

impl Declaration {
    /// Named fields, when the declaration is a complete struct.
    pub fn fields(&self) -> Option<&[AnnotatedField]> {
        match &self.body {
            RecordBody::Named(fields) => Some(fields),
            _ => None,
        }
    }

    /// Module path of the item relative to the package module: the source
    /// file's module (absent for `mod.rs`/`lib.rs`/`main.rs`) then `scope`.
    pub fn module_path(&self) -> Vec<String> {
        let stem = self
            .location
            .file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let mut path = Vec::with_capacity(self.scope.len() + 1);
        if !matches!(stem, "" | "mod" | "lib" | "main") {
            path.push(sanitize_module_name(stem));
        }
        path.extend(self.scope.iter().cloned());
        path
    }
}

/// One source file of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub decls: Vec<Declaration>,
}

/// All declarations of one package, files in path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPackage {
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<ScannedFile>,
}

impl ScannedPackage {
    /// Top-level declarations across all files, in file then source order.
    pub fn decls(&self) -> impl Iterator<Item = &Declaration> {
        self.files.iter().flat_map(|f| f.decls.iter())
    }
}
