//! Model definitions.
//!
//! A model is a struct whose doc comment carries the model directive
//! (`sqlgen:model <table> [<primary_column>]`) and whose fields carry a model
//! annotation:
//!
//! ```text
//! column_name,column_type[;index,other_col,...]*
//! ```
//!
//! `index` lists the *other* columns of a secondary index; the annotated
//! field's own column is always appended last.

use crate::decl::{DeclShape, Declaration};
use crate::directive::DirectiveMatch;
use crate::error::{GenError, GenResult};
use crate::naming::{is_valid_sql_ident, is_valid_table_ref};
use std::collections::{BTreeMap, BTreeSet};

/// One annotated model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelField {
    pub ident: String,
    pub source_type: String,
    pub column_name: String,
    pub column_type: String,
    /// 1-based declaration order among annotated fields.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    pub ident: String,
    /// Module path of the struct relative to the package module.
    pub path: Vec<String>,
    pub table: String,
    pub fields: Vec<ModelField>,
    /// Ordered column lists, one per index.
    pub indices: Vec<Vec<ModelField>>,
    /// Offset of the primary identity in `fields`.
    pub primary: usize,
    /// `false` when the struct also has fields without a model annotation.
    pub exhaustive: bool,
}

impl ModelDefinition {
    pub fn primary(&self) -> &ModelField {
        &self.fields[self.primary]
    }

    pub fn column(&self, column_name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.column_name == column_name)
    }
}

/// Build every model flagged with the model sigil, in encounter order.
pub fn build_models<'a>(
    matches: impl IntoIterator<Item = DirectiveMatch<'a>>,
    key: &str,
) -> GenResult<Vec<ModelDefinition>> {
    let mut models: Vec<ModelDefinition> = Vec::new();
    let mut tables: BTreeMap<String, String> = BTreeMap::new();

    for m in matches {
        let model = build_model(m, key)?;

        if models.iter().any(|other| other.ident == model.ident) {
            return Err(GenError::invalid_file(
                &model.ident,
                "model is declared more than once",
            ));
        }
        if let Some(prev) = tables.insert(model.table.clone(), model.ident.clone()) {
            return Err(GenError::invalid_file(
                &model.ident,
                format!("table `{}` is already used by model `{prev}`", model.table),
            ));
        }

        tracing::debug!(
            target: "sqlgen",
            model = %model.ident,
            table = %model.table,
            columns = model.fields.len(),
            indices = model.indices.len(),
            "built model definition"
        );
        models.push(model);
    }

    Ok(models)
}

/// Column annotation before index references are resolved.
struct ParsedColumn {
    column_name: String,
    column_type: String,
    index_args: Vec<Vec<String>>,
}

/// Build one model from its directive and declaration.
pub fn build_model(m: DirectiveMatch<'_>, key: &str) -> GenResult<ModelDefinition> {
    let decl = m.decl;

    let Some(arg) = m.directive.argument() else {
        return Err(GenError::invalid_file(
            decl_label(decl),
            format!("`{}` requires a table name argument", m.directive.sigil),
        ));
    };
    let mut args = arg.split_whitespace();
    let table = args.next().unwrap_or_default().to_string();
    let primary_column = args.next().map(str::to_string);
    if args.next().is_some() {
        return Err(GenError::invalid_file(
            decl_label(decl),
            format!("unexpected arguments in directive: {arg}"),
        ));
    }
    if !is_valid_table_ref(&table) {
        return Err(GenError::invalid_file(
            decl_label(decl),
            format!("invalid table name `{table}`"),
        ));
    }

    let fields = record_fields(decl, "model")?;

    let mut model_fields: Vec<ModelField> = Vec::new();
    let mut index_args: Vec<(usize, Vec<String>)> = Vec::new();
    let mut by_column: BTreeMap<String, usize> = BTreeMap::new();

    for field in fields {
        let Some(raw) = field.annotation(key) else {
            continue;
        };
        let parsed = parse_model_annotation(&decl.ident, &field.ident, raw)?;

        if let Some(&prev) = by_column.get(&parsed.column_name) {
            let prev_ident: &str = &model_fields[prev].ident;
            return Err(GenError::invalid_model(
                &decl.ident,
                &field.ident,
                format!(
                    "duplicate column name `{}` on fields `{prev_ident}` and `{}`",
                    parsed.column_name, field.ident
                ),
            ));
        }

        let offset = model_fields.len();
        by_column.insert(parsed.column_name.clone(), offset);
        for args in parsed.index_args {
            index_args.push((offset, args));
        }
        model_fields.push(ModelField {
            ident: field.ident.clone(),
            source_type: field.source_type.clone(),
            column_name: parsed.column_name,
            column_type: parsed.column_type,
            position: offset + 1,
        });
    }

    if model_fields.is_empty() {
        return Err(GenError::invalid_file(decl_label(decl), "no model fields found"));
    }

    let mut indices: Vec<Vec<ModelField>> = Vec::with_capacity(index_args.len());
    for (owner, args) in index_args {
        let owner_field = &model_fields[owner];
        let mut columns: Vec<ModelField> = Vec::with_capacity(args.len() + 1);
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for name in args.iter().map(String::as_str).chain([owner_field.column_name.as_str()]) {
            let Some(&target) = by_column.get(name) else {
                return Err(GenError::invalid_model(
                    &decl.ident,
                    &owner_field.ident,
                    format!("index references unknown column `{name}`"),
                ));
            };
            if !seen.insert(name) {
                return Err(GenError::invalid_model(
                    &decl.ident,
                    &owner_field.ident,
                    format!("index lists column `{name}` more than once"),
                ));
            }
            columns.push(model_fields[target].clone());
        }

        if indices.iter().any(|existing| same_columns(existing, &columns)) {
            return Err(GenError::invalid_model(
                &decl.ident,
                &owner_field.ident,
                format!(
                    "duplicate index on ({})",
                    columns
                        .iter()
                        .map(|f| f.column_name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ));
        }
        indices.push(columns);
    }

    let primary = match primary_column {
        None => 0,
        Some(col) => by_column.get(&col).copied().ok_or_else(|| {
            GenError::invalid_model(
                &decl.ident,
                &col,
                "primary column does not exist on model",
            )
        })?,
    };

    Ok(ModelDefinition {
        ident: decl.ident.clone(),
        path: decl.module_path(),
        table,
        exhaustive: model_fields.len() == fields.len(),
        fields: model_fields,
        indices,
        primary,
    })
}

fn same_columns(a: &[ModelField], b: &[ModelField]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.column_name == y.column_name)
}

/// Named fields of a complete struct declaration, or `InvalidFile`.
pub(crate) fn record_fields<'d>(
    decl: &'d Declaration,
    what: &str,
) -> GenResult<&'d [crate::decl::AnnotatedField]> {
    if decl.shape != DeclShape::Type {
        return Err(GenError::invalid_file(
            decl_label(decl),
            format!("{what} directive must be placed on a struct, found {:?}", decl.shape),
        ));
    }
    decl.fields().ok_or_else(|| {
        GenError::invalid_file(
            decl_label(decl),
            format!("{what} directive requires a struct with named fields"),
        )
    })
}

pub(crate) fn decl_label(decl: &Declaration) -> String {
    format!(
        "{} ({}:{})",
        decl.ident,
        decl.location.file.display(),
        decl.location.line
    )
}

fn parse_model_annotation(decl: &str, field: &str, raw: &str) -> GenResult<ParsedColumn> {
    let mut segments = raw.split(';');
    let head = segments.next().unwrap_or_default();

    let Some((name, ty)) = head.split_once(',') else {
        return Err(GenError::invalid_model(
            decl,
            field,
            format!("expected `column_name,column_type`, got `{head}`"),
        ));
    };
    let (name, ty) = (name.trim(), ty.trim());
    if name.is_empty() || ty.is_empty() {
        return Err(GenError::invalid_model(
            decl,
            field,
            format!("expected `column_name,column_type`, got `{head}`"),
        ));
    }
    if !is_valid_sql_ident(name) {
        return Err(GenError::invalid_model(
            decl,
            field,
            format!("column name `{name}` is not a valid SQL identifier"),
        ));
    }

    let mut index_args = Vec::new();
    for segment in segments {
        let mut parts = segment.split(',').map(str::trim);
        let opt = parts.next().unwrap_or_default();
        match opt {
            "index" => {
                let args: Vec<String> = parts.map(str::to_string).collect();
                if args.is_empty() {
                    return Err(GenError::invalid_model(
                        decl,
                        field,
                        "index requires at least one other column",
                    ));
                }
                if args.iter().any(String::is_empty) {
                    return Err(GenError::invalid_model(
                        decl,
                        field,
                        format!("empty column in `{segment}`"),
                    ));
                }
                index_args.push(args);
            }
            "" => {
                return Err(GenError::invalid_model(decl, field, "empty annotation option"));
            }
            other => {
                return Err(GenError::invalid_model(
                    decl,
                    field,
                    format!("unknown model option `{other}`"),
                ));
            }
        }
    }

    Ok(ParsedColumn {
        column_name: name.to_string(),
        column_type: ty.to_string(),
        index_args,
    })
}
