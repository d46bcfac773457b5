//! Query definitions.
//!
//! A query is a struct projecting columns of a model. Its doc comment carries
//! the query directive naming the backing model (`sqlgen:query User`) and its
//! fields carry a query annotation:
//!
//! ```text
//! column_name[;flag[,cond_arg,...]]*
//! cond_arg  := field_name[|cond_kind]
//! flag      := getoneeq | getgroup | getgroupeq | updeq | deleq
//! cond_kind := eq | neq | lt | leq | gt | geq | in | like
//! ```

use crate::directive::DirectiveMatch;
use crate::error::{GenError, GenResult};
use crate::model::{ModelDefinition, ModelField, decl_label, record_fields};
use std::fmt;

/// Comparison applied by one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionKind {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    In,
    Like,
}

impl ConditionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "lt" => Some(Self::Lt),
            "leq" => Some(Self::Leq),
            "gt" => Some(Self::Gt),
            "geq" => Some(Self::Geq),
            "in" => Some(Self::In),
            "like" => Some(Self::Like),
            _ => None,
        }
    }

    /// Prefix for parameter names and function-name suffixes.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Eq => "Eq",
            Self::Neq => "Neq",
            Self::Lt => "Lt",
            Self::Leq => "Leq",
            Self::Gt => "Gt",
            Self::Geq => "Geq",
            Self::In => "In",
            Self::Like => "Like",
        }
    }

    /// SQL operator of a fixed-arity condition; `None` for `in`.
    pub fn operator(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Neq => Some("<>"),
            Self::Lt => Some("<"),
            Self::Leq => Some("<="),
            Self::Gt => Some(">"),
            Self::Geq => Some(">="),
            Self::Like => Some("LIKE"),
            Self::In => None,
        }
    }

    /// `in` binds a caller-sized list instead of one placeholder.
    pub fn is_variable_arity(self) -> bool {
        matches!(self, Self::In)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionField {
    pub kind: ConditionKind,
    pub field: ModelField,
}

/// Statement shape selected by a query flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    GetOneEq,
    GetGroup,
    GetGroupEq,
    UpdEq,
    DelEq,
}

impl OperationKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "getoneeq" => Some(Self::GetOneEq),
            "getgroup" => Some(Self::GetGroup),
            "getgroupeq" => Some(Self::GetGroupEq),
            "updeq" => Some(Self::UpdEq),
            "deleq" => Some(Self::DelEq),
            _ => None,
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Self::GetOneEq => "getoneeq",
            Self::GetGroup => "getgroup",
            Self::GetGroupEq => "getgroupeq",
            Self::UpdEq => "updeq",
            Self::DelEq => "deleq",
        }
    }

    /// Everything but `getgroup` filters by at least one condition.
    pub fn takes_conditions(self) -> bool {
        !matches!(self, Self::GetGroup)
    }

    /// Ordered, paginated reads.
    pub fn is_group(self) -> bool {
        matches!(self, Self::GetGroup | Self::GetGroupEq)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOperation {
    pub kind: OperationKind,
    pub conditions: Vec<ConditionField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryField {
    pub ident: String,
    pub source_type: String,
    pub column_name: String,
    pub column_type: String,
    /// 1-based declaration order among annotated fields.
    pub position: usize,
    pub operations: Vec<QueryOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    pub ident: String,
    /// Module path of the struct relative to the package module.
    pub path: Vec<String>,
    /// Identifier of the backing model.
    pub model: String,
    pub table: String,
    pub fields: Vec<QueryField>,
    /// `false` when the struct also has fields without a query annotation.
    pub exhaustive: bool,
}

impl QueryDefinition {
    /// Fields that carry at least one operation, in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = &QueryField> {
        self.fields.iter().filter(|f| !f.operations.is_empty())
    }
}

/// Build every query flagged with the query sigil against the built models.
pub fn build_queries<'a>(
    matches: impl IntoIterator<Item = DirectiveMatch<'a>>,
    models: &[ModelDefinition],
    key: &str,
) -> GenResult<Vec<QueryDefinition>> {
    let mut out = Vec::new();
    for m in matches {
        let query = build_query(m, models, key)?;
        tracing::debug!(
            target: "sqlgen",
            query = %query.ident,
            model = %query.model,
            columns = query.fields.len(),
            operations = query.operations().map(|f| f.operations.len()).sum::<usize>(),
            "built query definition"
        );
        out.push(query);
    }
    Ok(out)
}

/// Build one query from its directive and declaration.
pub fn build_query(
    m: DirectiveMatch<'_>,
    models: &[ModelDefinition],
    key: &str,
) -> GenResult<QueryDefinition> {
    let decl = m.decl;

    let model_ident = match m.directive.argument() {
        Some(arg) if !arg.contains(char::is_whitespace) => arg,
        Some(arg) => {
            return Err(GenError::invalid_file(
                decl_label(decl),
                format!("unexpected arguments in directive: {arg}"),
            ));
        }
        None => {
            return Err(GenError::invalid_file(
                decl_label(decl),
                format!("`{}` requires the backing model name", m.directive.sigil),
            ));
        }
    };
    let Some(model) = models.iter().find(|md| md.ident == model_ident) else {
        return Err(GenError::invalid_file(
            decl_label(decl),
            format!("unknown model `{model_ident}`"),
        ));
    };

    let fields = record_fields(decl, "query")?;

    let mut query_fields: Vec<QueryField> = Vec::new();
    for field in fields {
        let Some(raw) = field.annotation(key) else {
            continue;
        };
        let mut segments = raw.split(';');
        let column_name = segments.next().unwrap_or_default().trim();

        let model_field = match model.column(column_name) {
            Some(mf) if mf.source_type == field.source_type => mf,
            Some(mf) => {
                return Err(GenError::invalid_model(
                    &decl.ident,
                    &field.ident,
                    format!(
                        "field does not exist on model {}: `{column_name}` is `{}` there, not `{}`",
                        model.ident, mf.source_type, field.source_type
                    ),
                ));
            }
            None => {
                return Err(GenError::invalid_model(
                    &decl.ident,
                    &field.ident,
                    format!(
                        "field does not exist on model {}: no column `{column_name}`",
                        model.ident
                    ),
                ));
            }
        };

        let mut operations = Vec::new();
        for segment in segments {
            operations.push(parse_operation(&decl.ident, &field.ident, model, segment)?);
        }

        query_fields.push(QueryField {
            ident: field.ident.clone(),
            source_type: field.source_type.clone(),
            column_name: model_field.column_name.clone(),
            column_type: model_field.column_type.clone(),
            position: query_fields.len() + 1,
            operations,
        });
    }

    if query_fields.iter().all(|f| f.operations.is_empty()) {
        return Err(GenError::invalid_model(
            &decl.ident,
            "*",
            "query does not contain a query field",
        ));
    }

    Ok(QueryDefinition {
        ident: decl.ident.clone(),
        path: decl.module_path(),
        model: model.ident.clone(),
        table: model.table.clone(),
        exhaustive: query_fields.len() == fields.len(),
        fields: query_fields,
    })
}

fn parse_operation(
    decl: &str,
    field: &str,
    model: &ModelDefinition,
    segment: &str,
) -> GenResult<QueryOperation> {
    let mut parts = segment.split(',').map(str::trim);
    let flag = parts.next().unwrap_or_default();
    if flag.is_empty() {
        return Err(GenError::invalid_model(decl, field, "empty query flag"));
    }
    let Some(kind) = OperationKind::parse(flag) else {
        return Err(GenError::invalid_model(
            decl,
            field,
            format!("unknown query flag `{flag}`"),
        ));
    };

    let args: Vec<&str> = parts.collect();
    if !kind.takes_conditions() && !args.is_empty() {
        return Err(GenError::invalid_model(
            decl,
            field,
            format!("`{kind}` takes no conditions"),
        ));
    }
    if kind.takes_conditions() && args.is_empty() {
        return Err(GenError::invalid_model(
            decl,
            field,
            format!("`{kind}` requires at least one condition"),
        ));
    }

    let mut conditions: Vec<ConditionField> = Vec::with_capacity(args.len());
    for arg in args {
        let (name, kind_raw) = match arg.split_once('|') {
            Some((name, k)) => (name.trim(), k.trim()),
            None => (arg, "eq"),
        };
        let Some(cond_kind) = ConditionKind::parse(kind_raw) else {
            return Err(GenError::invalid_model(
                decl,
                field,
                format!("unknown condition kind `{kind_raw}` in `{arg}`"),
            ));
        };
        let Some(target) = model.column(name) else {
            return Err(GenError::invalid_model(
                decl,
                field,
                format!("invalid condition field `{name}`"),
            ));
        };
        if conditions
            .iter()
            .any(|c| c.kind == cond_kind && c.field.column_name == target.column_name)
        {
            return Err(GenError::invalid_model(
                decl,
                field,
                format!("`{kind}` repeats condition `{arg}`"),
            ));
        }
        conditions.push(ConditionField {
            kind: cond_kind,
            field: target.clone(),
        });
    }

    Ok(QueryOperation { kind, conditions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{AnnotatedField, DeclShape, Declaration, RecordBody, SourceLocation};
    use crate::directive::Directive;

    fn model() -> ModelDefinition {
        let field = |ident: &str, ty: &str, pos: usize| ModelField {
            ident: ident.to_string(),
            source_type: ty.to_string(),
            column_name: ident.to_string(),
            column_type: "TEXT".to_string(),
            position: pos,
        };
        ModelDefinition {
            ident: "User".to_string(),
            path: vec!["user".to_string()],
            table: "users".to_string(),
            fields: vec![
                field("id", "i64", 1),
                field("name", "String", 2),
                field("role", "String", 3),
                field("age", "i32", 4),
            ],
            indices: Vec::new(),
            primary: 0,
            exhaustive: true,
        }
    }

    fn query_decl(fields: Vec<AnnotatedField>) -> Declaration {
        Declaration {
            ident: "UserName".to_string(),
            shape: DeclShape::Type,
            doc: None,
            body: RecordBody::Named(fields),
            members: Vec::new(),
            scope: Vec::new(),
            location: SourceLocation {
                file: "db/user.rs".into(),
                line: 20,
            },
        }
    }

    fn field(ident: &str, ty: &str, tag: &str) -> AnnotatedField {
        AnnotatedField::new(ident, ty).with_annotation("query", tag)
    }

    fn build(raw: &str, decl: &Declaration) -> GenResult<QueryDefinition> {
        let d = Directive {
            sigil: "sqlgen:query".to_string(),
            raw_text: raw.to_string(),
        };
        build_query(
            DirectiveMatch {
                directive: &d,
                shape: decl.shape,
                name: &decl.ident,
                decl,
            },
            &[model()],
            "query",
        )
    }

    #[test]
    fn parses_flags_and_conditions() {
        let decl = query_decl(vec![
            field("id", "i64", "id"),
            field("name", "String", "name;getgroup;getoneeq,id,age|lt"),
            AnnotatedField::new("extra", "u8"),
            field("role", "String", "role;deleq,role|in"),
        ]);
        let q = build(" User", &decl).unwrap();

        assert_eq!(q.table, "users");
        assert_eq!(q.path, vec!["user".to_string()]);
        assert!(!q.exhaustive);
        assert_eq!(
            q.fields.iter().map(|f| f.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let op_fields: Vec<_> = q.operations().map(|f| f.ident.as_str()).collect();
        assert_eq!(op_fields, vec!["name", "role"]);

        let name = &q.fields[1];
        assert_eq!(name.operations[0].kind, OperationKind::GetGroup);
        assert!(name.operations[0].conditions.is_empty());
        let getone = &name.operations[1];
        assert_eq!(getone.kind, OperationKind::GetOneEq);
        assert_eq!(getone.conditions[0].kind, ConditionKind::Eq);
        assert_eq!(getone.conditions[0].field.column_name, "id");
        assert_eq!(getone.conditions[1].kind, ConditionKind::Lt);
        assert_eq!(getone.conditions[1].field.column_name, "age");

        assert_eq!(q.fields[2].operations[0].conditions[0].kind, ConditionKind::In);
    }

    #[test]
    fn cross_reference_errors() {
        let missing = query_decl(vec![field("email", "String", "email;getgroup")]);
        let err = build(" User", &missing).unwrap_err();
        assert!(err.is_invalid_model());
        assert!(err.to_string().contains("field does not exist on model"));

        let mistyped = query_decl(vec![field("id", "i32", "id;getgroup")]);
        let err = build(" User", &mistyped).unwrap_err();
        assert!(err.is_invalid_model());
        assert!(err.to_string().contains("field does not exist on model"));

        let bad_cond = query_decl(vec![field("id", "i64", "id;getoneeq,email")]);
        let err = build(" User", &bad_cond).unwrap_err();
        assert!(err.to_string().contains("invalid condition field `email`"));
    }

    #[test]
    fn flag_arity_and_grammar() {
        for tag in [
            "id;getgroup,name",
            "id;getoneeq",
            "id;updeq",
            "id;select",
            "id;getoneeq,id|between",
            "id;",
            "id;deleq,id,id|eq",
        ] {
            let decl = query_decl(vec![field("id", "i64", tag)]);
            let err = build(" User", &decl).unwrap_err();
            assert!(err.is_invalid_model(), "{tag}: {err}");
        }
    }

    #[test]
    fn query_without_flags_is_rejected() {
        let decl = query_decl(vec![field("id", "i64", "id"), field("name", "String", "name")]);
        let err = build(" User", &decl).unwrap_err();
        assert!(err.is_invalid_model());
        assert!(err.to_string().contains("query does not contain a query field"));
    }

    #[test]
    fn directive_must_name_a_known_model() {
        let decl = query_decl(vec![field("id", "i64", "id;getgroup")]);
        assert!(build("", &decl).unwrap_err().is_invalid_file());
        assert!(build(" Account", &decl).unwrap_err().is_invalid_file());
        assert!(build(" User extra", &decl).unwrap_err().is_invalid_file());
    }
}
