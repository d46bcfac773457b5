use super::{
    Statement, column_list, condition_param, condition_suffix, create_index, create_table,
    tagged_param,
};
use crate::model::ModelDefinition;
use crate::naming::snake;
use crate::query::{ConditionKind, OperationKind, QueryDefinition, QueryField, QueryOperation};

/// One parameter of a generated function, after `client`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// `name: &ty`
    Ref { name: String, ty: String },
    /// `name: &[ty]`
    Slice { name: String, ty: String },
    /// `row: &ty`
    Row { ty: String },
    /// `name: ty`, passed by value.
    Value { name: String, ty: String },
}

impl Param {
    pub fn name(&self) -> &str {
        match self {
            Self::Ref { name, .. } | Self::Slice { name, .. } | Self::Value { name, .. } => name,
            Self::Row { .. } => "row",
        }
    }
}

/// Argument bound to one fixed placeholder, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    /// A `&T` parameter.
    Ref(String),
    /// A by-value parameter; bound by reference.
    Value(String),
    /// A field of the `row` parameter.
    RowField(String),
}

/// Struct a result row is read into, columns in select order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMapping {
    pub ty: String,
    pub fields: Vec<String>,
    /// `false` adds `..Default::default()` for the unmapped fields.
    pub exhaustive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Returns {
    /// `()`, for DDL.
    Unit,
    /// Number of affected rows.
    Affected,
    One(RowMapping),
    Many(RowMapping),
}

/// Declaration an operation was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSource {
    pub decl: String,
    /// Annotated field for query operations.
    pub field: Option<String>,
}

/// Everything the emitter needs for one generated function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub fn_name: String,
    pub source: OperationSource,
    pub doc: String,
    pub params: Vec<Param>,
    pub binds: Vec<Bind>,
    /// Executed in order; only table setup has more than one.
    pub statements: Vec<Statement>,
    pub returns: Returns,
}

/// All operations of a package in emission order: per model setup, get,
/// insert, update and delete, then every query operation in field and flag
/// order.
pub fn package_operations(models: &[ModelDefinition], queries: &[QueryDefinition]) -> Vec<Operation> {
    let mut out = Vec::new();
    for model in models {
        out.extend(model_operations(model));
    }
    for query in queries {
        out.extend(query_operations(query));
    }
    out
}

pub fn model_operations(model: &ModelDefinition) -> Vec<Operation> {
    let name = snake(&model.ident);
    let columns = column_list(model.fields.iter().map(|f| f.column_name.as_str()));
    let pk = model.primary();
    let source = OperationSource {
        decl: model.ident.clone(),
        field: None,
    };
    let row_binds: Vec<Bind> = model
        .fields
        .iter()
        .map(|f| Bind::RowField(f.ident.clone()))
        .collect();
    let pk_name = tagged_param(ConditionKind::Eq, &pk.ident);
    let pk_param = Param::Ref {
        name: pk_name.clone(),
        ty: pk.source_type.clone(),
    };

    let mut setup = vec![fixed(&create_table(model))];
    setup.extend(
        model
            .indices
            .iter()
            .map(|columns| fixed(&create_index(model, columns))),
    );

    let get = fixed(&format!(
        "SELECT {columns} FROM {} WHERE {} = $1;",
        model.table, pk.column_name
    ));
    let mut insert = Statement::new();
    insert
        .push(&format!("INSERT INTO {} ({columns}) VALUES (", model.table))
        .push_placeholders(model.fields.len())
        .push(");");
    let mut update = Statement::new();
    update
        .push(&format!("UPDATE {} SET ({columns}) = (", model.table))
        .push_placeholders(model.fields.len())
        .push(&format!(") WHERE {} = ${};", pk.column_name, pk.position));
    let delete = fixed(&format!(
        "DELETE FROM {} WHERE {} = $1;",
        model.table, pk.column_name
    ));

    vec![
        Operation {
            fn_name: format!("setup_{name}"),
            source: source.clone(),
            doc: format!("Creates table `{}` and its indices.", model.table),
            params: Vec::new(),
            binds: Vec::new(),
            statements: setup,
            returns: Returns::Unit,
        },
        Operation {
            fn_name: format!("get_{name}"),
            source: source.clone(),
            doc: format!("Reads one `{}` row by `{}`.", model.table, pk.column_name),
            params: vec![pk_param.clone()],
            binds: vec![Bind::Ref(pk_name.clone())],
            statements: vec![get],
            returns: Returns::One(RowMapping {
                ty: model.ident.clone(),
                fields: model.fields.iter().map(|f| f.ident.clone()).collect(),
                exhaustive: model.exhaustive,
            }),
        },
        Operation {
            fn_name: format!("insert_{name}"),
            source: source.clone(),
            doc: format!("Inserts `row` into `{}`.", model.table),
            params: vec![Param::Row {
                ty: model.ident.clone(),
            }],
            binds: row_binds.clone(),
            statements: vec![insert],
            returns: Returns::Affected,
        },
        Operation {
            fn_name: format!("update_{name}"),
            source: source.clone(),
            doc: format!(
                "Overwrites the `{}` row whose `{}` matches `row`.",
                model.table, pk.column_name
            ),
            params: vec![Param::Row {
                ty: model.ident.clone(),
            }],
            binds: row_binds,
            statements: vec![update],
            returns: Returns::Affected,
        },
        Operation {
            fn_name: format!("delete_{name}"),
            source,
            doc: format!("Deletes one `{}` row by `{}`.", model.table, pk.column_name),
            params: vec![pk_param],
            binds: vec![Bind::Ref(pk_name.clone())],
            statements: vec![delete],
            returns: Returns::Affected,
        },
    ]
}

pub fn query_operations(query: &QueryDefinition) -> Vec<Operation> {
    let mut out = Vec::new();
    for field in query.operations() {
        for op in &field.operations {
            out.push(query_operation(query, field, op));
        }
    }
    out
}

fn query_operation(query: &QueryDefinition, field: &QueryField, op: &QueryOperation) -> Operation {
    let name = snake(&query.ident);
    let columns = column_list(query.fields.iter().map(|f| f.column_name.as_str()));
    let mapping = RowMapping {
        ty: query.ident.clone(),
        fields: query.fields.iter().map(|f| f.ident.clone()).collect(),
        exhaustive: query.exhaustive,
    };
    let suffix = condition_suffix(&op.conditions);
    let order_by = snake(&field.ident);

    let mut params: Vec<Param> = Vec::new();
    let mut binds: Vec<Bind> = Vec::new();
    if op.kind == OperationKind::UpdEq {
        params.push(Param::Row {
            ty: query.ident.clone(),
        });
        binds.extend(query.fields.iter().map(|f| Bind::RowField(f.ident.clone())));
    }
    for c in &op.conditions {
        let param = condition_param(c);
        if c.kind.is_variable_arity() {
            params.push(Param::Slice {
                name: param,
                ty: c.field.source_type.clone(),
            });
        } else {
            binds.push(Bind::Ref(param.clone()));
            params.push(Param::Ref {
                name: param,
                ty: c.field.source_type.clone(),
            });
        }
    }
    if op.kind.is_group() {
        params.push(Param::Value {
            name: "asc".to_string(),
            ty: "bool".to_string(),
        });
        for name in ["limit", "offset"] {
            params.push(Param::Value {
                name: name.to_string(),
                ty: "i64".to_string(),
            });
            binds.push(Bind::Value(name.to_string()));
        }
    }

    let mut stmt = Statement::new();
    let (fn_name, doc, returns) = match op.kind {
        OperationKind::GetOneEq => {
            stmt.push(&format!("SELECT {columns} FROM {} WHERE ", query.table))
                .push_conditions(&op.conditions)
                .push(";");
            (
                format!("get_one_eq_{name}_by_{suffix}"),
                format!("Reads one `{}` row matching every condition.", query.table),
                Returns::One(mapping),
            )
        }
        OperationKind::GetGroup => {
            stmt.push(&format!(
                "SELECT {columns} FROM {} ORDER BY {} ",
                query.table, field.column_name
            ));
            push_page(&mut stmt);
            (
                format!("get_group_{name}_order_by_{order_by}"),
                format!(
                    "Reads one page of `{}` ordered by `{}`.",
                    query.table, field.column_name
                ),
                Returns::Many(mapping),
            )
        }
        OperationKind::GetGroupEq => {
            stmt.push(&format!("SELECT {columns} FROM {} WHERE ", query.table))
                .push_conditions(&op.conditions)
                .push(&format!(" ORDER BY {} ", field.column_name));
            push_page(&mut stmt);
            (
                format!("get_group_eq_{name}_by_{suffix}_order_by_{order_by}"),
                format!(
                    "Reads one page of matching `{}` rows ordered by `{}`.",
                    query.table, field.column_name
                ),
                Returns::Many(mapping),
            )
        }
        OperationKind::UpdEq => {
            stmt.push(&format!("UPDATE {} SET ({columns}) = (", query.table))
                .push_placeholders(query.fields.len())
                .push(") WHERE ")
                .push_conditions(&op.conditions)
                .push(";");
            (
                format!("upd_eq_{name}_by_{suffix}"),
                format!(
                    "Overwrites the `{}` columns of matching `{}` rows.",
                    query.ident, query.table
                ),
                Returns::Affected,
            )
        }
        OperationKind::DelEq => {
            stmt.push(&format!("DELETE FROM {} WHERE ", query.table))
                .push_conditions(&op.conditions)
                .push(";");
            (
                format!("del_eq_{name}_by_{suffix}"),
                format!("Deletes matching `{}` rows.", query.table),
                Returns::Affected,
            )
        }
    };

    Operation {
        fn_name,
        source: OperationSource {
            decl: query.ident.clone(),
            field: Some(field.ident.clone()),
        },
        doc,
        params,
        binds,
        statements: vec![stmt],
        returns,
    }
}

fn push_page(stmt: &mut Statement) {
    stmt.push_direction()
        .push(" LIMIT ")
        .push_placeholder()
        .push(" OFFSET ")
        .push_placeholder()
        .push(";");
}

fn fixed(sql: &str) -> Statement {
    let mut stmt = Statement::new();
    stmt.push(sql);
    stmt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelField;
    use crate::query::ConditionField;

    fn mf(ident: &str, ty: &str, col_ty: &str, pos: usize) -> ModelField {
        ModelField {
            ident: ident.to_string(),
            source_type: ty.to_string(),
            column_name: ident.to_string(),
            column_type: col_ty.to_string(),
            position: pos,
        }
    }

    fn user() -> ModelDefinition {
        let fields = vec![
            mf("id", "i64", "BIGINT", 1),
            mf("name", "String", "TEXT", 2),
            mf("role", "String", "TEXT", 3),
        ];
        ModelDefinition {
            ident: "User".to_string(),
            path: vec!["user".to_string()],
            table: "users".to_string(),
            indices: vec![vec![fields[2].clone(), fields[1].clone()]],
            fields,
            primary: 0,
            exhaustive: true,
        }
    }

    fn qf(m: &ModelField, pos: usize, operations: Vec<QueryOperation>) -> QueryField {
        QueryField {
            ident: m.ident.clone(),
            source_type: m.source_type.clone(),
            column_name: m.column_name.clone(),
            column_type: m.column_type.clone(),
            position: pos,
            operations,
        }
    }

    fn query(fields: Vec<QueryField>) -> QueryDefinition {
        QueryDefinition {
            ident: "UserName".to_string(),
            path: vec!["user".to_string()],
            model: "User".to_string(),
            table: "users".to_string(),
            fields,
            exhaustive: true,
        }
    }

    fn sqls(op: &Operation) -> Vec<String> {
        op.statements.iter().map(|s| s.render(true, &[])).collect()
    }

    #[test]
    fn model_operations_in_order() {
        let ops = model_operations(&user());
        let names: Vec<_> = ops.iter().map(|o| o.fn_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["setup_user", "get_user", "insert_user", "update_user", "delete_user"]
        );

        assert_eq!(
            sqls(&ops[0]),
            vec![
                "CREATE TABLE users (id BIGINT, name TEXT, role TEXT);",
                "CREATE INDEX role__name_index ON users (role, name);",
            ]
        );
        assert_eq!(sqls(&ops[1]), vec!["SELECT id, name, role FROM users WHERE id = $1;"]);
        assert_eq!(
            sqls(&ops[2]),
            vec!["INSERT INTO users (id, name, role) VALUES ($1, $2, $3);"]
        );
        assert_eq!(
            sqls(&ops[3]),
            vec!["UPDATE users SET (id, name, role) = ($1, $2, $3) WHERE id = $1;"]
        );
        assert_eq!(sqls(&ops[4]), vec!["DELETE FROM users WHERE id = $1;"]);
        assert_eq!(ops[2].binds.len(), 3);
    }

    #[test]
    fn update_uses_the_primary_position() {
        let mut model = user();
        model.primary = 2;
        let ops = model_operations(&model);
        assert_eq!(
            sqls(&ops[3]),
            vec!["UPDATE users SET (id, name, role) = ($1, $2, $3) WHERE role = $3;"]
        );
        assert_eq!(sqls(&ops[4]), vec!["DELETE FROM users WHERE role = $1;"]);
        assert_eq!(ops[4].params[0].name(), "eq_role");
    }

    #[test]
    fn query_operation_shapes() {
        let m = user();
        let eq_id = ConditionField {
            kind: ConditionKind::Eq,
            field: m.fields[0].clone(),
        };
        let in_role = ConditionField {
            kind: ConditionKind::In,
            field: m.fields[2].clone(),
        };
        let q = query(vec![
            qf(&m.fields[0], 1, Vec::new()),
            qf(
                &m.fields[1],
                2,
                vec![
                    QueryOperation {
                        kind: OperationKind::GetGroup,
                        conditions: Vec::new(),
                    },
                    QueryOperation {
                        kind: OperationKind::GetGroupEq,
                        conditions: vec![eq_id.clone()],
                    },
                    QueryOperation {
                        kind: OperationKind::UpdEq,
                        conditions: vec![eq_id.clone(), in_role.clone()],
                    },
                    QueryOperation {
                        kind: OperationKind::DelEq,
                        conditions: vec![in_role],
                    },
                    QueryOperation {
                        kind: OperationKind::GetOneEq,
                        conditions: vec![eq_id],
                    },
                ],
            ),
        ]);
        let ops = query_operations(&q);
        let names: Vec<_> = ops.iter().map(|o| o.fn_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_group_user_name_order_by_name",
                "get_group_eq_user_name_by_eq_id_order_by_name",
                "upd_eq_user_name_by_eq_id_in_role",
                "del_eq_user_name_by_in_role",
                "get_one_eq_user_name_by_eq_id",
            ]
        );

        let stmt = &ops[0].statements[0];
        assert_eq!(
            stmt.render(false, &[]),
            "SELECT id, name FROM users ORDER BY name DESC LIMIT $1 OFFSET $2;"
        );
        assert_eq!(
            ops[0].binds,
            vec![Bind::Value("limit".into()), Bind::Value("offset".into())]
        );

        assert_eq!(
            ops[1].statements[0].render(true, &[]),
            "SELECT id, name FROM users WHERE id = $1 ORDER BY name ASC LIMIT $2 OFFSET $3;"
        );

        let upd = &ops[2];
        assert_eq!(upd.statements[0].first_dynamic(), 4);
        assert_eq!(
            upd.statements[0].render(true, &[2]),
            "UPDATE users SET (id, name) = ($1, $2) WHERE id = $3 AND role IN (VALUES ($4), ($5));"
        );
        let param_names: Vec<_> = upd.params.iter().map(Param::name).collect();
        assert_eq!(param_names, vec!["row", "eq_id", "in_role"]);
        assert_eq!(
            upd.binds,
            vec![
                Bind::RowField("id".into()),
                Bind::RowField("name".into()),
                Bind::Ref("eq_id".into()),
            ]
        );

        assert_eq!(
            ops[3].statements[0].render(true, &[0]),
            "DELETE FROM users WHERE role IN (NULL);"
        );
        assert_eq!(
            sqls(&ops[4]),
            vec!["SELECT id, name FROM users WHERE id = $1;"]
        );
    }
}
