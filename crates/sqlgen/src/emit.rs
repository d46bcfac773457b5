//! Rust code emission.
//!
//! Turns [`Operation`] bundles into one `pub async fn` each, targeting
//! `tokio_postgres::GenericClient`. Only fragment bundles reach this module:
//! every identifier and SQL string in here was validated upstream.

use crate::model::ModelDefinition;
use crate::query::QueryDefinition;
use crate::sql::{Bind, Operation, Param, Piece, Returns, RowMapping, Statement};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix of the first line of every emitted file.
pub const GENERATED_HEADER: &str = "// @generated by sqlgen";

/// Render a whole output file.
///
/// `source_name` is the file the generator ran for and only appears in the
/// header.
pub fn render_file(
    source_name: &str,
    models: &[ModelDefinition],
    queries: &[QueryDefinition],
    ops: &[Operation],
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{GENERATED_HEADER} from {source_name}. DO NOT EDIT.\n\n"
    ));

    if ops
        .iter()
        .any(|op| op.statements.iter().any(Statement::has_in_list))
    {
        out.push_str("use tokio_postgres::types::ToSql;\n");
    }
    out.push_str("use tokio_postgres::{Error, GenericClient};\n");

    let paths: BTreeMap<&str, &[String]> = models
        .iter()
        .map(|m| (m.ident.as_str(), m.path.as_slice()))
        .chain(queries.iter().map(|q| (q.ident.as_str(), q.path.as_slice())))
        .collect();
    let imports = used_imports(ops, &paths);
    if !imports.is_empty() {
        out.push('\n');
    }
    for (path, idents) in &imports {
        let mut prefix = String::from("super::");
        for seg in path.iter() {
            prefix.push_str(seg);
            prefix.push_str("::");
        }
        let idents: Vec<&str> = idents.iter().copied().collect();
        if idents.len() == 1 {
            out.push_str(&format!("use {prefix}{};\n", idents[0]));
        } else {
            out.push_str(&format!("use {prefix}{{{}}};\n", idents.join(", ")));
        }
    }

    for op in ops {
        out.push('\n');
        render_operation(&mut out, op);
        tracing::debug!(target: "sqlgen", function = %op.fn_name, "emitted operation");
    }
    out
}

/// Types referenced by signatures, grouped by module path.
fn used_imports<'a>(
    ops: &'a [Operation],
    paths: &BTreeMap<&str, &'a [String]>,
) -> BTreeMap<&'a [String], BTreeSet<&'a str>> {
    let mut out: BTreeMap<&[String], BTreeSet<&str>> = BTreeMap::new();
    for op in ops {
        let row = op.params.iter().find_map(|p| match p {
            Param::Row { ty } => Some(ty.as_str()),
            _ => None,
        });
        let ret = match &op.returns {
            Returns::One(m) | Returns::Many(m) => Some(m.ty.as_str()),
            Returns::Unit | Returns::Affected => None,
        };
        for ty in row.into_iter().chain(ret) {
            let path = paths.get(ty).copied().unwrap_or_default();
            out.entry(path).or_default().insert(ty);
        }
    }
    out
}

/// Render one operation as a function.
pub fn render_operation(out: &mut String, op: &Operation) {
    out.push_str(&format!("/// {}\n", op.doc));
    let ret = match &op.returns {
        Returns::Unit => "()".to_string(),
        Returns::Affected => "u64".to_string(),
        Returns::One(m) => m.ty.clone(),
        Returns::Many(m) => format!("Vec<{}>", m.ty),
    };
    if op.params.is_empty() {
        out.push_str(&format!(
            "pub async fn {}(client: &impl GenericClient) -> Result<{ret}, Error> {{\n",
            op.fn_name
        ));
    } else {
        out.push_str(&format!("pub async fn {}(\n", op.fn_name));
        out.push_str("    client: &impl GenericClient,\n");
        for p in &op.params {
            out.push_str(&format!("    {},\n", render_param(p)));
        }
        out.push_str(&format!(") -> Result<{ret}, Error> {{\n"));
    }

    if let Returns::Unit = op.returns {
        for stmt in &op.statements {
            let (sql, args) = render_statement(out, stmt, &op.binds);
            out.push_str(&format!("    client.execute({sql}, {args}).await?;\n"));
        }
        out.push_str("    Ok(())\n}\n");
        return;
    }

    // Everything but table setup runs exactly one statement.
    let Some(stmt) = op.statements.first() else {
        out.push_str("    unreachable!()\n}\n");
        return;
    };
    let (sql, args) = render_statement(out, stmt, &op.binds);
    match &op.returns {
        Returns::Unit => {}
        Returns::Affected => {
            out.push_str(&format!("    client.execute({sql}, {args}).await\n"));
        }
        Returns::One(m) => {
            out.push_str(&format!(
                "    let row = client.query_one({sql}, {args}).await?;\n"
            ));
            out.push_str("    Ok(");
            render_row(out, m, "    ");
            out.push_str(")\n");
        }
        Returns::Many(m) => {
            out.push_str(&format!("    let rows = client.query({sql}, {args}).await?;\n"));
            out.push_str("    let mut out = Vec::with_capacity(rows.len());\n");
            out.push_str("    for row in &rows {\n");
            out.push_str("        out.push(");
            render_row(out, m, "        ");
            out.push_str(");\n");
            out.push_str("    }\n");
            out.push_str("    Ok(out)\n");
        }
    }
    out.push_str("}\n");
}

fn render_param(p: &Param) -> String {
    match p {
        Param::Ref { name, ty } => format!("{name}: &{ty}"),
        Param::Slice { name, ty } => format!("{name}: &[{ty}]"),
        Param::Row { ty } => format!("row: &{ty}"),
        Param::Value { name, ty } => format!("{name}: {ty}"),
    }
}

fn render_bind(b: &Bind) -> String {
    match b {
        Bind::Ref(name) => name.clone(),
        Bind::Value(name) => format!("&{name}"),
        Bind::RowField(field) => format!("&row.{field}"),
    }
}

/// Emit whatever setup the statement needs and return the `(sql, params)`
/// argument expressions for the client call.
fn render_statement(out: &mut String, stmt: &Statement, binds: &[Bind]) -> (String, String) {
    if let Some(sql) = stmt.as_static() {
        return (literal(sql), bind_slice(binds));
    }

    if !stmt.has_in_list() {
        let asc = stmt.render(true, &[]);
        let desc = stmt.render(false, &[]);
        out.push_str(&format!(
            "    let sql = if asc {{ {} }} else {{ {} }};\n",
            literal(&asc),
            literal(&desc)
        ));
        return ("sql".to_string(), bind_slice(binds));
    }

    out.push_str("    let mut sql = String::new();\n");
    out.push_str("    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();\n");
    for b in binds {
        out.push_str(&format!("    params.push({});\n", render_bind(b)));
    }
    out.push_str(&format!("    let mut next = {};\n", stmt.first_dynamic()));
    for piece in stmt.pieces() {
        match piece {
            Piece::Static(s) => {
                out.push_str(&format!("    sql.push_str({});\n", literal(s)));
            }
            Piece::Direction => {
                out.push_str("    sql.push_str(if asc { \"ASC\" } else { \"DESC\" });\n");
            }
            Piece::InList { param } => {
                out.push_str(&format!("    if {param}.is_empty() {{\n"));
                out.push_str("        sql.push_str(\"(NULL)\");\n");
                out.push_str("    } else {\n");
                out.push_str("        sql.push_str(\"(VALUES \");\n");
                out.push_str(&format!(
                    "        for (i, value) in {param}.iter().enumerate() {{\n"
                ));
                out.push_str("            if i > 0 {\n");
                out.push_str("                sql.push_str(\", \");\n");
                out.push_str("            }\n");
                out.push_str("            sql.push_str(&format!(\"(${next})\"));\n");
                out.push_str("            next += 1;\n");
                out.push_str("            params.push(value);\n");
                out.push_str("        }\n");
                out.push_str("        sql.push(')');\n");
                out.push_str("    }\n");
            }
        }
    }
    ("sql.as_str()".to_string(), "&params".to_string())
}

fn bind_slice(binds: &[Bind]) -> String {
    let args: Vec<String> = binds.iter().map(render_bind).collect();
    format!("&[{}]", args.join(", "))
}

fn render_row(out: &mut String, m: &RowMapping, indent: &str) {
    out.push_str(&format!("{} {{\n", m.ty));
    for (i, field) in m.fields.iter().enumerate() {
        out.push_str(&format!("{indent}    {field}: row.try_get({i})?,\n"));
    }
    if !m.exhaustive {
        out.push_str(&format!("{indent}    ..Default::default()\n"));
    }
    out.push_str(&format!("{indent}}}"));
}

/// A Rust string literal holding `s`.
fn literal(s: &str) -> String {
    format!("{s:?}")
}
