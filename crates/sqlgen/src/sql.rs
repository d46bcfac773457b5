//! SQL fragments.
//!
//! Everything here is a pure function of validated definitions and cannot
//! fail. A [`Statement`] is a list of [`Piece`]s: static text with its fixed
//! `$n` placeholders already numbered, plus the slots the generated code fills
//! at call time (`IN` lists and the ordering direction).
//!
//! Fixed placeholders are numbered first; `IN` lists allocate theirs starting
//! at [`Statement::first_dynamic`], threading one counter through every list
//! of the statement.

mod operation;

pub use operation::{
    Bind, Operation, OperationSource, Param, Returns, RowMapping, model_operations,
    package_operations, query_operations,
};

use crate::model::{ModelDefinition, ModelField};
use crate::naming::{camel, snake};
use crate::query::{ConditionField, ConditionKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Static(String),
    /// `(VALUES ($n), ...)` over the slice parameter `param`, or `(NULL)` when
    /// the slice is empty.
    InList { param: String },
    /// `ASC` or `DESC`, chosen by the caller.
    Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    pieces: Vec<Piece>,
    fixed: usize,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// A statement whose first fixed placeholder is `$offset+1`.
    pub fn starting_at(offset: usize) -> Self {
        Self {
            pieces: Vec::new(),
            fixed: offset,
        }
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        if let Some(Piece::Static(last)) = self.pieces.last_mut() {
            last.push_str(sql);
        } else {
            self.pieces.push(Piece::Static(sql.to_string()));
        }
        self
    }

    /// Append the next fixed placeholder.
    pub fn push_placeholder(&mut self) -> &mut Self {
        self.fixed += 1;
        let p = format!("${}", self.fixed);
        self.push(&p)
    }

    /// Append `count` fixed placeholders separated by `, `.
    pub fn push_placeholders(&mut self, count: usize) -> &mut Self {
        let list = placeholders(self.fixed + 1, count);
        self.fixed += count;
        self.push(&list)
    }

    pub fn push_in_list(&mut self, param: &str) -> &mut Self {
        self.pieces.push(Piece::InList {
            param: param.to_string(),
        });
        self
    }

    pub fn push_direction(&mut self) -> &mut Self {
        self.pieces.push(Piece::Direction);
        self
    }

    /// Append `cond AND cond ...`, numbering fixed conditions from the
    /// current placeholder count.
    pub fn push_conditions(&mut self, conditions: &[ConditionField]) -> &mut Self {
        for (i, c) in conditions.iter().enumerate() {
            if i > 0 {
                self.push(" AND ");
            }
            match c.kind.operator() {
                Some(op) => {
                    let head = format!("{} {op} ", c.field.column_name);
                    self.push(&head).push_placeholder();
                }
                None => {
                    let head = format!("{} IN ", c.field.column_name);
                    self.push(&head).push_in_list(&condition_param(c));
                }
            }
        }
        self
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Number of the highest fixed placeholder.
    pub fn fixed_placeholders(&self) -> usize {
        self.fixed
    }

    /// First placeholder number available to `IN` lists.
    pub fn first_dynamic(&self) -> usize {
        self.fixed + 1
    }

    /// The SQL text when the statement has no call-time slots.
    pub fn as_static(&self) -> Option<&str> {
        match self.pieces.as_slice() {
            [] => Some(""),
            [Piece::Static(s)] => Some(s),
            _ => None,
        }
    }

    pub fn has_in_list(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::InList { .. }))
    }

    pub fn has_direction(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::Direction))
    }

    /// Text the generated code produces for `asc` and the given `IN` list
    /// lengths (one per list, in statement order; missing lengths count as 0).
    pub fn render(&self, asc: bool, in_lens: &[usize]) -> String {
        let mut out = String::new();
        let mut next = self.first_dynamic();
        let mut lens = in_lens.iter().copied();
        for piece in &self.pieces {
            match piece {
                Piece::Static(s) => out.push_str(s),
                Piece::Direction => out.push_str(if asc { "ASC" } else { "DESC" }),
                Piece::InList { .. } => {
                    let n = lens.next().unwrap_or(0);
                    if n == 0 {
                        out.push_str("(NULL)");
                        continue;
                    }
                    out.push_str("(VALUES ");
                    for i in 0..n {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&format!("(${next})"));
                        next += 1;
                    }
                    out.push(')');
                }
            }
        }
        out
    }
}

/// `$start, $start+1, ...`
pub fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|n| format!("${n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn column_list<'a>(columns: impl IntoIterator<Item = &'a str>) -> String {
    columns.into_iter().collect::<Vec<_>>().join(", ")
}

/// `c1__c2__..__ck_index`
pub fn index_name(columns: &[ModelField]) -> String {
    let joined = columns
        .iter()
        .map(|f| f.column_name.as_str())
        .collect::<Vec<_>>()
        .join("__");
    format!("{joined}_index")
}

pub fn create_table(model: &ModelDefinition) -> String {
    let columns = model
        .fields
        .iter()
        .map(|f| format!("{} {}", f.column_name, f.column_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns});", model.table)
}

pub fn create_index(model: &ModelDefinition, columns: &[ModelField]) -> String {
    format!(
        "CREATE INDEX {} ON {} ({});",
        index_name(columns),
        model.table,
        column_list(columns.iter().map(|f| f.column_name.as_str()))
    )
}

/// `EqId`: the condition tag followed by the field identifier.
pub fn condition_tag(c: &ConditionField) -> String {
    format!("{}{}", c.kind.tag(), camel(&c.field.ident))
}

/// Parameter identifier for comparing `ident` with `kind` (`eq_id`).
///
/// Never equal to a fixed parameter name (`client`, `row`, `asc`, ...).
pub fn tagged_param(kind: ConditionKind, ident: &str) -> String {
    snake(&format!("{}{}", kind.tag(), camel(ident)))
}

/// Parameter identifier of one condition (`eq_id`).
pub fn condition_param(c: &ConditionField) -> String {
    tagged_param(c.kind, &c.field.ident)
}

/// Function-name suffix of a condition list (`eq_id_lt_age`).
pub fn condition_suffix(conditions: &[ConditionField]) -> String {
    let tags: String = conditions.iter().map(condition_tag).collect();
    snake(&tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(ident: &str, pos: usize) -> ModelField {
        ModelField {
            ident: ident.to_string(),
            source_type: "i64".to_string(),
            column_name: ident.to_string(),
            column_type: "BIGINT".to_string(),
            position: pos,
        }
    }

    fn cond(kind: ConditionKind, ident: &str) -> ConditionField {
        ConditionField {
            kind,
            field: field(ident, 1),
        }
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1, 3), "$1, $2, $3");
        assert_eq!(placeholders(4, 1), "$4");
        assert_eq!(placeholders(4, 0), "");
    }

    #[test]
    fn condition_numbering_continues_after_row_values() {
        let mut stmt = Statement::new();
        stmt.push("UPDATE t SET (a, b, c) = (")
            .push_placeholders(3)
            .push(") WHERE ")
            .push_conditions(&[cond(ConditionKind::Eq, "id")])
            .push(";");
        assert_eq!(
            stmt.as_static(),
            Some("UPDATE t SET (a, b, c) = ($1, $2, $3) WHERE id = $4;")
        );

        let mut stmt = Statement::new();
        stmt.push("UPDATE t SET (a, b, c) = (")
            .push_placeholders(3)
            .push(") WHERE ")
            .push_conditions(&[
                cond(ConditionKind::Eq, "id"),
                cond(ConditionKind::In, "role"),
            ])
            .push(";");
        assert_eq!(stmt.first_dynamic(), 5);
        assert_eq!(
            stmt.render(true, &[2]),
            "UPDATE t SET (a, b, c) = ($1, $2, $3) WHERE id = $4 AND role IN (VALUES ($5), ($6));"
        );
    }

    #[test]
    fn explicit_offset() {
        let mut stmt = Statement::starting_at(2);
        stmt.push_conditions(&[
            cond(ConditionKind::Neq, "a"),
            cond(ConditionKind::Like, "b"),
            cond(ConditionKind::Geq, "c"),
        ]);
        assert_eq!(stmt.as_static(), Some("a <> $3 AND b LIKE $4 AND c >= $5"));
        assert_eq!(stmt.fixed_placeholders(), 5);
    }

    #[test]
    fn fixed_arity_kinds_map_to_operators_and_tags() {
        let kinds = [
            (ConditionKind::Eq, "=", "eq_x"),
            (ConditionKind::Neq, "<>", "neq_x"),
            (ConditionKind::Lt, "<", "lt_x"),
            (ConditionKind::Leq, "<=", "leq_x"),
            (ConditionKind::Gt, ">", "gt_x"),
            (ConditionKind::Geq, ">=", "geq_x"),
            (ConditionKind::Like, "LIKE", "like_x"),
        ];
        for (i, (kind, op, param)) in kinds.into_iter().enumerate() {
            let c = cond(kind, "x");
            assert_eq!(kind.operator(), Some(op));
            assert!(!kind.is_variable_arity());
            assert_eq!(condition_param(&c), param);

            let mut stmt = Statement::starting_at(i);
            stmt.push_conditions(&[c]);
            assert_eq!(stmt.as_static(), Some(format!("x {op} ${}", i + 1).as_str()));
            assert_eq!(stmt.fixed_placeholders(), i + 1);
        }

        let gt_leq = [cond(ConditionKind::Gt, "age"), cond(ConditionKind::Leq, "score")];
        assert_eq!(condition_tag(&gt_leq[0]), "GtAge");
        assert_eq!(condition_tag(&gt_leq[1]), "LeqScore");
        assert_eq!(condition_suffix(&gt_leq), "gt_age_leq_score");
        let mut stmt = Statement::new();
        stmt.push_conditions(&gt_leq);
        assert_eq!(stmt.as_static(), Some("age > $1 AND score <= $2"));

        assert_eq!(ConditionKind::In.operator(), None);
        assert!(ConditionKind::In.is_variable_arity());
        assert_eq!(tagged_param(ConditionKind::Eq, "client"), "eq_client");
    }

    #[test]
    fn in_lists_share_one_counter() {
        let mut stmt = Statement::new();
        stmt.push("DELETE FROM t WHERE ").push_conditions(&[
            cond(ConditionKind::In, "a"),
            cond(ConditionKind::Lt, "b"),
            cond(ConditionKind::In, "c"),
        ]);
        assert!(stmt.has_in_list());
        assert_eq!(stmt.as_static(), None);
        assert_eq!(
            stmt.render(true, &[1, 2]),
            "DELETE FROM t WHERE a IN (VALUES ($2)) AND b < $1 AND c IN (VALUES ($3), ($4))"
        );
        assert_eq!(
            stmt.render(true, &[0, 1]),
            "DELETE FROM t WHERE a IN (NULL) AND b < $1 AND c IN (VALUES ($2))"
        );
    }

    #[test]
    fn direction_slot() {
        let mut stmt = Statement::new();
        stmt.push("SELECT a FROM t ORDER BY a ")
            .push_direction()
            .push(" LIMIT ")
            .push_placeholder()
            .push(" OFFSET ")
            .push_placeholder()
            .push(";");
        assert!(stmt.has_direction());
        assert!(!stmt.has_in_list());
        assert_eq!(stmt.render(true, &[]), "SELECT a FROM t ORDER BY a ASC LIMIT $1 OFFSET $2;");
        assert_eq!(stmt.render(false, &[]), "SELECT a FROM t ORDER BY a DESC LIMIT $1 OFFSET $2;");
    }

    #[test]
    fn names() {
        assert_eq!(index_name(&[field("other", 2), field("col", 1)]), "other__col_index");
        let conds = [cond(ConditionKind::Eq, "id"), cond(ConditionKind::Lt, "age")];
        assert_eq!(condition_tag(&conds[0]), "EqId");
        assert_eq!(condition_param(&conds[1]), "lt_age");
        assert_eq!(condition_suffix(&conds), "eq_id_lt_age");
        assert_eq!(condition_param(&cond(ConditionKind::In, "r#type")), "in_type");
        assert_eq!(condition_param(&cond(ConditionKind::Eq, "user_id")), "eq_user_id");
    }

    #[test]
    fn table_and_index_skeletons() {
        let mut model = ModelDefinition {
            ident: "User".to_string(),
            path: Vec::new(),
            table: "users".to_string(),
            fields: vec![field("id", 1), field("tenant", 2)],
            indices: Vec::new(),
            primary: 0,
            exhaustive: true,
        };
        model.fields[1].column_type = "NUMERIC(10,2)".to_string();
        assert_eq!(
            create_table(&model),
            "CREATE TABLE users (id BIGINT, tenant NUMERIC(10,2));"
        );
        assert_eq!(
            create_index(&model, &[model.fields[1].clone(), model.fields[0].clone()]),
            "CREATE INDEX tenant__id_index ON users (tenant, id);"
        );
    }
}
