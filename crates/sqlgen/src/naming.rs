//! Identifier validation and name shaping shared by the builders and the emitter.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A table reference: `table` or `schema.table`.
pub fn is_valid_table_ref(s: &str) -> bool {
    match s.split_once('.') {
        Some((schema, table)) => is_valid_sql_ident(schema) && is_valid_sql_ident(table),
        None => is_valid_sql_ident(s),
    }
}

/// An ASCII identifier that is not a reserved word.
pub fn is_valid_rust_ident(s: &str) -> bool {
    is_valid_sql_ident(s) && s != "_" && !is_rust_keyword(s)
}

/// Field identifiers come out of `syn` as `r#type` for raw identifiers.
pub fn unraw(ident: &str) -> &str {
    ident.trim_start_matches("r#")
}

/// `user_name` / `r#type` -> `UserName` / `Type`
pub fn camel(ident: &str) -> String {
    unraw(ident).to_upper_camel_case()
}

/// `GetOneEqUserByEqId` -> `get_one_eq_user_by_eq_id`
pub fn snake(ident: &str) -> String {
    unraw(ident).to_snake_case()
}

/// Module name a directory of sources is known by.
pub fn sanitize_module_name(stem: &str) -> String {
    let s = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    let s = heck::AsSnakeCase(&s).to_string();
    match s.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{s}"),
        Some(_) => s,
    }
}

/// Render a type token stream in a stable, compact form.
///
/// `proc_macro2` prints `Option < Vec < u8 > >`; whitespace is kept only
/// where it separates two word characters (`dyn Trait`, `&'a str`).
pub fn normalize_type(tokens: &str) -> String {
    let mut out = String::with_capacity(tokens.len());
    let mut pending_space = false;
    for c in tokens.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_word = out.chars().last().is_some_and(is_word_char);
            if prev_word && (is_word_char(c) || c == '\'') {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_idents() {
        assert!(is_valid_sql_ident("user_id"));
        assert!(is_valid_sql_ident("_x1"));
        assert!(!is_valid_sql_ident("1x"));
        assert!(!is_valid_sql_ident("user id"));
        assert!(!is_valid_sql_ident(""));
        assert!(is_valid_table_ref("public.users"));
        assert!(!is_valid_table_ref("public."));
    }

    #[test]
    fn normalize_type_collapses_token_spacing() {
        assert_eq!(normalize_type("Option < Vec < u8 > >"), "Option<Vec<u8>>");
        assert_eq!(
            normalize_type("chrono :: DateTime < chrono :: Utc >"),
            "chrono::DateTime<chrono::Utc>"
        );
        assert_eq!(normalize_type("& 'static str"), "&'static str");
        assert_eq!(normalize_type("Box < dyn Error >"), "Box<dyn Error>");
    }

    #[test]
    fn case_conversion_strips_raw_prefix() {
        assert_eq!(camel("r#type"), "Type");
        assert_eq!(camel("user_id"), "UserId");
        assert_eq!(snake("GetOneEqUserNameByEqId"), "get_one_eq_user_name_by_eq_id");
    }

    #[test]
    fn module_names() {
        assert_eq!(sanitize_module_name("db-models"), "db_models");
        assert_eq!(sanitize_module_name("2024"), "_2024");
    }
}
