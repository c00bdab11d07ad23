//! CREATE TABLE column extraction.
//!
//! Only column names are kept. Types, modifiers and table-level constraint
//! clauses are skipped without being interpreted.

use crate::parser::parse_identifier;

/// Leading keywords of table-level definitions that declare no column.
pub static CONSTRAINT_KEYWORDS: &[&str] = &[
    "PRIMARY",
    "UNIQUE",
    "KEY",
    "INDEX",
    "CONSTRAINT",
    "FOREIGN",
    "CHECK",
    "FULLTEXT",
    "SPATIAL",
    "EXCLUDE",
];

/// Extract the ordered column names from the text following the table name
/// of a CREATE TABLE statement, e.g. ` (id INT, name TEXT, PRIMARY KEY (id));`.
///
/// Returns an empty list when the body has no column definitions (`LIKE`,
/// `AS SELECT`, garbage).
pub fn parse_column_names(body: &str) -> Vec<String> {
    let Some(inner) = body.trim_start().strip_prefix('(') else {
        return Vec::new();
    };

    split_table_body(inner)
        .iter()
        .filter_map(|def| parse_column_def(def))
        .collect()
}

/// Split the text inside the outer parentheses at top-level commas, stopping
/// at the closing parenthesis. `--` comments are dropped.
pub fn split_table_body(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escape_next = false;
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            current.push(ch);
            if escape_next {
                escape_next = false;
            } else if ch == '\\' && q != '`' {
                escape_next = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' | '`' => {
                quote = Some(ch);
                current.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                current.push(' ');
            }
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' if depth == 0 => break,
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Column name of one definition, or `None` for constraint clauses.
fn parse_column_def(def: &str) -> Option<String> {
    if def.is_empty() || is_constraint_clause(def) {
        return None;
    }
    parse_identifier(def).map(|(name, _)| name)
}

fn is_constraint_clause(def: &str) -> bool {
    let word_end = def
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(def.len());
    let word = &def[..word_end];
    !word.is_empty()
        && CONSTRAINT_KEYWORDS
            .iter()
            .any(|kw| kw.eq_ignore_ascii_case(word))
}
