//! PostgreSQL COPY block tokenizer.
//!
//! A `COPY table (cols) FROM stdin;` header is followed by one row per line,
//! fields separated by tabs, `\N` for NULL and a `\.` terminator line. Rows
//! need no quote or bracket balancing.

use super::mysql_insert::{Value, ValueTuple};
use super::{parse_identifier_list, parse_qualified_name};

/// NULL marker in COPY text format
pub const COPY_NULL: &str = "\\N";

/// Table and column list named by a COPY header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyHeader {
    pub table_name: String,
    /// Empty when the header names no columns
    pub column_names: Vec<String>,
}

/// Parse the text following the `COPY` keyword, e.g.
/// `public.users (id, name) FROM stdin;`.
pub fn parse_copy_header(text: &str) -> Option<CopyHeader> {
    let (table_name, rest) = parse_qualified_name(text)?;
    let column_names = match parse_identifier_list(rest) {
        Some((names, _)) => names,
        None => Vec::new(),
    };
    Some(CopyHeader {
        table_name,
        column_names,
    })
}

/// Convert the tab-separated fields of one data line into values.
pub fn parse_copy_row(raw_fields: &[String]) -> ValueTuple {
    raw_fields
        .iter()
        .map(|field| {
            if field == COPY_NULL {
                Value::Null
            } else {
                Value::Text(decode_copy_escapes(field))
            }
        })
        .collect()
}

/// Decode COPY text-format backslash escapes. Unknown escapes are kept.
pub fn decode_copy_escapes(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }

    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('v') => result.push('\u{b}'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                // Unknown escape, keep as-is
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}
