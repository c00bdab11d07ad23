//! INSERT INTO value tokenizer.
//!
//! Parses the text following the table name of an `INSERT INTO` statement:
//! an optional column list, the `VALUES` keyword and one or more value
//! tuples. Every value is classified as NULL, number, quoted string or an
//! allow-listed opaque expression; anything else fails the whole statement.

use super::{parse_identifier_list, SqlDialect};
use once_cell::sync::Lazy;
use regex::Regex;

/// Expressions passed through verbatim instead of being evaluated.
static OPAQUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Bit decoding emitted by old mysqldump versions
        r"(?i)^CONV\('[0-9a-f]*',\s*\d+,\s*\d+\)(?:\s*\+\s*\d+)?",
        // Bit literal
        r"(?i)^b'[01]*'",
        // Hex literals
        r"(?i)^0x[0-9a-f]+",
        r"(?i)^x'[0-9a-f]*'",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Charset introducer or national string prefix in front of a quote.
static INTRODUCER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:_[a-z0-9]+\s*|N)'").unwrap());

/// A single value of a tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    /// Numeric literal, as written
    Number(String),
    /// Quoted string with quotes removed and escapes resolved
    Text(String),
    /// Recognized expression kept as literal text
    Opaque(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Field content for CSV output; NULL becomes an empty field.
    pub fn as_field(&self) -> &str {
        match self {
            Value::Null => "",
            Value::Number(s) | Value::Text(s) | Value::Opaque(s) => s,
        }
    }
}

/// One destination row
pub type ValueTuple = Vec<Value>;

/// Tokenized form of an INSERT statement body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    /// Explicit column list, if the statement names its columns
    pub columns: Option<Vec<String>>,
    pub tuples: Vec<ValueTuple>,
}

/// Tokenize the text after the table name of an INSERT statement.
///
/// The error is a human readable description of the first problem found.
pub fn parse_insert(body_text: &str, dialect: SqlDialect) -> Result<InsertStatement, String> {
    InsertParser::new(body_text, dialect).parse()
}

/// Parser over an INSERT body
pub struct InsertParser<'a> {
    text: &'a str,
    stmt: &'a [u8],
    pos: usize,
    dialect: SqlDialect,
}

impl<'a> InsertParser<'a> {
    pub fn new(text: &'a str, dialect: SqlDialect) -> Self {
        Self {
            text,
            stmt: text.as_bytes(),
            pos: 0,
            dialect,
        }
    }

    pub fn parse(&mut self) -> Result<InsertStatement, String> {
        self.skip_whitespace();

        let columns = if self.peek() == Some(b'(') {
            let (names, rest) = parse_identifier_list(&self.text[self.pos..])
                .ok_or_else(|| "unreadable column list".to_string())?;
            self.pos = self.text.len() - rest.len();
            Some(names)
        } else {
            None
        };

        self.expect_values_keyword()?;

        let mut tuples = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'(') {
                return Err(self.unexpected("'(' opening a value tuple"));
            }
            tuples.push(self.parse_tuple()?);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b';') | None => break,
                Some(_) if self.at_trailing_clause() => break,
                Some(_) => return Err(self.unexpected("',' or ';' after a value tuple")),
            }
        }

        Ok(InsertStatement { columns, tuples })
    }

    /// Accept `VALUES` or `VALUE`
    fn expect_values_keyword(&mut self) -> Result<(), String> {
        self.skip_whitespace();
        let word = self.word_at(self.pos);
        if word.eq_ignore_ascii_case("VALUES") || word.eq_ignore_ascii_case("VALUE") {
            self.pos += word.len();
            Ok(())
        } else {
            Err(self.unexpected("VALUES"))
        }
    }

    /// `ON DUPLICATE KEY UPDATE ...`, `ON CONFLICT ...` and `RETURNING ...`
    /// carry no row data.
    fn at_trailing_clause(&self) -> bool {
        let word = self.word_at(self.pos);
        word.eq_ignore_ascii_case("ON") || word.eq_ignore_ascii_case("RETURNING")
    }

    /// Parse `( value, value, ... )`
    fn parse_tuple(&mut self) -> Result<ValueTuple, String> {
        self.pos += 1; // Skip '('
        let mut values = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(values);
        }

        loop {
            values.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(values);
                }
                _ => return Err(self.unexpected("',' or ')' after a value")),
            }
        }
    }

    /// Parse a single value (NULL, string, number, opaque expression)
    fn parse_value(&mut self) -> Result<Value, String> {
        self.skip_whitespace();

        let b = match self.peek() {
            Some(b) => b,
            None => return Err("value tuple cut short".to_string()),
        };

        // NULL
        let word = self.word_at(self.pos);
        if word.eq_ignore_ascii_case("NULL") {
            self.pos += 4;
            return Ok(Value::Null);
        }

        // String literal
        if b == b'\'' || b == b'"' {
            let escapes = self.dialect.backslash_escapes(b'\n');
            return self.parse_string_value(escapes);
        }

        // E'...' string with backslash escapes
        if (b == b'E' || b == b'e') && self.stmt.get(self.pos + 1) == Some(&b'\'') {
            self.pos += 1;
            return self.parse_string_value(true);
        }

        // Number
        if let Some(end) = self.scan_number() {
            if self.at_value_end(end) {
                let raw = &self.text[self.pos..end];
                self.pos = end;
                return Ok(Value::Number(raw.to_string()));
            }
        }

        // Allow-listed expressions
        let rest = &self.text[self.pos..];
        for pattern in OPAQUE_PATTERNS.iter() {
            if let Some(m) = pattern.find(rest) {
                let end = self.pos + m.end();
                if self.at_value_end(end) {
                    self.pos = end;
                    return Ok(Value::Opaque(m.as_str().to_string()));
                }
            }
        }

        // _utf8mb4'...', _binary '...', N'...'
        if let Some(m) = INTRODUCER_RE.find(rest) {
            self.pos += m.end() - 1;
            let escapes = self.dialect.backslash_escapes(b'\n');
            return self.parse_string_value(escapes);
        }

        // Bare word (enum-like or boolean literal)
        if !word.is_empty() && self.at_value_end(self.pos + word.len()) {
            self.pos += word.len();
            return Ok(Value::Opaque(word.to_string()));
        }

        Err(self.unexpected("a value"))
    }

    /// Parse a quoted string starting at the opening quote.
    fn parse_string_value(&mut self, backslash_escapes: bool) -> Result<Value, String> {
        let start = self.pos;
        let quote = self.stmt[self.pos];
        self.pos += 1; // Skip opening quote

        let mut value = Vec::new();
        let mut escape_next = false;
        let mut closed = false;

        while self.pos < self.stmt.len() {
            let b = self.stmt[self.pos];

            if escape_next {
                value.push(unescape_byte(b));
                escape_next = false;
                self.pos += 1;
            } else if b == b'\\' && backslash_escapes {
                escape_next = true;
                self.pos += 1;
            } else if b == quote {
                // Doubled quote stands for itself
                if self.stmt.get(self.pos + 1) == Some(&quote) {
                    value.push(quote);
                    self.pos += 2;
                } else {
                    self.pos += 1;
                    closed = true;
                    break;
                }
            } else {
                value.push(b);
                self.pos += 1;
            }
        }

        if !closed {
            self.pos = start;
            return Err(self.unexpected("a closed string literal"));
        }

        String::from_utf8(value)
            .map(Value::Text)
            .map_err(|e| format!("invalid text in string literal: {}", e))
    }

    /// End of a numeric literal starting at `pos`, if one starts there.
    fn scan_number(&self) -> Option<usize> {
        let mut i = self.pos;
        if matches!(self.stmt.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }

        let int_start = i;
        i = self.skip_digits(i);
        let mut digits = i > int_start;

        if self.stmt.get(i) == Some(&b'.') {
            let frac_start = i + 1;
            let frac_end = self.skip_digits(frac_start);
            digits |= frac_end > frac_start;
            i = frac_end;
        }

        if !digits {
            return None;
        }

        // Exponent only counts when digits follow it
        if matches!(self.stmt.get(i), Some(b'e') | Some(b'E')) {
            let mut j = i + 1;
            if matches!(self.stmt.get(j), Some(b'+') | Some(b'-')) {
                j += 1;
            }
            let exp_end = self.skip_digits(j);
            if exp_end > j {
                i = exp_end;
            }
        }

        Some(i)
    }

    fn skip_digits(&self, mut i: usize) -> usize {
        while self.stmt.get(i).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        i
    }

    /// Whether only whitespace separates `pos` from the next `,` or `)`.
    fn at_value_end(&self, mut pos: usize) -> bool {
        while self.stmt.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        matches!(self.stmt.get(pos), Some(b',') | Some(b')'))
    }

    /// Identifier-like word starting at `pos`
    fn word_at(&self, pos: usize) -> &'a str {
        let end = self.stmt[pos..]
            .iter()
            .position(|&b| !(b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80))
            .map(|p| pos + p)
            .unwrap_or(self.stmt.len());
        &self.text[pos..end]
    }

    fn peek(&self) -> Option<u8> {
        self.stmt.get(self.pos).copied()
    }

    /// Skip whitespace and newlines
    fn skip_whitespace(&mut self) {
        while self.pos < self.stmt.len() && self.stmt[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn unexpected(&self, expected: &str) -> String {
        if self.pos >= self.stmt.len() {
            return format!("expected {} but the statement ended", expected);
        }
        let snippet: String = self.text[self.pos..].chars().take(40).collect();
        format!(
            "expected {} at byte {} of the statement body, found `{}`",
            expected, self.pos, snippet
        )
    }
}

/// MySQL escape sequences; anything else stands for itself (`\'`, `\\`).
fn unescape_byte(b: u8) -> u8 {
    match b {
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'0' => 0,
        b'b' => 0x08,
        b'Z' => 0x1A,
        _ => b,
    }
}
