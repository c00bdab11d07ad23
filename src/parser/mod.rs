pub mod mysql_insert;
pub mod postgres_copy;


use crate::error::ExtractError;
use crate::faults::{truncate_context, DEFAULT_MAX_CONTEXT_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use tracing::{debug, warn};

pub use mysql_insert::{parse_insert, InsertStatement, Value, ValueTuple};
pub use postgres_copy::{parse_copy_header, parse_copy_row, CopyHeader};

/// Bounded size of each read drawn from the decoded text stream.
pub const READ_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Sentinel line closing a bulk COPY block.
pub const COPY_END_MARKER: &str = "\\.";

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+TABLE(?:\s+IF\s+NOT\s+EXISTS)?(?:\s+|$)").unwrap()
});

static INSERT_INTO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*INSERT\s+INTO(?:\s+|$)").unwrap());

static COPY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*COPY(?:\s+|$)").unwrap());

static FROM_STDIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\s+stdin\b").unwrap());

static DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*DELIMITER\s+(\S+)\s*$").unwrap());

static STANDARD_STRINGS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^SET\s+(?:SESSION\s+|LOCAL\s+)?standard_conforming_strings\s*(?:=|\s+TO\b)\s*'?(on|off)'?",
    )
    .unwrap()
});

/// Grammar flavour of the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    /// Accept MySQL and PostgreSQL constructs alike.
    #[default]
    Auto,
    /// Backtick identifiers, backslash escapes, no COPY blocks.
    MySql,
    /// COPY blocks, standard strings (backslash escapes only in `E'...'`).
    Postgres,
}

impl SqlDialect {
    pub fn supports_bulk_copy(self) -> bool {
        !matches!(self, SqlDialect::MySql)
    }

    /// `$tag$ ... $tag$` strings, as used by pg_dump for function bodies.
    pub fn supports_dollar_quotes(self) -> bool {
        !matches!(self, SqlDialect::MySql)
    }

    /// Whether a backslash escapes the next character inside a string that
    /// was opened right after `prev`.
    pub fn backslash_escapes(self, prev: u8) -> bool {
        match self {
            SqlDialect::Postgres => prev == b'E' || prev == b'e',
            SqlDialect::Auto | SqlDialect::MySql => true,
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SqlDialect::Auto),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres),
            _ => Err(format!(
                "unknown dialect '{}' (expected auto, mysql or postgres)",
                s
            )),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Auto => write!(f, "auto"),
            SqlDialect::MySql => write!(f, "mysql"),
            SqlDialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// Kind of statement being accumulated, decided from its first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    CreateTable,
    InsertInto,
    BulkCopyHeader,
    BulkCopyRow,
    BulkCopyEnd,
    Unrecognized,
}

impl StatementKind {
    /// Cheap keyword check against the start of a line.
    pub fn detect(line: &str, dialect: SqlDialect) -> Self {
        if INSERT_INTO_RE.is_match(line) {
            StatementKind::InsertInto
        } else if CREATE_TABLE_RE.is_match(line) {
            StatementKind::CreateTable
        } else if dialect.supports_bulk_copy() && COPY_RE.is_match(line) {
            StatementKind::BulkCopyHeader
        } else {
            StatementKind::Unrecognized
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::InsertInto => "INSERT INTO",
            StatementKind::BulkCopyHeader => "COPY",
            StatementKind::BulkCopyRow | StatementKind::BulkCopyEnd => "COPY data",
            StatementKind::Unrecognized => "unrecognized",
        }
    }
}

/// Text collected since the end of the previous statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    pub kind: StatementKind,
    pub text: String,
    /// Cumulative offset in the decoded text at which the statement ends.
    pub end_offset: u64,
}

/// A classified statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable { table_name: String, body_text: String },
    InsertInto { table_name: String, body_text: String },
    BulkCopyHeader { table_name: String, column_names: Vec<String> },
    BulkCopyRow { raw_fields: Vec<String> },
    BulkCopyEnd,
    Unrecognized,
}

impl Statement {
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Statement::CreateTable { table_name, .. }
            | Statement::InsertInto { table_name, .. }
            | Statement::BulkCopyHeader { table_name, .. } => Some(table_name),
            _ => None,
        }
    }
}

/// Label an assembled statement, extracting the table name.
///
/// Statements whose keyword matched but whose table name cannot be read are
/// `Unrecognized`.
pub fn classify(raw: &RawStatement) -> Statement {
    match raw.kind {
        StatementKind::CreateTable => after_keyword(&CREATE_TABLE_RE, &raw.text)
            .and_then(parse_qualified_name)
            .map(|(table_name, rest)| Statement::CreateTable {
                table_name,
                body_text: rest.to_string(),
            })
            .unwrap_or(Statement::Unrecognized),
        StatementKind::InsertInto => after_keyword(&INSERT_INTO_RE, &raw.text)
            .and_then(parse_qualified_name)
            .map(|(table_name, rest)| Statement::InsertInto {
                table_name,
                body_text: rest.to_string(),
            })
            .unwrap_or(Statement::Unrecognized),
        StatementKind::BulkCopyHeader => {
            if !FROM_STDIN_RE.is_match(&raw.text) {
                return Statement::Unrecognized;
            }
            after_keyword(&COPY_RE, &raw.text)
                .and_then(parse_copy_header)
                .map(|header| Statement::BulkCopyHeader {
                    table_name: header.table_name,
                    column_names: header.column_names,
                })
                .unwrap_or(Statement::Unrecognized)
        }
        StatementKind::BulkCopyRow => Statement::BulkCopyRow {
            raw_fields: raw.text.split('\t').map(str::to_string).collect(),
        },
        StatementKind::BulkCopyEnd => Statement::BulkCopyEnd,
        StatementKind::Unrecognized => Statement::Unrecognized,
    }
}

fn after_keyword<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.find(text).map(|m| &text[m.end()..])
}

/// Quote, comment and bracket balance of the statement being accumulated.
#[derive(Debug)]
struct Balance {
    dialect: SqlDialect,
    quote: Option<u8>,
    quote_escapes: bool,
    escaped: bool,
    /// Closing tag of an open `$tag$ ... $tag$` string
    dollar_tag: Option<String>,
    block_comment: bool,
    depth: i64,
    prev: u8,
    /// Anything besides whitespace and comments seen yet
    code_seen: bool,
}

impl Balance {
    fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            quote: None,
            quote_escapes: false,
            escaped: false,
            dollar_tag: None,
            block_comment: false,
            depth: 0,
            prev: b'\n',
            code_seen: false,
        }
    }

    /// Outside of any string or comment.
    fn is_idle(&self) -> bool {
        self.quote.is_none() && self.dollar_tag.is_none() && !self.block_comment
    }

    /// Feed one line; returns the index just past the terminating delimiter
    /// when it occurs outside quotes and comments at bracket depth zero.
    ///
    /// A statement consisting only of comments (or a psql meta-command) ends
    /// with its line.
    fn scan(&mut self, line: &str, delimiter: &str) -> Option<usize> {
        let bytes = line.as_bytes();
        let delimiter = delimiter.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if self.block_comment {
                let pos = find(&bytes[i..], b"*/")?;
                i += pos + 2;
                self.block_comment = false;
                self.prev = b' ';
                if !self.code_seen && bytes[i..].iter().all(u8::is_ascii_whitespace) {
                    return Some(bytes.len());
                }
                continue;
            }

            if let Some(tag) = &self.dollar_tag {
                let pos = find(&bytes[i..], tag.as_bytes())?;
                i += pos + tag.len();
                self.dollar_tag = None;
                self.prev = b'$';
                continue;
            }

            let b = bytes[i];

            if let Some(q) = self.quote {
                i += 1;
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' && self.quote_escapes {
                    self.escaped = true;
                } else if b == q {
                    self.quote = None;
                }
                self.prev = b;
                continue;
            }

            if self.depth <= 0 && bytes[i..].starts_with(delimiter) {
                return Some(i + delimiter.len());
            }
            i += 1;

            match b {
                b'\'' | b'"' | b'`' => {
                    self.quote = Some(b);
                    self.quote_escapes = b != b'`' && self.dialect.backslash_escapes(self.prev);
                }
                b'-' if bytes.get(i) == Some(&b'-') => {
                    // Line comment: nothing after it can open a quote
                    self.prev = b'\n';
                    return (!self.code_seen).then_some(bytes.len());
                }
                b'#' | b'\\' if !self.code_seen => return Some(bytes.len()),
                b'/' if bytes.get(i) == Some(&b'*') => {
                    self.block_comment = true;
                    i += 1;
                    continue;
                }
                b'$' if self.dialect.supports_dollar_quotes() && !is_identifier_byte(self.prev) => {
                    if let Some(len) = dollar_tag_len(&bytes[i - 1..]) {
                        self.dollar_tag = Some(line[i - 1..i - 1 + len].to_string());
                        self.code_seen = true;
                        i += len - 1;
                        continue;
                    }
                }
                b'(' => self.depth += 1,
                b')' => self.depth -= 1,
                _ => {}
            }
            if !b.is_ascii_whitespace() {
                self.code_seen = true;
            }
            self.prev = b;
        }

        None
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Length of a `$tag$` opener at the start of `bytes`, if there is one.
fn dollar_tag_len(bytes: &[u8]) -> Option<usize> {
    let mut j = 1;
    while let Some(&b) = bytes.get(j) {
        if b == b'$' {
            return Some(j + 1);
        }
        if !(b.is_ascii_alphanumeric() || b == b'_') || (j == 1 && b.is_ascii_digit()) {
            return None;
        }
        j += 1;
    }
    None
}

/// New statement delimiter from a client-side `DELIMITER xx` line.
fn parse_delimiter_command(line: &str) -> Option<String> {
    let caps = DELIMITER_RE.captures(line)?;
    Some(caps[1].to_string())
}

struct OpenStatement {
    kind: StatementKind,
    text: String,
    balance: Balance,
}

/// Turns a text stream into complete statements, one forward pass.
///
/// A statement closes only on the delimiter (`;` unless changed with
/// `DELIMITER`) seen outside quotes and comments at bracket depth zero.
/// Inside a COPY block every line is its own row until `\.`.
pub struct StatementReader<R: BufRead> {
    reader: R,
    /// Dialect requested by the caller
    base_dialect: SqlDialect,
    /// Dialect in effect after session settings seen so far
    dialect: SqlDialect,
    delimiter: String,
    line_buf: Vec<u8>,
    pending: Option<String>,
    open: Option<OpenStatement>,
    in_copy: bool,
    offset: u64,
    last_complete_offset: u64,
}

impl<R: BufRead> StatementReader<R> {
    pub fn new(reader: R, dialect: SqlDialect) -> Self {
        Self {
            reader,
            base_dialect: dialect,
            dialect,
            delimiter: ";".to_string(),
            line_buf: Vec::with_capacity(64 * 1024),
            pending: None,
            open: None,
            in_copy: false,
            offset: 0,
            last_complete_offset: 0,
        }
    }

    /// Bytes of decoded text consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Dialect to tokenize the statements read so far with. An `Auto` reader
    /// switches to standard strings once the dump turns on
    /// `standard_conforming_strings`.
    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn next_statement(&mut self) -> Result<Option<RawStatement>, ExtractError> {
        loop {
            let line = match self.next_line()? {
                Some(line) => line,
                None => return self.finish(),
            };

            if self.in_copy {
                self.offset += line.len() as u64;
                self.last_complete_offset = self.offset;
                let row = line.trim_end_matches(['\r', '\n']);
                if row == COPY_END_MARKER {
                    self.in_copy = false;
                    return Ok(Some(self.complete(StatementKind::BulkCopyEnd, row.to_string())));
                }
                return Ok(Some(self.complete(StatementKind::BulkCopyRow, row.to_string())));
            }

            let mut open = match self.open.take() {
                Some(open) => open,
                None => {
                    if line.trim().is_empty() {
                        self.offset += line.len() as u64;
                        self.last_complete_offset = self.offset;
                        continue;
                    }
                    if let Some(delimiter) = parse_delimiter_command(&line) {
                        self.offset += line.len() as u64;
                        self.last_complete_offset = self.offset;
                        debug!(delimiter = %delimiter, "statement delimiter changed");
                        self.delimiter = delimiter;
                        let text = line.trim().to_string();
                        return Ok(Some(self.complete(StatementKind::Unrecognized, text)));
                    }
                    OpenStatement {
                        kind: StatementKind::detect(&line, self.dialect),
                        text: String::new(),
                        balance: Balance::new(self.dialect),
                    }
                }
            };

            match open.balance.scan(&line, &self.delimiter) {
                Some(end) => {
                    let (head, tail) = line.split_at(end);
                    open.text.push_str(head);
                    self.offset += head.len() as u64;
                    if tail.trim().is_empty() {
                        self.offset += tail.len() as u64;
                    } else {
                        self.pending = Some(tail.to_string());
                    }
                    self.last_complete_offset = self.offset;

                    let text = open.text.trim().to_string();
                    match open.kind {
                        StatementKind::BulkCopyHeader if FROM_STDIN_RE.is_match(&text) => {
                            self.in_copy = true;
                        }
                        StatementKind::Unrecognized => self.apply_session_setting(&text),
                        _ => {}
                    }
                    return Ok(Some(self.complete(open.kind, text)));
                }
                None => {
                    open.text.push_str(&line);
                    self.offset += line.len() as u64;
                    self.open = Some(open);
                }
            }
        }
    }

    fn apply_session_setting(&mut self, text: &str) {
        if self.base_dialect != SqlDialect::Auto {
            return;
        }
        if let Some(caps) = STANDARD_STRINGS_RE.captures(text) {
            let on = caps[1].eq_ignore_ascii_case("on");
            self.dialect = if on {
                SqlDialect::Postgres
            } else {
                SqlDialect::Auto
            };
            debug!(standard_conforming_strings = on, "string escape mode changed");
        }
    }

    fn complete(&self, kind: StatementKind, text: String) -> RawStatement {
        RawStatement {
            kind,
            text,
            end_offset: self.offset,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, ExtractError> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }

        self.line_buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.line_buf)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.line_buf).into_owned()))
    }

    fn finish(&mut self) -> Result<Option<RawStatement>, ExtractError> {
        if let Some(open) = self.open.take() {
            let text = open.text.trim();
            if !text.is_empty() {
                // A data-free statement missing only its delimiter costs nothing
                if open.kind == StatementKind::Unrecognized && open.balance.is_idle() {
                    warn!(offset = self.offset, "statement without delimiter at end of input");
                    return Ok(Some(
                        self.complete(StatementKind::Unrecognized, text.to_string()),
                    ));
                }
                return Err(ExtractError::UnterminatedStatement {
                    kind: open.kind.label(),
                    last_offset: self.last_complete_offset,
                    length: open.text.len(),
                    fragment: truncate_context(text, DEFAULT_MAX_CONTEXT_CHARS),
                });
            }
        }

        if self.in_copy {
            self.in_copy = false;
            return Err(ExtractError::UnterminatedStatement {
                kind: StatementKind::BulkCopyRow.label(),
                last_offset: self.last_complete_offset,
                length: 0,
                fragment: format!("missing {} before end of input", COPY_END_MARKER),
            });
        }

        Ok(None)
    }
}

/// Read a possibly schema-qualified identifier and return its last
/// component together with the remaining text.
pub fn parse_qualified_name(text: &str) -> Option<(String, &str)> {
    let mut rest = text.trim_start();

    loop {
        let (name, after) = parse_identifier(rest)?;
        let trimmed = after.trim_start();
        match trimmed.strip_prefix('.') {
            Some(next) => rest = next.trim_start(),
            None => return Some((name, after)),
        }
    }
}

/// Read one identifier, unquoting backticks, double quotes or brackets.
pub fn parse_identifier(text: &str) -> Option<(String, &str)> {
    let bytes = text.as_bytes();
    let first = *bytes.first()?;

    let close = match first {
        b'`' | b'"' => first,
        b'[' => b']',
        _ => {
            let end = bytes
                .iter()
                .position(|&b| !is_identifier_byte(b))
                .unwrap_or(bytes.len());
            if end == 0 {
                return None;
            }
            return Some((text[..end].to_string(), &text[end..]));
        }
    };

    let mut name = String::new();
    let mut start = 1;
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == close {
            // A doubled closing quote stands for itself
            if bytes.get(i + 1) == Some(&close) && close != b']' {
                name.push_str(&text[start..=i]);
                i += 2;
                start = i;
                continue;
            }
            name.push_str(&text[start..i]);
            return Some((name, &text[i + 1..]));
        }
        i += 1;
    }
    None
}

/// Parse a parenthesised identifier list such as `(`id`, "name", email)`.
///
/// Returns the names and the text after the closing parenthesis.
pub fn parse_identifier_list(text: &str) -> Option<(Vec<String>, &str)> {
    let mut rest = text.trim_start().strip_prefix('(')?;
    let mut names = Vec::new();

    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix(')') {
            return Some((names, after));
        }
        let (name, after) = parse_identifier(rest)?;
        names.push(name);
        rest = after.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after;
        } else if !rest.starts_with(')') {
            return None;
        }
    }
}

#[inline]
fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(sql: &str, dialect: SqlDialect) -> Vec<RawStatement> {
        let mut reader = StatementReader::new(sql.as_bytes(), dialect);
        let mut out = Vec::new();
        while let Some(stmt) = reader.next_statement().unwrap() {
            out.push(stmt);
        }
        out
    }

    fn raw(kind: StatementKind, text: &str) -> RawStatement {
        RawStatement {
            kind,
            text: text.to_string(),
            end_offset: 0,
        }
    }

    #[test]
    fn test_classify_create_table() {
        let stmt = classify(&raw(StatementKind::CreateTable, "CREATE TABLE users (id INT);"));
        assert_eq!(
            stmt,
            Statement::CreateTable {
                table_name: "users".to_string(),
                body_text: " (id INT);".to_string()
            }
        );
    }

    #[test]
    fn test_classify_create_table_backticks_if_not_exists() {
        let stmt = classify(&raw(
            StatementKind::CreateTable,
            "create table if not exists `my_table` (id INT);",
        ));
        assert_eq!(stmt.table_name(), Some("my_table"));
    }

    #[test]
    fn test_classify_insert_schema_qualified() {
        let stmt = classify(&raw(
            StatementKind::InsertInto,
            "INSERT INTO public.\"comments\" VALUES (1);",
        ));
        assert_eq!(stmt.table_name(), Some("comments"));
    }

    #[test]
    fn test_classify_copy_header() {
        let stmt = classify(&raw(
            StatementKind::BulkCopyHeader,
            "COPY public.users (id, name) FROM stdin;",
        ));
        assert_eq!(
            stmt,
            Statement::BulkCopyHeader {
                table_name: "users".to_string(),
                column_names: vec!["id".to_string(), "name".to_string()],
            }
        );
    }

    #[test]
    fn test_classify_copy_to_stdout_is_unrecognized() {
        let stmt = classify(&raw(StatementKind::BulkCopyHeader, "COPY users TO stdout;"));
        assert_eq!(stmt, Statement::Unrecognized);
    }

    #[test]
    fn test_detect_kinds() {
        assert_eq!(
            StatementKind::detect("insert into t values (1);", SqlDialect::Auto),
            StatementKind::InsertInto
        );
        assert_eq!(
            StatementKind::detect("  CREATE TABLE t (", SqlDialect::Auto),
            StatementKind::CreateTable
        );
        assert_eq!(
            StatementKind::detect("DROP TABLE t;", SqlDialect::Auto),
            StatementKind::Unrecognized
        );
        assert_eq!(
            StatementKind::detect("COPY t (a) FROM stdin;", SqlDialect::MySql),
            StatementKind::Unrecognized
        );
        assert_eq!(
            StatementKind::detect("CREATE TABLESPACE ts;", SqlDialect::Auto),
            StatementKind::Unrecognized
        );
    }

    #[test]
    fn test_read_statement_basic() {
        let stmts = read_all(
            "CREATE TABLE t1 (id INT);\nINSERT INTO t1 VALUES (1);\n",
            SqlDialect::Auto,
        );
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].kind, StatementKind::CreateTable);
        assert_eq!(stmts[0].text, "CREATE TABLE t1 (id INT);");
        assert_eq!(stmts[1].text, "INSERT INTO t1 VALUES (1);");
        assert_eq!(stmts[1].end_offset, 53);
    }

    #[test]
    fn test_read_statement_with_strings() {
        let stmts = read_all("INSERT INTO t1 VALUES ('hello; world');\n", SqlDialect::Auto);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].text, "INSERT INTO t1 VALUES ('hello; world');");
    }

    #[test]
    fn test_read_statement_with_escaped_quotes() {
        let stmts = read_all("INSERT INTO t1 VALUES ('it\\'s a test');\n", SqlDialect::Auto);
        assert_eq!(stmts[0].text, "INSERT INTO t1 VALUES ('it\\'s a test');");
    }

    #[test]
    fn test_unrecognized_lines_are_passed_through() {
        let stmts = read_all("-- comment\n\nSET NAMES utf8;\n", SqlDialect::Auto);
        assert_eq!(stmts.len(), 2);
        assert!(stmts.iter().all(|s| s.kind == StatementKind::Unrecognized));
    }

    #[test]
    fn test_parse_identifier_list() {
        let (names, rest) = parse_identifier_list("(`id`, \"na\"\"me\", email) VALUES").unwrap();
        assert_eq!(names, vec!["id", "na\"me", "email"]);
        assert_eq!(rest, " VALUES");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("MySQL".parse::<SqlDialect>().unwrap(), SqlDialect::MySql);
        assert_eq!("pg".parse::<SqlDialect>().unwrap(), SqlDialect::Postgres);
        assert!("oracle".parse::<SqlDialect>().is_err());
    }
}
