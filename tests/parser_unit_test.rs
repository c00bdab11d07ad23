//! Unit tests for the statement reader, classifier and value tokenizers.

use sqldump_extract::parser::{
    classify, parse_copy_row, parse_insert, RawStatement, SqlDialect, Statement, StatementKind,
    StatementReader, Value,
};

fn read_all(sql: &str) -> Vec<RawStatement> {
    let mut reader = StatementReader::new(sql.as_bytes(), SqlDialect::Auto);
    let mut out = Vec::new();
    while let Some(stmt) = reader.next_statement().unwrap() {
        out.push(stmt);
    }
    out
}

fn insert_body(sql: &str) -> String {
    let stmts = read_all(sql);
    match classify(&stmts[0]) {
        Statement::InsertInto { body_text, .. } => body_text,
        other => panic!("expected an insert, got {:?}", other),
    }
}

#[test]
fn test_mysqldump_fragment() {
    let sql = "\
-- MySQL dump 10.13
/*!40101 SET NAMES utf8 */;
DROP TABLE IF EXISTS `users`;
CREATE TABLE `users` (
  `id` int(11) NOT NULL,
  `name` varchar(64) DEFAULT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB;
LOCK TABLES `users` WRITE;
INSERT INTO `users` VALUES (1,'Alice'),(2,'Bob');
UNLOCK TABLES;
";
    let classified: Vec<Statement> = read_all(sql).iter().map(classify).collect();
    let interesting: Vec<_> = classified
        .iter()
        .filter(|s| !matches!(s, Statement::Unrecognized))
        .collect();

    assert_eq!(interesting.len(), 2);
    assert_eq!(interesting[0].table_name(), Some("users"));
    assert!(matches!(interesting[1], Statement::InsertInto { .. }));
}

#[test]
fn test_quoted_comma_yields_three_values() {
    let body = insert_body("INSERT INTO t VALUES (1,'two','three, four');\n");
    let insert = parse_insert(&body, SqlDialect::Auto).unwrap();
    assert_eq!(insert.tuples.len(), 1);
    assert_eq!(insert.tuples[0].len(), 3);
    assert_eq!(insert.tuples[0][2], Value::Text("three, four".to_string()));
}

#[test]
fn test_terminator_inside_string_does_not_close() {
    let sql = "INSERT INTO t VALUES (1,'a);\nINSERT INTO t VALUES (2');\nINSERT INTO t VALUES (3,'b');\n";
    let stmts = read_all(sql);
    assert_eq!(stmts.len(), 2);

    let insert = parse_insert(&insert_body(sql), SqlDialect::Auto).unwrap();
    assert_eq!(
        insert.tuples[0][1],
        Value::Text("a);\nINSERT INTO t VALUES (2".to_string())
    );
}

#[test]
fn test_statement_kinds_and_offsets() {
    let sql = "CREATE TABLE a (x INT);\nSET x=1;\nINSERT INTO a VALUES (1);\n";
    let stmts = read_all(sql);
    let kinds: Vec<_> = stmts.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StatementKind::CreateTable,
            StatementKind::Unrecognized,
            StatementKind::InsertInto
        ]
    );
    assert!(stmts.windows(2).all(|w| w[0].end_offset < w[1].end_offset));
    assert_eq!(stmts[2].end_offset, sql.len() as u64);
}

#[test]
fn test_pg_dump_fragment() {
    let sql = "\
SET statement_timeout = 0;
CREATE TABLE public.users (
    id integer NOT NULL,
    name text
);
COPY public.users (id, name) FROM stdin;
1\tAlice
2\t\\N
3\t
\\.
";
    let classified: Vec<Statement> = read_all(sql).iter().map(classify).collect();
    let rows: Vec<_> = classified
        .iter()
        .filter_map(|s| match s {
            Statement::BulkCopyRow { raw_fields } => Some(parse_copy_row(raw_fields)),
            _ => None,
        })
        .collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][1], Value::Null);
    assert_eq!(rows[2][1], Value::Text(String::new()));
    assert_ne!(rows[1][1], rows[2][1]);
}

#[test]
fn test_insert_with_column_list_and_schema_prefix() {
    let body = insert_body("INSERT INTO db.`users` (`id`,`name`) VALUES (1,'x');\n");
    let insert = parse_insert(&body, SqlDialect::MySql).unwrap();
    assert_eq!(
        insert.columns,
        Some(vec!["id".to_string(), "name".to_string()])
    );
}

#[test]
fn test_malformed_tuple_is_an_error_not_a_panic() {
    for body in [
        " VALUES (1,",
        " VALUES (1 2);",
        " VALUES 1, 2;",
        " VALUES (now());",
        "",
    ] {
        assert!(parse_insert(body, SqlDialect::Auto).is_err(), "accepted {:?}", body);
    }
}
