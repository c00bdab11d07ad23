//! Unit tests for CREATE TABLE column extraction and the schema registry.

use sqldump_extract::parser::{classify, SqlDialect, Statement, StatementReader};
use sqldump_extract::schema::{parse_column_names, SchemaRegistry, SchemaSource, TableSchema};

fn create_table_columns(sql: &str) -> (String, Vec<String>) {
    let mut reader = StatementReader::new(sql.as_bytes(), SqlDialect::Auto);
    let raw = reader.next_statement().unwrap().unwrap();
    match classify(&raw) {
        Statement::CreateTable {
            table_name,
            body_text,
        } => (table_name, parse_column_names(&body_text)),
        other => panic!("expected CREATE TABLE, got {:?}", other),
    }
}

#[test]
fn test_constraint_clause_contributes_no_columns() {
    let (table, columns) =
        create_table_columns("CREATE TABLE t (a INT, b VARCHAR(10), PRIMARY KEY(a));\n");
    assert_eq!(table, "t");
    assert_eq!(columns, vec!["a", "b"]);
}

#[test]
fn test_postgres_table_with_constraints() {
    let sql = "\
CREATE TABLE IF NOT EXISTS public.orders (
    id bigint NOT NULL,
    user_id integer REFERENCES users(id),
    total numeric(10,2) DEFAULT 0.00,
    status character varying(20) DEFAULT 'new'::character varying,
    CONSTRAINT orders_pkey PRIMARY KEY (id),
    CONSTRAINT positive CHECK (total >= 0),
    EXCLUDE USING gist (id WITH =)
);
";
    let (table, columns) = create_table_columns(sql);
    assert_eq!(table, "orders");
    assert_eq!(columns, vec!["id", "user_id", "total", "status"]);
}

#[test]
fn test_mysql_indexes_skipped() {
    let sql = "CREATE TABLE `posts` (\n  `id` int,\n  `body` text,\n  FULLTEXT KEY `ft` (`body`),\n  INDEX `i` (`id`),\n  UNIQUE (`id`, `body`)\n);\n";
    let (_, columns) = create_table_columns(sql);
    assert_eq!(columns, vec!["id", "body"]);
}

#[test]
fn test_no_columns_means_no_schema() {
    let (_, columns) = create_table_columns("CREATE TABLE copy_of LIKE original;\n");
    assert!(columns.is_empty());
}

#[test]
fn test_registry_first_create_table_wins() {
    let mut registry = SchemaRegistry::new();
    assert!(!registry.contains("users"));

    registry.register(TableSchema::new(
        "users",
        vec!["id".to_string(), "name".to_string()],
        SchemaSource::CreateTable,
    ));
    registry.register(TableSchema::new(
        "users",
        vec!["other".to_string()],
        SchemaSource::CreateTable,
    ));

    let schema = registry.get("users").unwrap();
    assert_eq!(schema.column_names, vec!["id", "name"]);
    assert_eq!(schema.source, SchemaSource::CreateTable);
    assert!(registry.get("posts").is_none());
}
