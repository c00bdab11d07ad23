//! Table schemas discovered while scanning a dump.
//!
//! This module provides:
//! - The `TableSchema` data model (table name plus ordered column names)
//! - CREATE TABLE body tokenizing for column extraction
//! - A per-file registry that keeps the first schema seen for each table

mod ddl;

pub use ddl::*;

use ahash::AHashMap;

/// Where a table's column list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    /// First CREATE TABLE statement for the table
    CreateTable,
    /// Explicit column list of the first INSERT INTO naming columns
    InsertColumns,
    /// Column list of a COPY header
    CopyHeader,
}

/// Column names of one table, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub column_names: Vec<String>,
    pub source: SchemaSource,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, column_names: Vec<String>, source: SchemaSource) -> Self {
        Self {
            table_name: table_name.into(),
            column_names,
            source,
        }
    }

    pub fn width(&self) -> usize {
        self.column_names.len()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Map an explicit column list onto this schema's positions.
    ///
    /// Returns the first name the schema does not contain as the error.
    pub fn column_positions(&self, names: &[String]) -> Result<Vec<usize>, String> {
        names
            .iter()
            .map(|name| self.column_index(name).ok_or_else(|| name.clone()))
            .collect()
    }
}

/// Schemas keyed by table name, owned by one extraction
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: AHashMap<String, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `schema` unless the table already has one. Returns whether it
    /// was stored.
    pub fn register(&mut self, schema: TableSchema) -> bool {
        use std::collections::hash_map::Entry;

        match self.tables.entry(schema.table_name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(schema);
                true
            }
        }
    }

    pub fn get(&self, table_name: &str) -> Option<&TableSchema> {
        self.tables.get(table_name)
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }
}
