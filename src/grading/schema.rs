use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::problem::ProblemError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Please provide a table name")]
    MissingTableName,
    #[error("Please provide at least one column with a name")]
    NoColumns,
    #[error("Please designate at least one column as PRIMARY KEY")]
    NoPrimaryKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub ty: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
}

fn default_column_type() -> String {
    "VARCHAR(255)".to_string()
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_primary_key: false,
            is_foreign_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.is_foreign_key = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNode {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl TableNode {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    fn to_ddl(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                let mut def = format!("  {} {}", col.name, col.ty);
                if col.is_primary_key {
                    def.push_str(" PRIMARY KEY");
                }
                def
            })
            .collect();
        format!("CREATE TABLE {} (\n{}\n);\n\n", self.name, columns.join(",\n"))
    }
}

/// A learner-authored schema: table nodes in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisualSchema {
    pub tables: Vec<TableNode>,
}

/// Schema JSON as written, before the authoring rules are applied.
#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    tables: Vec<TableNode>,
}

impl VisualSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a schema through `add_table`, so a file is held to the same
    /// rules as interactive authoring.
    pub fn from_json(json: &str) -> Result<Self, ProblemError> {
        let file: SchemaFile = serde_json::from_str(json)?;
        let mut schema = Self::new();
        for table in file.tables {
            schema.add_table(&table.name, table.columns)?;
        }
        Ok(schema)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProblemError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Name of the first table, which receives flat seed data.
    pub fn first_table(&self) -> Option<&str> {
        self.tables.first().map(|t| t.name.as_str())
    }

    /// Adds a table after validating it. Blank-named columns are dropped.
    pub fn add_table(&mut self, name: &str, columns: Vec<ColumnSpec>) -> Result<(), SchemaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SchemaError::MissingTableName);
        }

        let columns: Vec<ColumnSpec> = columns
            .into_iter()
            .filter(|c| !c.name.trim().is_empty())
            .collect();
        if columns.is_empty() {
            return Err(SchemaError::NoColumns);
        }
        if !columns.iter().any(|c| c.is_primary_key) {
            return Err(SchemaError::NoPrimaryKey);
        }

        self.tables.push(TableNode::new(name, columns));
        Ok(())
    }

    /// Lower-cased table names with their lower-cased column names.
    pub fn normalized_tables(&self) -> Vec<(String, Vec<String>)> {
        self.tables
            .iter()
            .map(|t| {
                let columns = t.columns.iter().map(|c| c.name.to_lowercase()).collect();
                (t.name.to_lowercase(), columns)
            })
            .collect()
    }

    /// Generates the DDL script for every table. Empty for an empty schema.
    pub fn to_ddl(&self) -> String {
        if self.tables.is_empty() {
            return String::new();
        }
        let mut sql = String::from("-- Database Schema\n\n");
        for table in &self.tables {
            sql.push_str(&table.to_ddl());
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("id", "INT").primary_key(),
            ColumnSpec::new("name", "VARCHAR(255)"),
        ]
    }

    #[test]
    fn test_add_table_validation() {
        let mut schema = VisualSchema::new();
        assert_eq!(
            schema.add_table("  ", users_columns()),
            Err(SchemaError::MissingTableName)
        );
        assert_eq!(
            schema.add_table("users", vec![ColumnSpec::new(" ", "INT").primary_key()]),
            Err(SchemaError::NoColumns)
        );
        assert_eq!(
            schema.add_table("users", vec![ColumnSpec::new("id", "INT")]),
            Err(SchemaError::NoPrimaryKey)
        );
        assert!(schema.is_empty());
    }

    #[test]
    fn test_blank_primary_key_column_does_not_count() {
        let mut schema = VisualSchema::new();
        let columns = vec![
            ColumnSpec::new("", "INT").primary_key(),
            ColumnSpec::new("id", "INT"),
        ];
        assert_eq!(schema.add_table("users", columns), Err(SchemaError::NoPrimaryKey));
    }

    #[test]
    fn test_add_table_drops_blank_columns() {
        let mut schema = VisualSchema::new();
        let mut columns = users_columns();
        columns.push(ColumnSpec::new("", "INT"));
        schema.add_table(" users ", columns).unwrap();

        assert_eq!(schema.first_table(), Some("users"));
        assert_eq!(schema.tables[0].columns.len(), 2);
    }

    #[test]
    fn test_to_ddl() {
        let mut schema = VisualSchema::new();
        assert_eq!(schema.to_ddl(), "");

        schema.add_table("users", users_columns()).unwrap();
        schema
            .add_table(
                "orders",
                vec![
                    ColumnSpec::new("id", "INT").primary_key(),
                    ColumnSpec::new("customer_id", "INT").foreign_key(),
                ],
            )
            .unwrap();

        assert_eq!(
            schema.to_ddl(),
            "-- Database Schema\n\n\
             CREATE TABLE users (\n  id INT PRIMARY KEY,\n  name VARCHAR(255)\n);\n\n\
             CREATE TABLE orders (\n  id INT PRIMARY KEY,\n  customer_id INT\n);\n\n"
        );
    }

    #[test]
    fn test_schema_json() {
        let json = r#"{"tables": [{"name": "Users", "columns": [
            {"name": "ID", "type": "INT", "isPrimaryKey": true},
            {"name": "Email"}
        ]}]}"#;
        let schema = VisualSchema::from_json(json).unwrap();
        assert_eq!(schema.tables[0].columns[1].ty, "VARCHAR(255)");
        assert!(!schema.tables[0].columns[1].is_foreign_key);
        assert_eq!(
            schema.normalized_tables(),
            vec![("users".to_string(), vec!["id".to_string(), "email".to_string()])]
        );
    }

    #[test]
    fn test_schema_json_is_validated() {
        let blank = r#"{"tables": [
            {"name": "", "columns": []},
            {"name": "users", "columns": [{"name": "id"}]}
        ]}"#;
        assert!(matches!(
            VisualSchema::from_json(blank),
            Err(ProblemError::Schema(SchemaError::MissingTableName))
        ));

        let no_key = r#"{"tables": [{"name": "users", "columns": [{"name": "id"}]}]}"#;
        assert!(matches!(
            VisualSchema::from_json(no_key),
            Err(ProblemError::Schema(SchemaError::NoPrimaryKey))
        ));

        let no_columns = r#"{"tables": [{"name": "users"}]}"#;
        assert!(matches!(
            VisualSchema::from_json(no_columns),
            Err(ProblemError::Schema(SchemaError::NoColumns))
        ));
    }

    #[test]
    fn test_schema_json_trims_like_add_table() {
        let json = r#"{"tables": [{"name": " users ", "columns": [
            {"name": "id", "type": "INT", "isPrimaryKey": true},
            {"name": "  "}
        ]}]}"#;
        let schema = VisualSchema::from_json(json).unwrap();
        assert_eq!(schema.first_table(), Some("users"));
        assert_eq!(schema.tables[0].columns.len(), 1);
    }
}
