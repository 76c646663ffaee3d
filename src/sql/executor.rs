use super::ast::*;
use super::parser::ParseError;
use super::Leniency;
use crate::storage::store::TableStore;
use crate::storage::table::Row;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Table not found: {0}")]
    UnknownTable(String),
    #[error("Malformed literal: {0}")]
    MalformedLiteral(String),
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),
    #[error("Unsupported clause: {0}")]
    UnsupportedClause(String),
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),
    #[error("Parse error: {0}")]
    Parse(ParseError),
}

impl From<ParseError> for ExecutionError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::MalformedLiteral { literal, .. } => ExecutionError::MalformedLiteral(literal),
            ParseError::UnknownStatement(text) => ExecutionError::UnsupportedStatement(text),
            other => ExecutionError::Parse(other),
        }
    }
}

/// Applies DDL and DML statements to a table store.
pub struct Executor<'a> {
    store: &'a mut TableStore,
    leniency: Leniency,
}

impl<'a> Executor<'a> {
    pub fn new(store: &'a mut TableStore, leniency: Leniency) -> Self {
        Self { store, leniency }
    }

    pub fn execute(&mut self, stmt: &Statement) -> Result<(), ExecutionError> {
        match stmt {
            Statement::CreateTable { name } => {
                self.store.create_table(name);
                Ok(())
            }
            Statement::DropTable { name, .. } => {
                // A missing table is not an error, with or without IF EXISTS.
                self.store.drop_table(name);
                Ok(())
            }
            Statement::Delete { table } => self.execute_delete(table),
            Statement::Insert { table, rows } => self.execute_insert(table, rows),
            Statement::Select(_) => {
                if self.leniency.is_strict() {
                    Err(ExecutionError::UnsupportedStatement(
                        "SELECT is read-only; use exec".to_string(),
                    ))
                } else {
                    debug!("SELECT passed to run ignored");
                    Ok(())
                }
            }
        }
    }

    fn execute_delete(&mut self, table: &str) -> Result<(), ExecutionError> {
        match self.store.get_table_mut(table) {
            Some(t) => {
                t.clear();
                Ok(())
            }
            None => self.unknown_table(table),
        }
    }

    fn execute_insert(&mut self, table: &str, rows: &[Vec<Literal>]) -> Result<(), ExecutionError> {
        let target = match self.store.get_table_mut(table) {
            Some(t) => t,
            None => return self.unknown_table(table),
        };

        for literals in rows {
            let values = literals.iter().cloned().map(Literal::into_value).collect();
            target.add_row(Row::new(values));
        }

        Ok(())
    }

    fn unknown_table(&self, table: &str) -> Result<(), ExecutionError> {
        if self.leniency.is_strict() {
            Err(ExecutionError::UnknownTable(table.to_lowercase()))
        } else {
            debug!(table = %table, "statement on unknown table ignored");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse_statement;
    use crate::storage::table::Value;

    fn run(store: &mut TableStore, leniency: Leniency, sql: &str) -> Result<(), ExecutionError> {
        let stmt = parse_statement(sql)?;
        Executor::new(store, leniency).execute(&stmt)
    }

    #[test]
    fn test_create_insert_delete() {
        let mut store = TableStore::new();
        run(&mut store, Leniency::Lenient, "CREATE TABLE Users (id INT PRIMARY KEY)").unwrap();
        run(&mut store, Leniency::Lenient, "INSERT INTO users VALUES (1, 'Alice', 'a@x.com', 'pw')").unwrap();
        run(&mut store, Leniency::Lenient, "INSERT INTO USERS VALUES (2, 'Bob', 'b@x.com', 'pw')").unwrap();

        let rows = store.rows("users");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[0], Value::Integer(1));
        assert_eq!(rows[1].values[1], Value::from("Bob"));

        run(&mut store, Leniency::Lenient, "DELETE FROM users").unwrap();
        assert!(store.rows("users").is_empty());
        assert!(store.contains("users"));
    }

    #[test]
    fn test_rows_are_not_width_checked() {
        let mut store = TableStore::new();
        run(&mut store, Leniency::Strict, "CREATE TABLE likes (id INT)").unwrap();
        run(&mut store, Leniency::Strict, "INSERT INTO likes VALUES (1)").unwrap();
        run(&mut store, Leniency::Strict, "INSERT INTO likes VALUES (2, 3, 4, 5, 6)").unwrap();
        assert_eq!(store.rows("likes")[1].len(), 5);
    }

    #[test]
    fn test_drop_missing_table_is_ok() {
        let mut store = TableStore::new();
        run(&mut store, Leniency::Strict, "DROP TABLE ghosts").unwrap();
        run(&mut store, Leniency::Strict, "DROP TABLE IF EXISTS ghosts").unwrap();
    }

    #[test]
    fn test_unknown_table_by_leniency() {
        let mut store = TableStore::new();
        run(&mut store, Leniency::Lenient, "INSERT INTO ghosts VALUES (1)").unwrap();
        run(&mut store, Leniency::Lenient, "DELETE FROM ghosts").unwrap();
        assert!(store.is_empty());

        assert_eq!(
            run(&mut store, Leniency::Strict, "INSERT INTO Ghosts VALUES (1)"),
            Err(ExecutionError::UnknownTable("ghosts".into()))
        );
        assert_eq!(
            run(&mut store, Leniency::Strict, "DELETE FROM ghosts"),
            Err(ExecutionError::UnknownTable("ghosts".into()))
        );
    }

    #[test]
    fn test_parse_errors_map_to_error_kinds() {
        let mut store = TableStore::new();
        assert_eq!(
            run(&mut store, Leniency::Strict, "INSERT INTO t VALUES (1 2)"),
            Err(ExecutionError::MalformedLiteral("1 2".into()))
        );
        assert_eq!(
            run(&mut store, Leniency::Strict, "TRUNCATE t"),
            Err(ExecutionError::UnsupportedStatement("TRUNCATE t".into()))
        );
    }

    #[test]
    fn test_select_through_run() {
        let mut store = TableStore::new();
        assert!(run(&mut store, Leniency::Lenient, "SELECT * FROM t").is_ok());
        assert!(matches!(
            run(&mut store, Leniency::Strict, "SELECT * FROM t"),
            Err(ExecutionError::UnsupportedStatement(_))
        ));
    }
}
