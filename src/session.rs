//! The engine object: one table store, one catalog, and the options that
//! decide how forgiving evaluation is. Every grading run owns its own
//! session; nothing is shared between sessions.

use tracing::debug;

use crate::sql::ast::Statement;
use crate::sql::executor::{ExecutionError, Executor};
use crate::sql::parser::parse_statement;
use crate::sql::planner::Planner;
use crate::sql::query::QueryEvaluator;
use crate::sql::EngineOptions;
use crate::storage::catalog::Catalog;
use crate::storage::store::TableStore;
use crate::storage::table::ResultSet;

#[derive(Debug, Default)]
pub struct Session {
    store: TableStore,
    catalog: Catalog,
    options: EngineOptions,
}

impl Session {
    pub fn new(catalog: Catalog, options: EngineOptions) -> Self {
        Self {
            store: TableStore::new(),
            catalog,
            options,
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Executes one DDL/DML statement. In lenient mode anything that cannot
    /// be parsed or applied is logged and skipped.
    pub fn run(&mut self, sql: &str) -> Result<(), ExecutionError> {
        let result = parse_statement(sql)
            .map_err(ExecutionError::from)
            .and_then(|stmt| Executor::new(&mut self.store, self.options.leniency).execute(&stmt));

        match result {
            Ok(()) => {
                debug!(statement = %sql.trim(), "statement executed");
                Ok(())
            }
            Err(err) if !self.options.leniency.is_strict() => {
                debug!(error = %err, statement = %sql.trim(), "statement ignored");
                Ok(())
            }
            other => other,
        }
    }

    /// Runs each statement of a `;`-separated script in order and returns
    /// how many non-empty fragments were executed.
    pub fn run_script(&mut self, script: &str) -> Result<usize, ExecutionError> {
        let statements = split_script(script);
        for statement in &statements {
            self.run(statement)?;
        }
        Ok(statements.len())
    }

    /// Evaluates a read-only statement. Non-SELECT input yields no result
    /// sets; a SELECT yields exactly one.
    pub fn exec(&self, sql: &str) -> Result<Vec<ResultSet>, ExecutionError> {
        let stmt = match parse_statement(sql) {
            Ok(Statement::Select(stmt)) => stmt,
            Ok(_) => return Ok(Vec::new()),
            Err(err) if self.options.leniency.is_strict() => return Err(err.into()),
            Err(err) => {
                debug!(error = %err, query = %sql.trim(), "query ignored");
                return Ok(Vec::new());
            }
        };

        let plan = Planner::new(self.options.leniency).plan(&stmt)?;
        let evaluator = QueryEvaluator::new(&self.store, &self.catalog, self.options.match_scope);
        Ok(vec![evaluator.evaluate(&plan)?])
    }

    pub fn table_names(&self) -> Vec<String> {
        self.store.table_names()
    }

    /// Drops every table.
    pub fn reset(&mut self) {
        debug!(tables = self.store.len(), "session reset");
        self.store.clear();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(tables = self.store.len(), "session closed");
    }
}

/// Splits a script on `;`. Comment lines (`--`) are stripped and fragments
/// with nothing left are discarded.
pub fn split_script(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(|fragment| {
            fragment
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|fragment| !fragment.is_empty())
        .collect()
}
