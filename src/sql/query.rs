use regex::{Regex, RegexBuilder};

use super::ast::{ColumnRef, Predicate};
use super::executor::ExecutionError;
use super::planner::LogicalPlan;
use super::MatchScope;
use crate::storage::catalog::Catalog;
use crate::storage::store::TableStore;
use crate::storage::table::{ResultSet, Row, Value};

pub const COUNT_LABEL: &str = "COUNT(*)";

/// Evaluates SELECT plans against a store. Read-only.
pub struct QueryEvaluator<'a> {
    store: &'a TableStore,
    catalog: &'a Catalog,
    scope: MatchScope,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(store: &'a TableStore, catalog: &'a Catalog, scope: MatchScope) -> Self {
        Self {
            store,
            catalog,
            scope,
        }
    }

    pub fn evaluate(&self, plan: &LogicalPlan) -> Result<ResultSet, ExecutionError> {
        match plan {
            LogicalPlan::Empty => Ok(ResultSet::empty()),
            LogicalPlan::Count { input } => {
                let rows = self.execute(input)?;
                Ok(ResultSet {
                    columns: vec![COUNT_LABEL.to_string()],
                    values: vec![vec![Value::Integer(rows.len() as i64)]],
                })
            }
            LogicalPlan::GroupCount { input, column } => {
                let rows = self.execute(input)?;
                let table = plan.table_name().unwrap_or_default();
                Ok(self.group_count(table, column, &rows))
            }
            LogicalPlan::TableScan { .. } | LogicalPlan::Filter { .. } => {
                let rows = self.execute(plan)?;
                let table = plan.table_name().unwrap_or_default();
                Ok(ResultSet::new(self.catalog.columns(table).to_vec(), rows))
            }
        }
    }

    fn execute(&self, plan: &LogicalPlan) -> Result<Vec<Row>, ExecutionError> {
        match plan {
            LogicalPlan::TableScan { table_name } => Ok(self.store.rows(table_name).to_vec()),
            LogicalPlan::Filter { input, predicate } => {
                let rows = self.execute(input)?;
                let table = input.table_name().unwrap_or_default();
                let filter = RowFilter::compile(predicate, table, self.catalog, self.scope)?;
                Ok(rows.into_iter().filter(|row| filter.matches(row)).collect())
            }
            LogicalPlan::Count { input } | LogicalPlan::GroupCount { input, .. } => {
                self.execute(input)
            }
            LogicalPlan::Empty => Ok(Vec::new()),
        }
    }

    /// One `[value, count]` row per distinct value, in first-seen order. A
    /// column the catalog does not know groups every row under `NULL`.
    fn group_count(&self, table: &str, column: &ColumnRef, rows: &[Row]) -> ResultSet {
        let index = self.catalog.column_index(table, &column.column);
        let mut groups: Vec<(Value, i64)> = Vec::new();

        for row in rows {
            let key = index
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or(Value::Null);

            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => groups.push((key, 1)),
            }
        }

        ResultSet {
            columns: vec![column.column.to_lowercase(), COUNT_LABEL.to_string()],
            values: groups
                .into_iter()
                .map(|(key, count)| vec![key, Value::Integer(count)])
                .collect(),
        }
    }
}

enum Test {
    Like(Regex),
    StringEq(String),
    NumberEq(f64),
    GreaterThan(f64),
}

/// A predicate bound to a table: LIKE patterns compiled, the target column
/// resolved when the scope asks for it.
struct RowFilter {
    test: Test,
    column: Option<usize>,
}

impl RowFilter {
    fn compile(
        predicate: &Predicate,
        table: &str,
        catalog: &Catalog,
        scope: MatchScope,
    ) -> Result<Self, ExecutionError> {
        let column = match (scope, predicate.column()) {
            (MatchScope::Column, Some(col)) => catalog.column_index(table, &col.column),
            _ => None,
        };
        // Anchored, standard LIKE only when a real column is being matched.
        let anchored = column.is_some();

        let test = match predicate {
            Predicate::Like { pattern, .. } => Test::Like(like_regex(pattern, anchored)?),
            Predicate::StringEq { value, .. } => Test::StringEq(value.clone()),
            Predicate::NumberEq { value, .. } => Test::NumberEq(*value),
            Predicate::GreaterThan { threshold, .. } => Test::GreaterThan(*threshold),
            Predicate::Unsupported(clause) => {
                return Err(ExecutionError::UnsupportedPredicate(clause.clone()))
            }
        };

        Ok(Self { test, column })
    }

    fn matches(&self, row: &Row) -> bool {
        match self.column {
            Some(index) => row.get(index).is_some_and(|cell| self.matches_cell(cell)),
            None => self.matches_row(row),
        }
    }

    fn matches_row(&self, row: &Row) -> bool {
        match &self.test {
            Test::Like(re) => row.values.iter().any(|cell| re.is_match(&cell.to_string())),
            Test::StringEq(value) => row.values.iter().any(|cell| cell.to_string() == *value),
            Test::NumberEq(value) => row
                .first()
                .is_some_and(|cell| cell.is_numeric() && cell.as_float() == Some(*value)),
            Test::GreaterThan(threshold) => row
                .last()
                .and_then(Value::to_number)
                .is_some_and(|n| n > *threshold),
        }
    }

    fn matches_cell(&self, cell: &Value) -> bool {
        match &self.test {
            Test::Like(re) => re.is_match(&cell.to_string()),
            Test::StringEq(value) => cell.to_string() == *value,
            Test::NumberEq(value) => cell.to_number() == Some(*value),
            Test::GreaterThan(threshold) => cell.to_number().is_some_and(|n| n > *threshold),
        }
    }
}

/// Translates a LIKE pattern into a case-insensitive regex. `%` matches any
/// run of characters. Unanchored patterns match anywhere in the text;
/// anchored ones must cover it and also treat `_` as a single character.
fn like_regex(pattern: &str, anchored: bool) -> Result<Regex, ExecutionError> {
    let mut source = String::new();
    if anchored {
        source.push('^');
    }

    let mut literal = String::new();
    for c in pattern.chars() {
        let wildcard = match c {
            '%' => Some(".*"),
            '_' if anchored => Some("."),
            _ => None,
        };
        match wildcard {
            Some(w) => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(w);
            }
            None => literal.push(c),
        }
    }
    source.push_str(&regex::escape(&literal));

    if anchored {
        source.push('$');
    }

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| ExecutionError::UnsupportedPredicate(format!("LIKE '{}': {}", pattern, e)))
}
