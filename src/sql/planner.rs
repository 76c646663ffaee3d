use super::ast::*;
use super::executor::ExecutionError;
use super::Leniency;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    // Scan a table
    TableScan {
        table_name: String,
    },

    // Filter (WHERE)
    Filter {
        input: Box<LogicalPlan>,
        predicate: Predicate,
    },

    // COUNT(*) over the input
    Count {
        input: Box<LogicalPlan>,
    },

    // COUNT(*) per distinct value of one column
    GroupCount {
        input: Box<LogicalPlan>,
        column: ColumnRef,
    },

    // Empty (for SELECT without FROM)
    Empty,
}

impl LogicalPlan {
    /// The table at the bottom of the plan, if any.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            LogicalPlan::TableScan { table_name } => Some(table_name),
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Count { input }
            | LogicalPlan::GroupCount { input, .. } => input.table_name(),
            LogicalPlan::Empty => None,
        }
    }
}

pub struct Planner {
    leniency: Leniency,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(Leniency::default())
    }
}

impl Planner {
    pub fn new(leniency: Leniency) -> Self {
        Self { leniency }
    }

    pub fn plan(&self, stmt: &SelectStatement) -> Result<LogicalPlan, ExecutionError> {
        for clause in stmt.ignored_clauses() {
            if self.leniency.is_strict() {
                return Err(ExecutionError::UnsupportedClause(clause.to_string()));
            }
            warn!(clause = %clause, "unsupported clause ignored");
        }

        let table_name = match &stmt.from {
            Some(name) => name.to_lowercase(),
            None => return Ok(LogicalPlan::Empty),
        };

        let mut plan = LogicalPlan::TableScan { table_name };

        if let Some(predicate) = &stmt.where_clause {
            plan = self.plan_filter(plan, predicate)?;
        }

        plan = match (&stmt.group_by, stmt.has_count()) {
            (Some(column), true) => LogicalPlan::GroupCount {
                input: Box::new(plan),
                column: column.clone(),
            },
            (None, true) => LogicalPlan::Count {
                input: Box::new(plan),
            },
            // Any other projection reads as `*`.
            (_, false) => plan,
        };

        Ok(plan)
    }

    fn plan_filter(
        &self,
        input: LogicalPlan,
        predicate: &Predicate,
    ) -> Result<LogicalPlan, ExecutionError> {
        match predicate {
            Predicate::Unsupported(clause) if self.leniency.is_strict() => {
                Err(ExecutionError::UnsupportedPredicate(clause.clone()))
            }
            Predicate::Unsupported(clause) => {
                warn!(clause = %clause, "unsupported predicate ignored");
                Ok(input)
            }
            _ => Ok(LogicalPlan::Filter {
                input: Box::new(input),
                predicate: predicate.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse_statement;

    fn plan(sql: &str, leniency: Leniency) -> Result<LogicalPlan, ExecutionError> {
        match parse_statement(sql).unwrap() {
            Statement::Select(stmt) => Planner::new(leniency).plan(&stmt),
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_scan() {
        let plan = plan("SELECT * FROM Users", Leniency::Lenient).unwrap();
        assert_eq!(
            plan,
            LogicalPlan::TableScan {
                table_name: "users".into()
            }
        );
    }

    #[test]
    fn test_plan_without_from() {
        assert_eq!(plan("SELECT *", Leniency::Lenient).unwrap(), LogicalPlan::Empty);
    }

    #[test]
    fn test_plan_count_over_filter() {
        let plan = plan("SELECT COUNT(*) FROM orders WHERE total > 100", Leniency::Lenient).unwrap();
        match plan {
            LogicalPlan::Count { input } => {
                assert!(matches!(*input, LogicalPlan::Filter { .. }));
            }
            other => panic!("expected Count, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_group_count() {
        let plan = plan(
            "SELECT customer_id, COUNT(*) FROM orders GROUP BY customer_id",
            Leniency::Lenient,
        )
        .unwrap();
        assert!(matches!(plan, LogicalPlan::GroupCount { .. }));
        assert_eq!(plan.table_name(), Some("orders"));
    }

    #[test]
    fn test_group_by_without_count_is_a_scan() {
        let plan = plan("SELECT * FROM orders GROUP BY customer_id", Leniency::Lenient).unwrap();
        assert!(matches!(plan, LogicalPlan::TableScan { .. }));
    }

    #[test]
    fn test_unsupported_predicate_by_leniency() {
        let sql = "SELECT * FROM users WHERE id = 1 OR id = 2";
        assert!(matches!(
            plan(sql, Leniency::Lenient).unwrap(),
            LogicalPlan::TableScan { .. }
        ));
        assert_eq!(
            plan(sql, Leniency::Strict),
            Err(ExecutionError::UnsupportedPredicate("id = 1 OR id = 2".into()))
        );
    }

    #[test]
    fn test_ignored_clauses_by_leniency() {
        assert!(matches!(
            plan("SELECT * FROM users ORDER BY id", Leniency::Lenient).unwrap(),
            LogicalPlan::TableScan { .. }
        ));
        assert!(matches!(
            plan("SELECT COUNT(*) AS total FROM users LIMIT 1", Leniency::Lenient).unwrap(),
            LogicalPlan::Count { .. }
        ));
        assert!(matches!(
            plan("SELECT COUNT(id) FROM users", Leniency::Lenient).unwrap(),
            LogicalPlan::TableScan { .. }
        ));

        assert_eq!(
            plan("SELECT * FROM users ORDER BY id", Leniency::Strict),
            Err(ExecutionError::UnsupportedClause("ORDER BY id".into()))
        );
        assert_eq!(
            plan("SELECT COUNT(id) FROM users", Leniency::Strict),
            Err(ExecutionError::UnsupportedClause("COUNT(id)".into()))
        );
        assert!(plan("SELECT COUNT(*) AS total FROM users u", Leniency::Strict).is_ok());
    }
}
