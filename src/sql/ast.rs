use crate::storage::table::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        name: String,
    },
    DropTable {
        name: String,
        if_exists: bool,
    },
    Delete {
        table: String,
    },
    Insert {
        table: String,
        rows: Vec<Vec<Literal>>,
    },
    Select(SelectStatement),
}

/// A VALUES entry as written. Coercion to a stored `Value` happens at
/// insertion time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Quoted(String),
    Integer(i64),
    Float(f64),
    /// An unquoted word such as `NULL` or `abc`.
    Bare(String),
}

impl Literal {
    pub fn into_value(self) -> Value {
        match self {
            Literal::Quoted(s) => Value::String(s),
            Literal::Integer(i) => Value::Integer(i),
            Literal::Float(f) => Value::Float(f),
            Literal::Bare(word) => match word.parse::<i64>() {
                Ok(i) => Value::Integer(i),
                Err(_) => match word.parse::<f64>() {
                    Ok(f) if f.is_finite() => Value::Float(f),
                    _ => Value::String(word),
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub columns: Vec<SelectColumn>,
    pub from: Option<String>,
    pub where_clause: Option<Predicate>,
    pub group_by: Option<ColumnRef>,
    /// Clauses after the last recognized one, e.g. `ORDER BY id LIMIT 5`.
    pub trailing: Option<String>,
}

impl SelectStatement {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            from: None,
            where_clause: None,
            group_by: None,
            trailing: None,
        }
    }

    pub fn has_count(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c, SelectColumn::CountAll))
    }

    /// Source text that evaluation does not apply: unrecognized select
    /// items followed by any trailing clauses.
    pub fn ignored_clauses(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                SelectColumn::Expression(text) => Some(text.as_str()),
                _ => None,
            })
            .chain(self.trailing.as_deref())
    }
}

impl Default for SelectStatement {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumn {
    AllColumns,
    CountAll,
    Column(ColumnRef),
    /// Any other item, kept verbatim.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn with_table(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

/// The single WHERE condition. Anything outside the four recognized shapes is
/// kept verbatim as `Unsupported` so the planner can decide how to treat it.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Like { column: ColumnRef, pattern: String },
    StringEq { column: ColumnRef, value: String },
    NumberEq { column: ColumnRef, value: f64 },
    GreaterThan { column: ColumnRef, threshold: f64 },
    Unsupported(String),
}

impl Predicate {
    pub fn column(&self) -> Option<&ColumnRef> {
        match self {
            Predicate::Like { column, .. }
            | Predicate::StringEq { column, .. }
            | Predicate::NumberEq { column, .. }
            | Predicate::GreaterThan { column, .. } => Some(column),
            Predicate::Unsupported(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_coercion() {
        assert_eq!(Literal::Quoted("42".into()).into_value(), Value::from("42"));
        assert_eq!(Literal::Integer(7).into_value(), Value::Integer(7));
        assert_eq!(Literal::Bare("abc".into()).into_value(), Value::from("abc"));
        assert_eq!(Literal::Bare("NULL".into()).into_value(), Value::from("NULL"));
    }

    #[test]
    fn test_ignored_clauses() {
        let stmt = SelectStatement {
            columns: vec![
                SelectColumn::CountAll,
                SelectColumn::Expression("UPPER(name)".into()),
            ],
            trailing: Some("LIMIT 1".into()),
            ..SelectStatement::new()
        };
        let ignored: Vec<&str> = stmt.ignored_clauses().collect();
        assert_eq!(ignored, vec!["UPPER(name)", "LIMIT 1"]);
        assert!(SelectStatement::new().ignored_clauses().next().is_none());
    }
}
