use std::collections::{BTreeMap, HashMap};

const FALLBACK_COLUMNS: [&str; 3] = ["col1", "col2", "col3"];

/// Display columns per table name. Used to label result sets and to find
/// column positions; never checked against the rows actually stored.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: HashMap<String, Vec<String>>,
    fallback: Vec<String>,
}

impl Catalog {
    /// An empty catalog where every table gets the generic fallback labels.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            fallback: FALLBACK_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The tables used by the built-in problems.
    pub fn classroom() -> Self {
        Self::new()
            .with_table("users", ["id", "name", "email", "password"])
            .with_table("customers", ["id", "name", "email"])
            .with_table("orders", ["id", "customer_id", "order_date", "total"])
            .with_table("posts", ["id", "author_id", "content", "created_at"])
            .with_table("likes", ["id", "user_id", "post_id"])
    }

    pub fn with_table<I, S>(mut self, name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, columns);
        self
    }

    pub fn insert<I, S>(&mut self, name: &str, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|c| c.into().to_lowercase())
            .collect();
        self.tables.insert(name.to_lowercase(), columns);
    }

    /// Merges `entries` over the current mapping.
    pub fn extend(&mut self, entries: &BTreeMap<String, Vec<String>>) {
        for (name, columns) in entries {
            self.insert(name, columns.iter().cloned());
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_lowercase())
    }

    pub fn columns(&self, table: &str) -> &[String] {
        self.tables
            .get(&table.to_lowercase())
            .map(|c| c.as_slice())
            .unwrap_or(&self.fallback)
    }

    pub fn column_index(&self, table: &str, column: &str) -> Option<usize> {
        let column = column.to_lowercase();
        self.columns(table).iter().position(|c| *c == column)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::classroom()
    }
}
