use std::collections::HashMap;

use super::table::{Row, Table};

/// In-memory tables keyed by lower-cased name.
#[derive(Debug, Default)]
pub struct TableStore {
    tables: HashMap<String, Table>,
}

impl TableStore {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Registers an empty table, replacing any table of the same name.
    pub fn create_table(&mut self, name: &str) {
        let name = name.to_lowercase();
        self.tables.insert(name.clone(), Table::new(name));
    }

    pub fn drop_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(&name.to_lowercase())
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    /// Rows of `name` in insertion order; unknown tables read as empty.
    pub fn rows(&self, name: &str) -> &[Row] {
        self.get_table(name).map(|t| t.rows.as_slice()).unwrap_or(&[])
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::table::Value;

    #[test]
    fn test_case_insensitive_names() {
        let mut store = TableStore::new();
        store.create_table("Users");
        assert!(store.contains("USERS"));
        assert_eq!(store.table_names(), vec!["users".to_string()]);
    }

    #[test]
    fn test_create_replaces_existing() {
        let mut store = TableStore::new();
        store.create_table("users");
        store
            .get_table_mut("users")
            .unwrap()
            .add_row(Row::new(vec![Value::Integer(1)]));
        store.create_table("users");
        assert!(store.rows("users").is_empty());
    }

    #[test]
    fn test_unknown_table_reads_empty() {
        let store = TableStore::new();
        assert!(store.rows("missing").is_empty());
    }

    #[test]
    fn test_drop_and_clear() {
        let mut store = TableStore::new();
        store.create_table("a");
        store.create_table("b");
        assert!(store.drop_table("A").is_some());
        assert!(store.drop_table("a").is_none());
        store.clear();
        assert!(store.is_empty());
    }
}
