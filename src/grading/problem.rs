use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::SchemaError;
use crate::storage::table::Value;

#[derive(Error, Debug)]
pub enum ProblemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid problem definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(label)
    }
}

/// A gradable exercise: prose for the learner plus ordered test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: u32,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    pub test_cases: Vec<TestCase>,
}

impl Problem {
    pub fn from_json(json: &str) -> Result<Self, ProblemError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProblemError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn total_points(&self) -> u32 {
        self.test_cases.iter().map(TestCase::points).sum()
    }

    /// Query tests in declaration order.
    pub fn query_tests(&self) -> impl Iterator<Item = &QueryTest> {
        self.test_cases.iter().filter_map(|tc| match tc {
            TestCase::Query(q) => Some(q),
            TestCase::Schema(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestCase {
    Schema(SchemaTest),
    Query(QueryTest),
}

impl TestCase {
    pub fn name(&self) -> &str {
        match self {
            TestCase::Schema(t) => &t.name,
            TestCase::Query(t) => &t.name,
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            TestCase::Schema(t) => t.points,
            TestCase::Query(t) => t.points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub expected_tables: Vec<ExpectedTable>,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedTable {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_data: Option<Seed>,
    pub expected_output: Vec<Vec<Value>>,
    pub points: u32,
}

/// Fixture rows loaded before a query test runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    /// Rows for the default table.
    Rows(Vec<Vec<Value>>),
    /// Rows per named table.
    Tables(SeedTables),
}

/// Per-table seed rows in the order the fixture declares them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedTables(pub Vec<(String, Vec<Vec<Value>>)>);

impl Serialize for SeedTables {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (table, rows) in &self.0 {
            map.serialize_entry(table, rows)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeedTables {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeedTablesVisitor;

        impl<'de> Visitor<'de> for SeedTablesVisitor {
            type Value = SeedTables;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of table names to seed rows")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut tables = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((table, rows)) = access.next_entry::<String, Vec<Vec<Value>>>()? {
                    tables.push((table, rows));
                }
                Ok(SeedTables(tables))
            }
        }

        deserializer.deserialize_map(SeedTablesVisitor)
    }
}

impl Seed {
    /// Resolves the seed into `(table, rows)` pairs. A flat row list lands
    /// in `default_table`.
    pub fn targets<'a>(&'a self, default_table: &'a str) -> Vec<(&'a str, &'a [Vec<Value>])> {
        match self {
            Seed::Rows(rows) => vec![(default_table, rows.as_slice())],
            Seed::Tables(tables) => tables
                .0
                .iter()
                .map(|(name, rows)| (name.as_str(), rows.as_slice()))
                .collect(),
        }
    }
}
