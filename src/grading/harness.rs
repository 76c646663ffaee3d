use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use super::problem::{Problem, QueryTest, SchemaTest, TestCase};
use super::schema::VisualSchema;
use super::scoring::{award, exact_match, fuzzy_score, ComparePolicy, PARTIAL_CREDIT_THRESHOLD};
use super::GradeError;
use crate::config::GraderConfig;
use crate::session::Session;
use crate::storage::table::Value;

/// Table that receives flat seed data when the schema has no tables.
pub const DEFAULT_SEED_TABLE: &str = "users";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub points: u32,
    pub max_points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
}

impl TestResult {
    fn failed(name: &str, max_points: u32, message: String, query: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message,
            points: 0,
            max_points,
            query: query.map(str::to_string),
            percentage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Perfect,
    Good,
    Retry,
}

impl Feedback {
    pub fn for_percentage(percentage: u32) -> Self {
        match percentage {
            p if p >= 100 => Feedback::Perfect,
            p if p >= PARTIAL_CREDIT_THRESHOLD => Feedback::Good,
            _ => Feedback::Retry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub results: Vec<TestResult>,
    pub score: u32,
    pub max_score: u32,
}

impl Report {
    pub fn new(results: Vec<TestResult>) -> Self {
        let score = results.iter().map(|r| r.points).sum();
        let max_score = results.iter().map(|r| r.max_points).sum();
        Self {
            results,
            score,
            max_score,
        }
    }

    /// `round(100 * score / max_score)`; zero when nothing is at stake.
    pub fn percentage(&self) -> u32 {
        if self.max_score == 0 {
            return 0;
        }
        (100.0 * self.score as f64 / self.max_score as f64).round() as u32
    }

    pub fn feedback(&self) -> Feedback {
        Feedback::for_percentage(self.percentage())
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (s, m, p) = (self.score, self.max_score, self.percentage());
        match self.feedback() {
            Feedback::Perfect => write!(f, "🎉 Perfect! All tests passed! Score: {}/{} ({}%)", s, m, p),
            Feedback::Good => write!(
                f,
                "✅ Good job! Score: {}/{} ({}%). Check failed tests below.",
                s, m, p
            ),
            Feedback::Retry => write!(
                f,
                "❌ Some tests failed. Score: {}/{} ({}%). Review feedback and try again.",
                s, m, p
            ),
        }
    }
}

/// Grades problems against one private session.
#[derive(Debug, Default)]
pub struct Harness {
    session: Session,
    policy: ComparePolicy,
}

impl Harness {
    pub fn new(session: Session, policy: ComparePolicy) -> Self {
        Self { session, policy }
    }

    pub fn from_config(config: &GraderConfig) -> Self {
        let session = Session::new(config.catalog(), config.engine_options());
        Self::new(session, config.policy)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Drops every table in the session.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Runs the schema's generated DDL and returns the number of statements.
    pub fn load_schema(&mut self, schema: &VisualSchema) -> Result<usize, GradeError> {
        self.session
            .run_script(&schema.to_ddl())
            .map_err(GradeError::Schema)
    }

    /// Runs every test case of `problem` in order against a freshly built
    /// schema. `submitted` replaces the query of the n-th query test; tests
    /// past its end use their own query.
    pub fn run_all(
        &mut self,
        problem: &Problem,
        schema: &VisualSchema,
        submitted: &[String],
    ) -> Result<Report, GradeError> {
        if schema.is_empty() {
            return Err(GradeError::EmptySchema);
        }

        self.reset();
        self.load_schema(schema)?;

        let default_table = schema.first_table().unwrap_or(DEFAULT_SEED_TABLE);
        let mut submissions = submitted.iter();
        let results = problem
            .test_cases
            .iter()
            .map(|tc| match tc {
                TestCase::Schema(test) => self.grade_schema(test, schema),
                TestCase::Query(test) => {
                    let query = submissions.next().map(String::as_str);
                    self.grade_query(test, default_table, query)
                }
            })
            .collect();

        let report = Report::new(results);
        info!(
            problem = problem.id,
            score = report.score,
            max_score = report.max_score,
            percentage = report.percentage(),
            "grading run complete"
        );
        Ok(report)
    }

    /// All-or-nothing name comparison of the schema with the expected tables.
    pub fn grade_schema(&self, test: &SchemaTest, schema: &VisualSchema) -> TestResult {
        let actual = schema.normalized_tables();
        let mut missing_tables = Vec::new();
        let mut missing_columns = Vec::new();

        for expected in &test.expected_tables {
            let name = expected.name.to_lowercase();
            match actual.iter().find(|(t, _)| *t == name) {
                None => missing_tables.push(name),
                Some((_, columns)) => {
                    for col in &expected.columns {
                        let col = col.to_lowercase();
                        if !columns.contains(&col) {
                            missing_columns.push(format!("{}.{}", name, col));
                        }
                    }
                }
            }
        }

        let passed = missing_tables.is_empty() && missing_columns.is_empty();
        let message = if passed {
            "✅ Schema structure is correct!".to_string()
        } else {
            let mut parts = Vec::new();
            if !missing_tables.is_empty() {
                parts.push(format!("Missing tables: {}.", missing_tables.join(", ")));
            }
            if !missing_columns.is_empty() {
                parts.push(format!("Missing columns: {}", missing_columns.join(", ")));
            }
            parts.join(" ")
        };

        TestResult {
            name: test.name.clone(),
            passed,
            message,
            points: if passed { test.points } else { 0 },
            max_points: test.points,
            query: None,
            percentage: None,
        }
    }

    /// Seeds, executes and scores one query test. `submitted` replaces the
    /// test's own query when present.
    pub fn grade_query(
        &mut self,
        test: &QueryTest,
        default_table: &str,
        submitted: Option<&str>,
    ) -> TestResult {
        let query = submitted.unwrap_or(&test.query);

        if let Err(err) = self.seed(test, default_table) {
            warn!(test = %test.name, error = %err, "seeding failed");
            return TestResult::failed(&test.name, test.points, format!("❌ {}", err), Some(query));
        }

        let actual = match self.execute(query) {
            Ok(rows) => rows,
            Err(err) => {
                return TestResult::failed(&test.name, test.points, format!("❌ {}", err), Some(query))
            }
        };

        match self.policy {
            ComparePolicy::Exact => self.score_exact(test, query, &actual),
            ComparePolicy::Fuzzy => self.score_fuzzy(test, query, &actual),
        }
    }

    /// Replaces the contents of every table named by the test's seed data.
    pub fn seed(&mut self, test: &QueryTest, default_table: &str) -> Result<(), GradeError> {
        let seed = match &test.seed_data {
            Some(seed) => seed,
            None => return Ok(()),
        };

        for (table, rows) in seed.targets(default_table) {
            if !self.session.store().contains(table) {
                warn!(table = %table, "seeding a table the schema does not define");
            }
            let failure = |source| GradeError::SeedFailure {
                table: table.to_string(),
                source,
            };

            self.session
                .run(&format!("DELETE FROM {}", table))
                .map_err(failure)?;
            for row in rows {
                self.session
                    .run(&insert_statement(table, row))
                    .map_err(failure)?;
            }
        }
        Ok(())
    }

    fn execute(&self, query: &str) -> Result<Vec<Vec<Value>>, GradeError> {
        let mut results = self.session.exec(query)?;
        Ok(if results.is_empty() {
            Vec::new()
        } else {
            results.swap_remove(0).values
        })
    }

    fn score_exact(&self, test: &QueryTest, query: &str, actual: &[Vec<Value>]) -> TestResult {
        let passed = exact_match(&test.expected_output, actual);
        let message = if passed {
            "✅ Query executed correctly!".to_string()
        } else {
            format!(
                "❌ Expected {} rows but got {}",
                test.expected_output.len(),
                actual.len()
            )
        };

        TestResult {
            name: test.name.clone(),
            passed,
            message,
            points: if passed { test.points } else { 0 },
            max_points: test.points,
            query: Some(query.to_string()),
            percentage: None,
        }
    }

    fn score_fuzzy(&self, test: &QueryTest, query: &str, actual: &[Vec<Value>]) -> TestResult {
        let score = fuzzy_score(&test.expected_output, actual);
        let pct = score.percentage;

        let message = if score.row_count_mismatch() {
            format!(
                "❌ Expected {} rows but got {} ({}%)",
                score.expected_rows, score.actual_rows, pct
            )
        } else if pct == 100 {
            "✅ Query executed correctly! (100%)".to_string()
        } else if pct >= PARTIAL_CREDIT_THRESHOLD {
            format!(
                "⚠️ Partially correct: {}/{} cells match ({}%)",
                score.matching_cells, score.total_cells, pct
            )
        } else {
            format!(
                "❌ Only {}/{} cells match ({}%)",
                score.matching_cells, score.total_cells, pct
            )
        };

        TestResult {
            name: test.name.clone(),
            passed: pct == 100,
            message,
            points: award(test.points, pct),
            max_points: test.points,
            query: Some(query.to_string()),
            percentage: Some(pct),
        }
    }
}

/// Builds an INSERT for one seed row. Strings are quoted with `'` doubled.
pub fn insert_statement(table: &str, row: &[Value]) -> String {
    let values: Vec<String> = row
        .iter()
        .map(|v| match v {
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Null => "NULL".to_string(),
            other => other.to_string(),
        })
        .collect();
    format!("INSERT INTO {} VALUES ({})", table, values.join(", "))
}
