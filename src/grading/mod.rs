pub mod builtin;
pub mod harness;
pub mod problem;
pub mod schema;
pub mod scoring;

use thiserror::Error;

use crate::sql::executor::ExecutionError;

pub use builtin::{builtin_problem, builtin_problems};
pub use harness::{Feedback, Harness, Report, TestResult};
pub use problem::{Difficulty, ExpectedTable, Problem, ProblemError, QueryTest, SchemaTest, Seed, SeedTables, TestCase};
pub use schema::{ColumnSpec, SchemaError, TableNode, VisualSchema};
pub use scoring::ComparePolicy;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradeError {
    #[error("Please design your database schema first by adding tables")]
    EmptySchema,
    #[error("Failed to create schema: {0}")]
    Schema(ExecutionError),
    #[error("Failed to seed data: {source}")]
    SeedFailure {
        table: String,
        source: ExecutionError,
    },
    #[error("Query error: {0}")]
    Execution(#[from] ExecutionError),
}
