pub mod cli;
pub mod config;
pub mod grading;
pub mod session;
pub mod sql;
pub mod storage;

pub use config::{ConfigError, GraderConfig};
pub use grading::{ComparePolicy, GradeError, Harness, Problem, Report, TestResult, VisualSchema};
pub use session::{split_script, Session};
pub use sql::{EngineOptions, ExecutionError, Leniency, MatchScope};
pub use storage::{Catalog, ResultSet, Value};
