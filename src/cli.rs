use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::GraderConfig;
use crate::grading::scoring::ComparePolicy;
use crate::sql::{Leniency, MatchScope};

#[derive(Parser, Debug)]
#[command(name = "schemajudge")]
#[command(author, version, about = "Grade database schemas and SQL queries against teaching problems")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Grader config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the built-in problems
    List,

    /// Print the DDL generated from a visual schema
    Ddl {
        /// Visual schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Run every test case of a problem against a schema
    Grade {
        /// Visual schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Built-in problem id or problem file
        #[arg(short, long, default_value = "1")]
        problem: String,

        /// Submitted query; repeat to replace successive query tests
        #[arg(short, long)]
        query: Vec<String>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Execute one query against a schema, optionally seeded from a test
    Query {
        /// Visual schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Built-in problem id or problem file to seed from
        #[arg(short, long)]
        problem: Option<String>,

        /// 1-based query test whose seed data is loaded
        #[arg(short, long, requires = "problem")]
        test: Option<usize>,

        /// The SQL to execute
        sql: String,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Overrides for the config file.
#[derive(Args, Debug, Default)]
pub struct EngineArgs {
    /// Report malformed input as errors instead of ignoring it
    #[arg(long)]
    pub strict: bool,

    /// Comparison policy for query output
    #[arg(long, value_enum)]
    pub policy: Option<ComparePolicy>,

    /// Which cells a WHERE predicate inspects
    #[arg(long, value_enum)]
    pub scope: Option<MatchScope>,
}

impl EngineArgs {
    pub fn apply(&self, config: &mut GraderConfig) {
        if self.strict {
            config.leniency = Leniency::Strict;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(scope) = self.scope {
            config.match_scope = scope;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
