pub mod lexer;
pub mod ast;
pub mod parser;
pub mod planner;
pub mod executor;
pub mod query;

use serde::{Deserialize, Serialize};

pub use lexer::{Lexer, Token, TokenKind};
pub use ast::*;
pub use parser::{parse_statement, ParseError, Parser};
pub use planner::{LogicalPlan, Planner};
pub use executor::{ExecutionError, Executor};
pub use query::QueryEvaluator;

/// How the engine treats input it cannot act on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Leniency {
    /// Unrecognized statements, unknown tables and unsupported predicates are
    /// ignored, so partial input never fails.
    #[default]
    Lenient,
    /// The same situations are reported as `ExecutionError`s.
    Strict,
}

impl Leniency {
    pub fn is_strict(self) -> bool {
        self == Leniency::Strict
    }
}

/// Which cells a WHERE predicate inspects.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchScope {
    /// Fixture-compatible rules: LIKE and string equality scan every cell,
    /// numeric equality checks the first cell, greater-than the last one.
    #[default]
    Row,
    /// The named column, resolved through the catalog. Falls back to the row
    /// rules when the column is not in the catalog.
    Column,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub leniency: Leniency,
    pub match_scope: MatchScope,
}

impl EngineOptions {
    pub fn strict() -> Self {
        Self {
            leniency: Leniency::Strict,
            ..Self::default()
        }
    }

    pub fn with_match_scope(mut self, match_scope: MatchScope) -> Self {
        self.match_scope = match_scope;
        self
    }
}
