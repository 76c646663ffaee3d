use serde::{Deserialize, Serialize};

use crate::storage::table::Value;

/// Percentage at or above which partial credit is awarded.
pub const PARTIAL_CREDIT_THRESHOLD: u32 = 70;

/// Percentage lost per row of difference when row counts disagree.
const ROW_PENALTY: u32 = 20;

/// How query output is compared with the expected rows.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ComparePolicy {
    /// Order-sensitive equality, all-or-nothing.
    #[default]
    Exact,
    /// Cell-wise partial credit.
    Fuzzy,
}

/// Outcome of a fuzzy comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyScore {
    pub percentage: u32,
    pub matching_cells: usize,
    pub total_cells: usize,
    pub expected_rows: usize,
    pub actual_rows: usize,
}

impl FuzzyScore {
    pub fn row_count_mismatch(&self) -> bool {
        self.expected_rows != self.actual_rows
    }
}

pub fn exact_match(expected: &[Vec<Value>], actual: &[Vec<Value>]) -> bool {
    expected == actual
}

pub fn fuzzy_score(expected: &[Vec<Value>], actual: &[Vec<Value>]) -> FuzzyScore {
    let mut score = FuzzyScore {
        percentage: 0,
        matching_cells: 0,
        total_cells: 0,
        expected_rows: expected.len(),
        actual_rows: actual.len(),
    };

    if score.row_count_mismatch() {
        let diff = expected.len().abs_diff(actual.len());
        let penalty = u32::try_from(diff)
            .unwrap_or(u32::MAX)
            .saturating_mul(ROW_PENALTY);
        score.percentage = 100u32.saturating_sub(penalty);
        return score;
    }

    for expected_row in expected {
        score.total_cells += expected_row.len();

        let key = match expected_row.first() {
            Some(value) => value.normalized(),
            None => continue,
        };
        let paired = actual
            .iter()
            .find(|row| row.first().is_some_and(|v| v.normalized() == key));

        if let Some(actual_row) = paired {
            score.matching_cells += expected_row
                .iter()
                .enumerate()
                .filter(|(i, cell)| {
                    actual_row
                        .get(*i)
                        .is_some_and(|other| other.normalized() == cell.normalized())
                })
                .count();
        }
    }

    score.percentage = cell_percentage(score.matching_cells, score.total_cells);
    score
}

fn cell_percentage(matching: usize, total: usize) -> u32 {
    if total == 0 || matching == total {
        return 100;
    }
    let pct = (100.0 * matching as f64 / total as f64).round() as u32;
    // Rounding must not turn a partial match into full credit.
    pct.min(99)
}

/// Points earned for a percentage, bounded by `[0, points]`.
pub fn award(points: u32, percentage: u32) -> u32 {
    match percentage {
        p if p >= 100 => points,
        p if p >= PARTIAL_CREDIT_THRESHOLD => {
            let earned = (points as f64 * p as f64 / 100.0).round() as u32;
            earned.min(points)
        }
        _ => 0,
    }
}
