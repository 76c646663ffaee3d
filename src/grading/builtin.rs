//! Problems bundled with the binary.

use super::problem::{Problem, ProblemError};

const SOURCES: [&str; 2] = [
    include_str!("../../problems/user-auth.json"),
    include_str!("../../problems/ecommerce.json"),
];

pub fn builtin_problems() -> Result<Vec<Problem>, ProblemError> {
    SOURCES.iter().map(|json| Problem::from_json(json)).collect()
}

pub fn builtin_problem(id: u32) -> Result<Option<Problem>, ProblemError> {
    Ok(builtin_problems()?.into_iter().find(|p| p.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::problem::Difficulty;

    #[test]
    fn test_builtin_problems_parse() {
        let problems = builtin_problems().unwrap();
        assert_eq!(problems.len(), 2);

        assert_eq!(problems[0].title, "User Authentication System");
        assert_eq!(problems[0].difficulty, Difficulty::Easy);
        assert_eq!(problems[0].total_points(), 100);

        assert_eq!(problems[1].title, "E-Commerce Order System");
        assert_eq!(problems[1].difficulty, Difficulty::Medium);
        assert_eq!(problems[1].total_points(), 100);
    }

    #[test]
    fn test_builtin_problem_lookup() {
        assert_eq!(builtin_problem(2).unwrap().unwrap().test_cases.len(), 4);
        assert!(builtin_problem(42).unwrap().is_none());
    }
}
