use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Problem, TestCase};
use crate::db::types::DifficultyLevel;
use crate::repositories::problems::ProblemListRow;

// Serialize is needed by the length check on `ProblemCreate.cases`: the
// validator embeds the offending value in its error params.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct TestCaseCreate {
    #[serde(default)]
    #[serde(alias = "inputData")]
    pub(crate) input_data: String,
    #[serde(alias = "expectedOutput")]
    #[validate(length(min = 1, message = "expected_output must not be empty"))]
    pub(crate) expected_output: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProblemCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    pub(crate) description: String,
    #[serde(default = "default_difficulty")]
    pub(crate) difficulty: DifficultyLevel,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, message = "points must be positive"))]
    pub(crate) points: i32,
    #[validate(length(min = 1, message = "at least one test case is required"))]
    #[validate(nested)]
    pub(crate) cases: Vec<TestCaseCreate>,
}

fn default_difficulty() -> DifficultyLevel {
    DifficultyLevel::Easy
}

const fn default_points() -> i32 {
    10
}

#[derive(Debug, Serialize)]
pub(crate) struct ProblemSummary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) points: i32,
    pub(crate) is_solved: bool,
}

impl ProblemSummary {
    pub(crate) fn from_row(row: ProblemListRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            difficulty: row.difficulty,
            points: row.points,
            is_solved: row.is_solved,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProblemDetail {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) points: i32,
    pub(crate) sample_input: Option<String>,
    pub(crate) sample_output: Option<String>,
    pub(crate) created_at: String,
}

impl ProblemDetail {
    /// Only the first test case is shown to students, as the sample;
    /// the rest stay hidden to keep verdicts meaningful.
    pub(crate) fn from_db(problem: Problem, cases: &[TestCase]) -> Self {
        let sample = cases.first();
        Self {
            id: problem.id,
            title: problem.title,
            description: problem.description,
            difficulty: problem.difficulty,
            points: problem.points,
            sample_input: sample.map(|c| c.input_data.clone()),
            sample_output: sample.map(|c| c.expected_output.clone()),
            created_at: format_primitive(problem.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::{ProblemCreate, TestCaseCreate};
    use crate::db::types::DifficultyLevel;

    fn payload(cases: Vec<TestCaseCreate>) -> ProblemCreate {
        ProblemCreate {
            title: "Sum of two numbers".to_string(),
            description: "Read two integers and print their sum.".to_string(),
            difficulty: DifficultyLevel::Easy,
            points: 10,
            cases,
        }
    }

    #[test]
    fn rejects_empty_case_list() {
        let err = payload(Vec::new()).validate().expect_err("caseless must fail");
        assert!(err.to_string().contains("at least one test case"));
    }

    #[test]
    fn rejects_case_without_expected_output() {
        let cases = vec![TestCaseCreate {
            input_data: "1 2".to_string(),
            expected_output: String::new(),
        }];
        assert!(payload(cases).validate().is_err());
    }

    #[test]
    fn accepts_well_formed_problem() {
        let cases = vec![TestCaseCreate {
            input_data: "1 2".to_string(),
            expected_output: "3".to_string(),
        }];
        assert!(payload(cases).validate().is_ok());
    }
}
