use crate::db::models::TestCase;
use crate::db::types::SubmissionStatus;
use crate::services::sandbox::{ExecutionStatus, Executor};

/// Verdict for one submission, derived from its runs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JudgeOutcome {
    pub(crate) status: SubmissionStatus,
    pub(crate) detail: Option<String>,
    pub(crate) cases_passed: i32,
}

/// Runs the code against the cases in order, stopping at the first
/// failure. Output comparison trims leading and trailing whitespace on
/// both sides; interior whitespace is significant.
///
/// Verdict policy: every case passed is `Correct`. On the first failing
/// case, an execution failure decides the verdict (`Timeout` stays
/// distinct from `RuntimeError`); a clean run with wrong output is
/// `Wrong`.
pub(crate) async fn judge(
    executor: &dyn Executor,
    code: &str,
    cases: &[TestCase],
) -> anyhow::Result<JudgeOutcome> {
    let mut cases_passed = 0i32;

    for (index, case) in cases.iter().enumerate() {
        let run = executor.execute(code, &case.input_data).await?;

        match run.status {
            ExecutionStatus::Success => {}
            ExecutionStatus::Timeout => {
                let detail = run.message.unwrap_or_else(|| "execution timed out".to_string());
                return Ok(JudgeOutcome {
                    status: SubmissionStatus::Timeout,
                    detail: Some(format!("case {}: {detail}", index + 1)),
                    cases_passed,
                });
            }
            ExecutionStatus::SyntaxError | ExecutionStatus::RuntimeError => {
                let detail = run.message.unwrap_or_else(|| "execution failed".to_string());
                return Ok(JudgeOutcome {
                    status: SubmissionStatus::RuntimeError,
                    detail: Some(format!("case {}: {detail}", index + 1)),
                    cases_passed,
                });
            }
        }

        if run.stdout.trim() != case.expected_output.trim() {
            return Ok(JudgeOutcome {
                status: SubmissionStatus::Wrong,
                detail: Some(format!("wrong answer on case {}", index + 1)),
                cases_passed,
            });
        }

        cases_passed += 1;
    }

    Ok(JudgeOutcome { status: SubmissionStatus::Correct, detail: None, cases_passed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{case, failing_executor, script_executor, timeout_executor};

    #[tokio::test]
    async fn all_cases_passing_is_correct() {
        let executor = script_executor(vec!["3", "7"]);
        let cases = vec![case("1 2", "3"), case("3 4", "7")];

        let outcome = judge(&executor, "code", &cases).await.expect("judge");

        assert_eq!(outcome.status, SubmissionStatus::Correct);
        assert_eq!(outcome.cases_passed, 2);
        assert_eq!(outcome.detail, None);
    }

    #[tokio::test]
    async fn comparison_trims_outer_whitespace_only() {
        let executor = script_executor(vec!["  3\n", "a  b"]);
        let cases = vec![case("", "3"), case("", "a b")];

        let outcome = judge(&executor, "code", &cases).await.expect("judge");

        // First case passes after trimming; second fails because the
        // interior double space differs.
        assert_eq!(outcome.status, SubmissionStatus::Wrong);
        assert_eq!(outcome.cases_passed, 1);
        assert_eq!(outcome.detail.as_deref(), Some("wrong answer on case 2"));
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let executor = script_executor(vec!["1", "wrong", "3"]);
        let cases = vec![case("", "1"), case("", "2"), case("", "3")];

        let outcome = judge(&executor, "code", &cases).await.expect("judge");

        assert_eq!(outcome.status, SubmissionStatus::Wrong);
        assert_eq!(outcome.cases_passed, 1);
        assert_eq!(executor.calls(), 2);
    }

    #[tokio::test]
    async fn execution_failure_beats_wrong_output() {
        let executor = failing_executor("ZeroDivisionError: division by zero");
        let cases = vec![case("", "1")];

        let outcome = judge(&executor, "code", &cases).await.expect("judge");

        assert_eq!(outcome.status, SubmissionStatus::RuntimeError);
        assert_eq!(
            outcome.detail.as_deref(),
            Some("case 1: ZeroDivisionError: division by zero")
        );
    }

    #[tokio::test]
    async fn timeout_keeps_its_own_status() {
        let executor = timeout_executor();
        let cases = vec![case("", "1")];

        let outcome = judge(&executor, "code", &cases).await.expect("judge");

        assert_eq!(outcome.status, SubmissionStatus::Timeout);
        assert_eq!(outcome.cases_passed, 0);
    }

    #[tokio::test]
    async fn empty_case_list_is_vacuously_correct() {
        let executor = script_executor(vec![]);

        let outcome = judge(&executor, "code", &[]).await.expect("judge");

        assert_eq!(outcome.status, SubmissionStatus::Correct);
        assert_eq!(outcome.cases_passed, 0);
        assert_eq!(executor.calls(), 0);
    }
}
