use std::time::Instant;

use time::Duration;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::repositories::submissions::Verdict;
use crate::services::events::ProgressEvent;
use crate::services::judge;
use crate::services::sandbox::Executor;

/// Claims one pending submission and judges it end to end. Returns
/// `Ok(true)` when a submission was processed, `Ok(false)` when the
/// queue was empty.
pub(crate) async fn claim_and_judge(
    state: &AppState,
    executor: &dyn Executor,
) -> anyhow::Result<bool> {
    let Some(submission) =
        repositories::submissions::claim_next_pending(state.db(), primitive_now_utc()).await?
    else {
        return Ok(false);
    };

    let started = Instant::now();
    tracing::info!(submission_id = %submission.id, "judging submission");

    let cases = repositories::problems::list_cases(state.db(), &submission.problem_id).await?;

    let verdict = if cases.is_empty() {
        // The API rejects caseless problems at submit time; this covers
        // cases deleted while the submission sat in the queue.
        Verdict {
            status: SubmissionStatus::RuntimeError,
            detail: Some("problem has no test cases".to_string()),
            cases_passed: 0,
        }
    } else {
        let outcome = judge::judge(executor, &submission.submitted_code, &cases).await?;
        Verdict {
            status: outcome.status,
            detail: outcome.detail,
            cases_passed: outcome.cases_passed,
        }
    };

    let status = verdict.status;
    let finalized =
        repositories::submissions::finalize(state.db(), &submission.id, verdict, primitive_now_utc())
            .await?;

    if !finalized {
        tracing::warn!(submission_id = %submission.id, "submission already finalized elsewhere");
        return Ok(true);
    }

    metrics::counter!("submissions_judged_total", "status" => status_label(status)).increment(1);
    metrics::histogram!("submission_judge_seconds").record(started.elapsed().as_secs_f64());
    tracing::info!(
        submission_id = %submission.id,
        status = status_label(status),
        "submission judged"
    );

    state.events().emit(ProgressEvent::SubmissionJudged {
        submission_id: submission.id,
        student_id: submission.student_id,
        problem_id: submission.problem_id,
        status,
    });

    Ok(true)
}

/// Returns claims older than the configured threshold to the queue.
pub(crate) async fn requeue_stale(state: &AppState) -> anyhow::Result<()> {
    let threshold = state.settings().judge().stale_claim_seconds;
    let cutoff = primitive_now_utc() - Duration::seconds(threshold as i64);

    let requeued = repositories::submissions::requeue_stale_claims(state.db(), cutoff).await?;
    if requeued > 0 {
        tracing::warn!(requeued, "returned stale submission claims to the queue");
        metrics::counter!("submissions_requeued_total").increment(requeued);
    }

    Ok(())
}

fn status_label(status: SubmissionStatus) -> &'static str {
    match status {
        SubmissionStatus::Pending => "pending",
        SubmissionStatus::Correct => "correct",
        SubmissionStatus::Wrong => "wrong",
        SubmissionStatus::RuntimeError => "runtime_error",
        SubmissionStatus::Timeout => "timeout",
    }
}
