use sqlx::PgPool;

use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::services::achievements;
use crate::services::events::{EventStream, ProgressEvent};
use crate::services::points;

/// Consumes progress events and applies their gamification side effects:
/// points for first-time milestones, then a badge re-evaluation. Runs
/// until the bus closes. Every effect is best-effort; a failure is
/// logged and the loop moves on to the next event.
pub(crate) async fn run_listener(pool: PgPool, mut stream: EventStream) {
    tracing::info!("gamification listener started");

    while let Some(event) = stream.next().await {
        handle_event(&pool, event).await;
    }

    tracing::info!("gamification listener stopped");
}

async fn handle_event(pool: &PgPool, event: ProgressEvent) {
    match event {
        ProgressEvent::SubmissionJudged { submission_id, student_id, problem_id, status } => {
            if status != SubmissionStatus::Correct {
                return;
            }
            on_correct_submission(pool, &submission_id, &student_id, &problem_id).await;
        }
        ProgressEvent::LessonCompleted { student_id, points, .. } => {
            points::award_points(pool, &student_id, i64::from(points)).await;
            evaluate_badges(pool, &student_id).await;
        }
        ProgressEvent::QuizCompleted { student_id, score, .. } => {
            // A first quiz result worth zero still counts toward the
            // tests badge counter, it just awards no points.
            points::award_points(pool, &student_id, (score / 10.0) as i64).await;
            evaluate_badges(pool, &student_id).await;
        }
    }
}

/// First correct solve of a problem awards its points; repeat solves do
/// not. The check excludes the submission that triggered the event, so
/// the triggering solve itself never suppresses the award.
async fn on_correct_submission(
    pool: &PgPool,
    submission_id: &str,
    student_id: &str,
    problem_id: &str,
) {
    let solved_before = match repositories::submissions::has_earlier_correct(
        pool,
        student_id,
        problem_id,
        submission_id,
    )
    .await
    {
        Ok(solved) => solved,
        Err(err) => {
            tracing::error!(error = %err, submission_id, "first-solve check failed");
            return;
        }
    };

    if !solved_before {
        let points = match repositories::problems::find_by_id(pool, problem_id).await {
            Ok(Some(problem)) => i64::from(problem.points),
            Ok(None) => {
                tracing::warn!(problem_id, "problem vanished before award");
                return;
            }
            Err(err) => {
                tracing::error!(error = %err, problem_id, "problem lookup failed");
                return;
            }
        };

        points::award_points(pool, student_id, points).await;
    }

    evaluate_badges(pool, student_id).await;
}

async fn evaluate_badges(pool: &PgPool, student_id: &str) {
    if let Err(err) = achievements::evaluate_and_grant(pool, student_id).await {
        tracing::error!(error = %err, student_id, "badge evaluation failed");
    }
}
