use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::models::Badge;
use crate::db::types::BadgeCategory;
use crate::repositories;

/// A student's progress totals, one counter per badge category.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ProgressCounters {
    pub(crate) lessons_completed: i64,
    pub(crate) problems_solved: i64,
    pub(crate) quizzes_taken: i64,
}

impl ProgressCounters {
    fn counter_for(&self, category: BadgeCategory) -> i64 {
        match category {
            BadgeCategory::Lessons => self.lessons_completed,
            BadgeCategory::Problems => self.problems_solved,
            BadgeCategory::Tests => self.quizzes_taken,
        }
    }
}

/// Badges whose threshold the counters now meet and which the student
/// does not already hold. Pure selection; granting happens separately.
pub(crate) fn newly_earned<'a>(
    badges: &'a [Badge],
    held_ids: &[String],
    counters: ProgressCounters,
) -> Vec<&'a Badge> {
    badges
        .iter()
        .filter(|badge| !held_ids.iter().any(|held| held == &badge.id))
        .filter(|badge| counters.counter_for(badge.category) >= i64::from(badge.threshold))
        .collect()
}

pub(crate) async fn load_counters(
    pool: &PgPool,
    student_id: &str,
) -> Result<ProgressCounters, sqlx::Error> {
    Ok(ProgressCounters {
        lessons_completed: repositories::courses::count_completed_lessons(pool, student_id).await?,
        problems_solved: repositories::submissions::count_solved_problems(pool, student_id).await?,
        quizzes_taken: repositories::quizzes::count_results(pool, student_id).await?,
    })
}

/// Re-evaluates all badges for the student and grants the missing ones.
/// Safe to call repeatedly and from concurrent workers: the grant is
/// `ON CONFLICT DO NOTHING`, so a double evaluation yields one row.
pub(crate) async fn evaluate_and_grant(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Badge>, sqlx::Error> {
    let counters = load_counters(pool, student_id).await?;
    let badges = repositories::badges::list_all(pool).await?;
    let held = repositories::badges::held_badge_ids(pool, student_id).await?;

    let mut granted = Vec::new();
    let now = primitive_now_utc();

    for badge in newly_earned(&badges, &held, counters) {
        if repositories::badges::grant(pool, student_id, &badge.id, now).await? {
            tracing::info!(student_id, badge = %badge.title, "badge awarded");
            metrics::counter!("badges_awarded_total").increment(1);
            granted.push(badge.clone());
        }
    }

    Ok(granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::badge;

    #[test]
    fn earns_badge_at_exact_threshold() {
        let badges = vec![badge("b1", BadgeCategory::Problems, 5)];
        let counters = ProgressCounters { problems_solved: 5, ..Default::default() };

        let earned = newly_earned(&badges, &[], counters);
        assert_eq!(earned.len(), 1);
    }

    #[test]
    fn below_threshold_earns_nothing() {
        let badges = vec![badge("b1", BadgeCategory::Problems, 5)];
        let counters = ProgressCounters { problems_solved: 4, ..Default::default() };

        assert!(newly_earned(&badges, &[], counters).is_empty());
    }

    #[test]
    fn held_badges_are_not_re_earned() {
        let badges = vec![badge("b1", BadgeCategory::Lessons, 1)];
        let counters = ProgressCounters { lessons_completed: 3, ..Default::default() };

        let earned = newly_earned(&badges, &["b1".to_string()], counters);
        assert!(earned.is_empty());
    }

    #[test]
    fn categories_use_their_own_counter() {
        let badges = vec![
            badge("lessons", BadgeCategory::Lessons, 2),
            badge("problems", BadgeCategory::Problems, 2),
            badge("tests", BadgeCategory::Tests, 2),
        ];
        let counters =
            ProgressCounters { lessons_completed: 2, problems_solved: 0, quizzes_taken: 10 };

        let earned = newly_earned(&badges, &[], counters);
        let ids: Vec<_> = earned.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["lessons", "tests"]);
    }

    #[test]
    fn several_thresholds_can_land_at_once() {
        let badges = vec![
            badge("p5", BadgeCategory::Problems, 5),
            badge("p10", BadgeCategory::Problems, 10),
            badge("p25", BadgeCategory::Problems, 25),
        ];
        let counters = ProgressCounters { problems_solved: 12, ..Default::default() };

        let earned = newly_earned(&badges, &[], counters);
        assert_eq!(earned.len(), 2);
    }
}
