use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionCreate {
    pub(crate) code: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) problem_id: String,
    pub(crate) student_id: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) verdict_detail: Option<String>,
    pub(crate) cases_passed: i32,
    pub(crate) submitted_at: String,
    pub(crate) judged_at: Option<String>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: Submission) -> Self {
        Self {
            id: submission.id,
            problem_id: submission.problem_id,
            student_id: submission.student_id,
            status: submission.status,
            verdict_detail: submission.verdict_detail,
            cases_passed: submission.cases_passed,
            submitted_at: format_primitive(submission.submitted_at),
            judged_at: submission.judged_at.map(format_primitive),
        }
    }
}
