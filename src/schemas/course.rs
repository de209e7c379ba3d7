use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::{Course, Lesson, Quiz};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: i32,
    #[serde(default = "default_lesson_points")]
    #[validate(range(min = 0, message = "points must be non-negative"))]
    pub(crate) points: i32,
}

const fn default_lesson_points() -> i32 {
    10
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizResultCreate {
    #[validate(range(min = 0.0, max = 100.0, message = "score must be between 0 and 100"))]
    pub(crate) score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) position: i32,
    pub(crate) lessons: Vec<LessonResponse>,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course, lessons: Vec<LessonResponse>) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            position: course.position,
            lessons,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) position: i32,
    pub(crate) points: i32,
    pub(crate) is_completed: bool,
}

impl LessonResponse {
    pub(crate) fn from_db(lesson: Lesson, is_completed: bool) -> Self {
        Self {
            id: lesson.id,
            course_id: lesson.course_id,
            title: lesson.title,
            content: lesson.content,
            position: lesson.position,
            points: lesson.points,
            is_completed,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz) -> Self {
        Self { id: quiz.id, course_id: quiz.course_id, title: quiz.title }
    }
}
