use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Badge;
use crate::db::types::BadgeCategory;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BadgeCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) icon: String,
    pub(crate) category: BadgeCategory,
    #[validate(range(min = 1, message = "threshold must be positive"))]
    pub(crate) threshold: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct BadgeResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) icon: String,
    pub(crate) category: BadgeCategory,
    pub(crate) threshold: i32,
    pub(crate) created_at: String,
    pub(crate) is_earned: bool,
}

impl BadgeResponse {
    pub(crate) fn from_db(badge: Badge, is_earned: bool) -> Self {
        Self {
            id: badge.id,
            title: badge.title,
            description: badge.description,
            icon: badge.icon,
            category: badge.category,
            threshold: badge.threshold,
            created_at: format_primitive(badge.created_at),
            is_earned,
        }
    }
}
