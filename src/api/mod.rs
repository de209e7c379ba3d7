pub(crate) mod auth;
pub(crate) mod badges;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod leaderboard;
pub(crate) mod pagination;
pub(crate) mod problems;
pub(crate) mod quizzes;
pub(crate) mod router;
pub(crate) mod submissions;
pub(crate) mod validation;
