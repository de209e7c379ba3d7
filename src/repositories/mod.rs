pub(crate) mod badges;
pub(crate) mod courses;
pub(crate) mod problems;
pub(crate) mod quizzes;
pub(crate) mod scores;
pub(crate) mod submissions;
pub(crate) mod users;
