pub(crate) mod achievements;
pub(crate) mod events;
pub(crate) mod gamification;
pub(crate) mod judge;
pub(crate) mod points;
pub(crate) mod sandbox;
